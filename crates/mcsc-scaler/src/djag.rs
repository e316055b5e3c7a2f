//! DJAG pre-filter planning
//!
//! DJAG up-scales the scaler input ahead of the poly-phase stage when an
//! output asks for more pixels than the input has. Output crops are then
//! expressed in DJAG output coordinates.

use mcsc_core::config::ScalerConfig;
use mcsc_core::{EngineId, Rect};

use crate::ratio::{scaling_ratio, RATIO_ONE};

/// Upscale and size bounds of the pre-filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DjagLimits {
    /// Largest upscale per axis, in tenths
    pub max_ratio_x10: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl From<&ScalerConfig> for DjagLimits {
    fn from(cfg: &ScalerConfig) -> Self {
        Self {
            max_ratio_x10: cfg.djag_max_ratio_x10,
            max_width: cfg.max_input_width,
            max_height: cfg.max_input_height,
        }
    }
}

impl Default for DjagLimits {
    fn default() -> Self {
        Self::from(&ScalerConfig::default())
    }
}

/// Pre-filter settings for one shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DjagPlan {
    pub enabled: bool,
    pub input_width: u32,
    pub input_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub h_ratio: u32,
    pub v_ratio: u32,
    /// Tuning bucket by zoom ratio
    pub bucket: usize,
}

impl DjagPlan {
    /// Pass-through plan
    pub fn disabled(width: u32, height: u32) -> Self {
        Self {
            enabled: false,
            input_width: width,
            input_height: height,
            output_width: width,
            output_height: height,
            h_ratio: RATIO_ONE,
            v_ratio: RATIO_ONE,
            bucket: 0,
        }
    }

    /// Express `crop` in pre-filter output coordinates.
    ///
    /// Results that leave the output image fall back to the whole output.
    pub fn remap_crop(&self, crop: Rect) -> Rect {
        if !self.enabled {
            return crop;
        }

        let scale = |v: u32, out: u32, inp: u32| -> u32 {
            ((v as u64 * out as u64 / inp.max(1) as u64) as u32) & !1
        };
        let remapped = Rect::new(
            scale(crop.x, self.output_width, self.input_width),
            scale(crop.y, self.output_height, self.input_height),
            scale(crop.width, self.output_width, self.input_width),
            scale(crop.height, self.output_height, self.input_height),
        );

        if remapped.is_empty() || !remapped.fits_in(self.output_width, self.output_height) {
            tracing::warn!(
                "DJAG: crop {:?} outside {}x{}, using full image",
                remapped,
                self.output_width,
                self.output_height
            );
            return Rect::full(self.output_width, self.output_height);
        }
        remapped
    }
}

/// Tuning bucket for a zoom ratio in hundredths
pub fn tuning_bucket(zoom_x100: u32) -> usize {
    match zoom_x100 {
        0..=100 => 0,
        101..=140 => 1,
        141..=200 => 2,
        _ => 3,
    }
}

/// Plan the pre-filter for an `in_w`x`in_h` input whose largest requested
/// output is `req_w`x`req_h`
pub fn plan_djag(in_w: u32, in_h: u32, req_w: u32, req_h: u32, limits: &DjagLimits) -> DjagPlan {
    if in_w == 0 || in_h == 0 {
        return DjagPlan::disabled(in_w, in_h);
    }

    let axis = |inp: u32, req: u32, max: u32| -> u32 {
        let bound = (inp as u64 * limits.max_ratio_x10 as u64 / 10) as u32;
        req.min(bound).min(max) & !1
    };
    let out_w = axis(in_w, req_w, limits.max_width);
    let out_h = axis(in_h, req_h, limits.max_height);

    if out_w <= in_w && out_h <= in_h {
        return DjagPlan::disabled(in_w, in_h);
    }

    let out_w = out_w.max(in_w);
    let out_h = out_h.max(in_h);
    let zoom = (out_w as u64 * 100 / in_w as u64) as u32;

    DjagPlan {
        enabled: true,
        input_width: in_w,
        input_height: in_h,
        output_width: out_w,
        output_height: out_h,
        h_ratio: scaling_ratio(in_w, out_w).unwrap_or(RATIO_ONE),
        v_ratio: scaling_ratio(in_h, out_h).unwrap_or(RATIO_ONE),
        bucket: tuning_bucket(zoom),
    }
}

/// Engine whose input the pre-filter serves: the video path in video
/// mode, the reprocessing path otherwise
pub fn djag_input(video_mode: bool) -> EngineId {
    if video_mode {
        EngineId::Mcsc0
    } else {
        EngineId::Mcsc1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_upscale_disables() {
        let plan = plan_djag(4000, 3000, 1920, 1080, &DjagLimits::default());
        assert!(!plan.enabled);
        assert_eq!(plan.h_ratio, RATIO_ONE);
        assert_eq!(plan.remap_crop(Rect::new(10, 10, 100, 100)), Rect::new(10, 10, 100, 100));
    }

    #[test]
    fn test_upscale_capped() {
        let plan = plan_djag(1000, 750, 4000, 3000, &DjagLimits::default());
        assert!(plan.enabled);
        assert_eq!((plan.output_width, plan.output_height), (2500, 1874));
        assert_eq!(plan.bucket, 3);
    }

    #[test]
    fn test_upscale_to_request() {
        let plan = plan_djag(1920, 1080, 2304, 1296, &DjagLimits::default());
        assert!(plan.enabled);
        assert_eq!((plan.output_width, plan.output_height), (2304, 1296));
        assert_eq!(plan.bucket, 1);
        assert_eq!(plan.h_ratio, (1920u64 << 20) as u32 / 2304);
    }

    #[test]
    fn test_max_input_limit() {
        let limits = DjagLimits {
            max_width: 2000,
            ..Default::default()
        };
        let plan = plan_djag(1000, 1000, 4000, 1000, &limits);
        assert_eq!(plan.output_width, 2000);
        assert_eq!(plan.output_height, 1000);
        assert_eq!(plan.bucket, 2);
    }

    #[test]
    fn test_crop_remap() {
        let plan = plan_djag(1000, 1000, 2000, 2000, &DjagLimits::default());
        assert_eq!(plan.remap_crop(Rect::new(101, 50, 500, 333)), Rect::new(202, 100, 1000, 666));
    }

    #[test]
    fn test_crop_out_of_bounds_falls_back() {
        let plan = plan_djag(1000, 1000, 2000, 2000, &DjagLimits::default());
        assert_eq!(plan.remap_crop(Rect::new(800, 0, 500, 100)), Rect::full(2000, 2000));
    }

    #[test]
    fn test_buckets() {
        assert_eq!(tuning_bucket(100), 0);
        assert_eq!(tuning_bucket(140), 1);
        assert_eq!(tuning_bucket(200), 2);
        assert_eq!(tuning_bucket(201), 3);
    }

    #[test]
    fn test_input_selection() {
        assert_eq!(djag_input(true), EngineId::Mcsc0);
        assert_eq!(djag_input(false), EngineId::Mcsc1);
    }
}
