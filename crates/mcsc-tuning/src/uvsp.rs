//! UV suppression (UVSP) tuning and radial geometry

use serde::{Deserialize, Serialize};

use mcsc_core::{Rect, TaaGeometry};

use crate::interp::{resolve, Lerp, NiCache, NoiseFactors};

/// Lens-shading calibration consumed by the radial control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UvspCalibration {
    pub lsc_center_x: u32,
    pub lsc_center_y: u32,
    pub biquad_a: u32,
    pub biquad_b: u32,
}

/// Radial control registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadialCtrl {
    pub binning_x: u32,
    pub binning_y: u32,
    pub radial_center_x: u32,
    pub radial_center_y: u32,
    pub biquad_a: u32,
    pub biquad_b: u32,
}

impl RadialCtrl {
    /// Translate the lens-shading centre into scaler coordinates.
    ///
    /// The BDS ratio is the 3AA crop width over the BDS output width; a
    /// zero ratio counts as 1 on that axis.
    pub fn compute(cal: &UvspCalibration, taa: &TaaGeometry) -> Self {
        let bds_x = ratio_or_one(taa.crop.width, taa.bds_width);
        let bds_y = ratio_or_one(taa.crop.height, taa.bds_height);
        let binning_x = ratio_or_one(taa.binning_x, 1);
        let binning_y = ratio_or_one(taa.binning_y, 1);

        Self {
            binning_x: binning_x.saturating_mul(bds_x).saturating_mul(1024),
            binning_y: binning_y.saturating_mul(bds_y).saturating_mul(1024),
            radial_center_x: cal.lsc_center_x.saturating_sub(taa.crop.x) / bds_x,
            radial_center_y: cal.lsc_center_y.saturating_sub(taa.crop.y) / bds_y,
            biquad_a: cal.biquad_a,
            biquad_b: cal.biquad_b,
        }
    }
}

fn ratio_or_one(num: u32, den: u32) -> u32 {
    match num.checked_div(den) {
        Some(0) | None => 1,
        Some(r) => r,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadialCfg {
    pub biquad_shift: u32,
    pub random_en: bool,
    pub random_power: u32,
    pub refine_en: bool,
    pub refine_luma_min: u32,
    pub refine_denom: u32,
    pub alpha_gain_add_en: bool,
    pub alpha_green_en: bool,
    pub alpha_r: u32,
    pub alpha_g: u32,
    pub alpha_b: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesatCfg {
    pub ctrl_en: bool,
    pub ctrl_single_side: bool,
    pub ctrl_luma_offset: u32,
    pub ctrl_gain_offset: u32,
    pub y_shift: u32,
    pub y_luma_max: u32,
    pub u_low: i32,
    pub u_high: i32,
    pub v_low: i32,
    pub v_high: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct R2yCoefCfg {
    /// Row-major 3x3 matrix
    pub coef: [i32; 9],
    pub shift: u32,
}

/// One UVSP reference point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UvspFactors {
    pub noise_index: u32,
    pub radial: RadialCfg,
    pub pedestal: Rgb,
    pub offset: Rgb,
    pub desat: DesatCfg,
    pub r2y: R2yCoefCfg,
}

/// Register-ready UVSP configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UvspConfig {
    pub radial: RadialCfg,
    pub pedestal: Rgb,
    pub offset: Rgb,
    pub desat: DesatCfg,
    pub r2y: R2yCoefCfg,
}

impl NoiseFactors for UvspFactors {
    type Output = UvspConfig;

    fn noise_index(&self) -> u32 {
        self.noise_index
    }

    fn interpolate(b: &Self, t: &Self, lerp: &Lerp) -> UvspConfig {
        let rgb = |x: &Rgb, y: &Rgb| Rgb {
            r: lerp.value(x.r, y.r),
            g: lerp.value(x.g, y.g),
            b: lerp.value(x.b, y.b),
        };
        let (br, tr) = (&b.radial, &t.radial);
        let (bd, td) = (&b.desat, &t.desat);

        UvspConfig {
            radial: RadialCfg {
                biquad_shift: lerp.value_u32(br.biquad_shift, tr.biquad_shift),
                random_en: lerp.pick(br.random_en, tr.random_en),
                random_power: lerp.value_u32(br.random_power, tr.random_power),
                refine_en: lerp.pick(br.refine_en, tr.refine_en),
                refine_luma_min: lerp.value_u32(br.refine_luma_min, tr.refine_luma_min),
                refine_denom: lerp.value_u32(br.refine_denom, tr.refine_denom),
                alpha_gain_add_en: lerp.pick(br.alpha_gain_add_en, tr.alpha_gain_add_en),
                alpha_green_en: lerp.pick(br.alpha_green_en, tr.alpha_green_en),
                alpha_r: lerp.value_u32(br.alpha_r, tr.alpha_r),
                alpha_g: lerp.value_u32(br.alpha_g, tr.alpha_g),
                alpha_b: lerp.value_u32(br.alpha_b, tr.alpha_b),
            },
            pedestal: rgb(&b.pedestal, &t.pedestal),
            offset: rgb(&b.offset, &t.offset),
            desat: DesatCfg {
                ctrl_en: lerp.pick(bd.ctrl_en, td.ctrl_en),
                ctrl_single_side: lerp.pick(bd.ctrl_single_side, td.ctrl_single_side),
                ctrl_luma_offset: lerp.value_u32(bd.ctrl_luma_offset, td.ctrl_luma_offset),
                ctrl_gain_offset: lerp.value_u32(bd.ctrl_gain_offset, td.ctrl_gain_offset),
                y_shift: lerp.value_u32(bd.y_shift, td.y_shift),
                y_luma_max: lerp.value_u32(bd.y_luma_max, td.y_luma_max),
                u_low: lerp.value(bd.u_low, td.u_low),
                u_high: lerp.value(bd.u_high, td.u_high),
                v_low: lerp.value(bd.v_low, td.v_low),
                v_high: lerp.value(bd.v_high, td.v_high),
            },
            r2y: R2yCoefCfg {
                coef: lerp.values(&b.r2y.coef, &t.r2y.coef),
                shift: lerp.value_u32(b.r2y.shift, t.r2y.shift),
            },
        }
    }
}

/// UVSP section of a setfile table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UvspTuneset {
    pub ni_dep_factors: Vec<UvspFactors>,
}

/// What the engine writes for one shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvspTuning {
    /// No geometry for this shot, turn the block off
    Disable,
    /// Same noise index as the last shot
    Unchanged,
    Apply {
        radial: RadialCtrl,
        config: Option<UvspConfig>,
    },
}

/// Per-engine UVSP state
#[derive(Debug, Clone, Default)]
pub struct UvspTuner {
    cache: NiCache,
}

impl UvspTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn tune(
        &mut self,
        tuneset: &UvspTuneset,
        cal: &UvspCalibration,
        taa: Option<&TaaGeometry>,
        ni: u32,
    ) -> UvspTuning {
        if !self.cache.is_stale(ni) {
            return UvspTuning::Unchanged;
        }
        self.cache.commit(ni);

        let Some(taa) = taa else {
            tracing::debug!("UVSP: no 3AA geometry, disabling");
            return UvspTuning::Disable;
        };

        UvspTuning::Apply {
            radial: RadialCtrl::compute(cal, taa),
            config: resolve(&tuneset.ni_dep_factors, ni),
        }
    }
}

/// Geometry of a full-resolution capture without cropping
pub fn identity_geometry(width: u32, height: u32) -> TaaGeometry {
    TaaGeometry {
        binning_x: 1,
        binning_y: 1,
        crop: Rect::full(width, height),
        bds_width: width,
        bds_height: height,
    }
}
