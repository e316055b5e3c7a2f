//! Poly-phase and post-chain planning
//!
//! The poly-phase stage handles moderate ratios at full quality. Larger
//! down-scales are split: poly-phase produces an intermediate image and the
//! post-chain scales the rest of the way.

use mcsc_core::config::ScalerConfig;
use mcsc_core::{FormatError, McscError, OutputId, Rect};

/// Fractional bits of a scaling ratio
pub const MCSC_PRECISION: u32 = 20;

/// Ratio of an unscaled axis
pub const RATIO_ONE: u32 = 1 << MCSC_PRECISION;

/// `src / dst` in fixed point, `None` for an empty destination
pub fn scaling_ratio(src: u32, dst: u32) -> Option<u32> {
    ((src as u64) << MCSC_PRECISION)
        .checked_div(dst as u64)
        .map(|r| r.min(u32::MAX as u64) as u32)
}

fn round_up(value: u32, multiple: u32) -> u32 {
    if multiple == 0 {
        return value;
    }
    value.div_ceil(multiple).saturating_mul(multiple)
}

/// Scaling bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleLimits {
    pub quality_ratio_down: u32,
    pub poly_ratio_up: u32,
    pub poly_ratio_down: u32,
    pub post_ratio_down: u32,
    pub post_max_width: u32,
    /// Exponent of the post-ratio alignment, `None` when disabled
    pub post_wa_shift: Option<u32>,
    pub min_size: u32,
    pub max_size: u32,
}

impl From<&ScalerConfig> for ScaleLimits {
    fn from(cfg: &ScalerConfig) -> Self {
        Self {
            quality_ratio_down: cfg.quality_ratio_down,
            poly_ratio_up: cfg.poly_ratio_up,
            poly_ratio_down: cfg.poly_ratio_down,
            post_ratio_down: cfg.post_ratio_down,
            post_max_width: cfg.post_max_width,
            post_wa_shift: cfg.post_wa_enabled.then_some(cfg.post_wa_shift),
            min_size: cfg.min_size,
            max_size: cfg.max_size,
        }
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self::from(&ScalerConfig::default())
    }
}

/// Filter coefficient set, named by the scale factor it is tuned for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum ScaleCoef {
    #[default]
    X8_8 = 0,
    X7_8 = 1,
    X6_8 = 2,
    X5_8 = 3,
    X4_8 = 4,
    X3_8 = 5,
    X2_8 = 6,
}

const fn ratio_for_eighths(n: u32) -> u32 {
    ((8u64 << MCSC_PRECISION) / n as u64) as u32
}

/// Coefficient set and phase offset for one axis.
///
/// `rear_tuned` keeps the 7/8 set for mild down-scales; rear sensors are
/// tuned that way.
pub fn select_coef(ratio: u32, rear_tuned: bool) -> (ScaleCoef, u32) {
    if ratio <= RATIO_ONE {
        let phase = if ratio == RATIO_ONE { 0 } else { ratio >> 1 };
        return (ScaleCoef::X8_8, phase);
    }

    let coef = if ratio <= ratio_for_eighths(7) {
        ScaleCoef::X7_8
    } else if ratio <= ratio_for_eighths(6) {
        if rear_tuned { ScaleCoef::X7_8 } else { ScaleCoef::X6_8 }
    } else if ratio <= ratio_for_eighths(5) {
        if rear_tuned { ScaleCoef::X7_8 } else { ScaleCoef::X5_8 }
    } else if ratio <= ratio_for_eighths(4) {
        ScaleCoef::X4_8
    } else if ratio <= ratio_for_eighths(3) {
        ScaleCoef::X3_8
    } else {
        ScaleCoef::X2_8
    };
    (coef, 0)
}

/// Poly-phase stage settings for one output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyPlan {
    pub src: Rect,
    pub dst_width: u32,
    pub dst_height: u32,
    pub h_ratio: u32,
    pub v_ratio: u32,
    pub h_coef: ScaleCoef,
    pub v_coef: ScaleCoef,
    pub h_phase: u32,
    pub v_phase: u32,
    /// Post-chain finishes the scale
    pub post_en: bool,
    /// Requested ratio was outside every supported range and got clamped
    pub unsupported: bool,
}

#[derive(Debug, Clone, Copy)]
struct AxisPlan {
    dst: u32,
    post: bool,
    unsupported: bool,
}

fn plan_axis(src: u32, out: u32, l: &ScaleLimits, cap: Option<u32>, no_post: bool) -> AxisPlan {
    let (s, o) = (src as u64, out as u64);
    let q = l.quality_ratio_down as u64;
    let up = l.poly_ratio_up as u64;
    let down = l.poly_ratio_down as u64;
    let post = l.post_ratio_down as u64;
    let capped = |v: u32| cap.map_or(v, |c| v.min(c));

    if no_post || (s <= o * q && o <= s * up) {
        AxisPlan {
            dst: out,
            post: false,
            unsupported: false,
        }
    } else if s <= o * q * post && o * q < s {
        AxisPlan {
            dst: capped(round_up(src / l.quality_ratio_down, 2)),
            post: true,
            unsupported: false,
        }
    } else if s <= o * down * post && o * q * post < s {
        AxisPlan {
            dst: capped(round_up(out.saturating_mul(l.post_ratio_down), 2)),
            post: true,
            unsupported: false,
        }
    } else {
        AxisPlan {
            dst: round_up(src / l.poly_ratio_down.max(1), 2).max(2),
            post: true,
            unsupported: true,
        }
    }
}

/// Align the intermediate size so the post ratio is a multiple of 1/2^shift.
///
/// Searches decreasing power-of-two divisors of the output size and keeps
/// whatever the last step produced when nothing divides evenly.
fn align_for_post(dst_w: u32, dst_h: u32, out_w: u32, out_h: u32, shift: u32) -> (u32, u32) {
    let exact_w = (dst_w as u64) << shift;
    let exact_h = (dst_h as u64) << shift;
    if exact_w % out_w as u64 == 0 && exact_h % out_h as u64 == 0 {
        return (dst_w, dst_h);
    }

    let (mut mh, mut mv) = (1, 1);
    for s in 0..=shift {
        let d = 1u32 << (shift - s);
        if out_w % d == 0 && out_h % d == 0 {
            mh = out_w / d;
            mv = out_h / d;
            break;
        }
    }

    let mut w = round_up(dst_w, mh);
    let mut h = round_up(dst_h, mv);
    if w % 2 != 0 {
        w += mh;
        h += mv;
    }
    tracing::debug!(
        "post alignment: {}x{} -> {}x{} (multiple {},{})",
        dst_w,
        dst_h,
        w,
        h,
        mh,
        mv
    );
    (w, h)
}

/// Plan the poly-phase stage of `output` scaling `src` to `out_w`x`out_h`
pub fn plan_poly(
    output: OutputId,
    src: Rect,
    out_w: u32,
    out_h: u32,
    limits: &ScaleLimits,
    rear_tuned: bool,
) -> Result<PolyPlan, FormatError> {
    if src.is_empty() {
        return Err(FormatError::Size {
            width: src.width,
            height: src.height,
        });
    }
    if out_w == 0 || out_h == 0 {
        return Err(FormatError::Size {
            width: out_w,
            height: out_h,
        });
    }

    let no_post = !output.supports_post_chain();
    let h = plan_axis(src.width, out_w, limits, Some(limits.post_max_width), no_post);
    let v = plan_axis(src.height, out_h, limits, None, no_post);

    let unsupported = h.unsupported || v.unsupported;
    if unsupported {
        let (axis_src, axis_dst) = if h.unsupported { (src.width, out_w) } else { (src.height, out_h) };
        let err = McscError::UnsupportedRatio {
            output,
            src: axis_src,
            dst: axis_dst,
        };
        tracing::warn!("{} ({}x{} -> {}x{}), clamped", err, src.width, src.height, out_w, out_h);
    }

    let post_en = h.post || v.post;
    let (dst_w, dst_h) = match limits.post_wa_shift {
        Some(shift) if post_en => align_for_post(h.dst, v.dst, out_w, out_h, shift),
        _ => (h.dst, v.dst),
    };

    let h_ratio = scaling_ratio(src.width, dst_w).unwrap_or(RATIO_ONE);
    let v_ratio = scaling_ratio(src.height, dst_h).unwrap_or(RATIO_ONE);
    let (h_coef, h_phase) = select_coef(h_ratio, rear_tuned);
    let (v_coef, v_phase) = select_coef(v_ratio, rear_tuned);

    Ok(PolyPlan {
        src,
        dst_width: dst_w,
        dst_height: dst_h,
        h_ratio,
        v_ratio,
        h_coef,
        v_coef,
        h_phase,
        v_phase,
        post_en,
        unsupported,
    })
}

/// Post-chain stage settings for one output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostPlan {
    pub enable: bool,
    pub img_width: u32,
    pub img_height: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    pub h_ratio: u32,
    pub v_ratio: u32,
    pub h_coef: ScaleCoef,
    pub v_coef: ScaleCoef,
    pub h_phase: u32,
    pub v_phase: u32,
}

/// Plan the post-chain from the committed poly-phase output size
pub fn plan_post(img_w: u32, img_h: u32, out_w: u32, out_h: u32) -> Result<PostPlan, FormatError> {
    let (Some(h_ratio), Some(v_ratio)) = (scaling_ratio(img_w, out_w), scaling_ratio(img_h, out_h))
    else {
        return Err(FormatError::Size {
            width: out_w,
            height: out_h,
        });
    };
    let (h_coef, h_phase) = select_coef(h_ratio, false);
    let (v_coef, v_phase) = select_coef(v_ratio, false);

    Ok(PostPlan {
        enable: img_w != out_w || img_h != out_h,
        img_width: img_w,
        img_height: img_h,
        dst_width: out_w,
        dst_height: out_h,
        h_ratio,
        v_ratio,
        h_coef,
        v_coef,
        h_phase,
        v_phase,
    })
}
