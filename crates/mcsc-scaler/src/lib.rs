//! Size and scaling-ratio engine for the multi-channel scaler
//!
//! Pure planning: given the requested geometry for an output, decide how the
//! DJAG pre-filter, the poly-phase stage and the post-chain split the work
//! and compute the fixed-point ratios the hardware expects. Format checks
//! and YUV range derivation live here too so the hardware crate only has to
//! write the resulting values.

pub mod bchs;
pub mod djag;
pub mod format;
pub mod ratio;

pub use bchs::{range_settings, BchsSettings};
pub use djag::{djag_input, plan_djag, DjagPlan};
pub use format::{check_format, IoType};
pub use ratio::{plan_poly, plan_post, scaling_ratio, PolyPlan, PostPlan, ScaleLimits, RATIO_ONE};
