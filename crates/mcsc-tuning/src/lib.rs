//! Noise-index tuning for the multi-channel scaler
//!
//! Tuning tables store factor vectors at reference noise indexes. This
//! crate interpolates them for a frame's noise index and turns the result
//! into register-ready configuration for the denoise (TDNR), chromatic
//! aberration (CAC) and UV suppression (UVSP) blocks. Nothing here touches
//! hardware.

pub mod cac;
pub mod interp;
pub mod setfile;
pub mod tdnr;
pub mod uvsp;

pub use cac::{CacConfig, CacFactors, CacTuner, CacTuneset};
pub use interp::{find_bracket, resolve, Bracket, Lerp, NiCache, NoiseFactors};
pub use setfile::{
    BchsClamp, DjagTuning, McscSetfile, SetfileBlob, SetfileFormat, YuvRangeBase,
    MCSC_SETFILE_VERSION,
};
pub use tdnr::{select_mode, ModeInputs, TdnrConfig, TdnrMode, TdnrTuner, TdnrTuneset, TdnrTuning};
pub use uvsp::{RadialCtrl, UvspCalibration, UvspConfig, UvspTuner, UvspTuneset, UvspTuning};
