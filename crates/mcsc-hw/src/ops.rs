//! Hardware IP operations
//!
//! The capture pipeline drives every hardware block through this trait.
//! The block variant is chosen once when the pipeline is built.

use mcsc_core::{DoneType, EngineId, Frame, McsParam, OutputMask, Result};
use mcsc_tuning::{SetfileBlob, UvspCalibration};

use crate::state::EngineState;

/// Per-instance binding made by `init`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitRequest {
    /// Instance is a reprocessing stream
    pub reprocessing: bool,
    /// Outputs the instance drives
    pub outputs: OutputMask,
    pub sensor_position: u32,
}

/// Luminance sum read back from YSUM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YsumMeta {
    pub higher: u32,
    pub lower: u32,
}

impl YsumMeta {
    pub fn sum(&self) -> u64 {
        ((self.higher as u64) << 32) | self.lower as u64
    }
}

/// Operations of one hardware block
pub trait HwIp: Send + Sync {
    fn id(&self) -> EngineId;

    fn engine_state(&self) -> EngineState;

    fn open(&self, instance: u32) -> Result<()>;

    fn init(&self, instance: u32, request: &InitRequest) -> Result<()>;

    fn close(&self, instance: u32) -> Result<()>;

    /// Reset the pair and unmask interrupts
    fn enable(&self, instance: u32) -> Result<()>;

    /// Wait for the in-flight frame, then stop the engine
    fn disable(&self, instance: u32) -> Result<()>;

    fn set_param(&self, instance: u32, param: &McsParam) -> Result<()>;

    /// Configure and arm one capture request
    fn shot(&self, frame: Frame) -> Result<()>;

    /// Complete a request that will not be processed
    fn frame_ndone(&self, frame: &Frame, result: DoneType) -> Result<()>;

    fn load_setfile(&self, instance: u32, blob: SetfileBlob, calibration: UvspCalibration) -> Result<()>;

    fn apply_setfile(&self, instance: u32, scenario: u32) -> Result<()>;

    fn delete_setfile(&self, instance: u32) -> Result<()>;

    /// Recover from a programming failure
    fn restore(&self, instance: u32) -> Result<()>;

    fn size_dump(&self);

    fn get_meta(&self) -> Option<YsumMeta>;

    /// Record the reported noise index of a frame
    fn set_ni(&self, fcount: u32, noise_index: u32);

    /// Interrupt entry point
    fn handle_interrupt(&self);
}
