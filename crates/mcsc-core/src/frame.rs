//! Capture requests handed to an engine

use crate::param::{ParamChange, Rect};
use crate::types::{OutputId, OutputMask, MCSC_OUTPUT_MAX};

/// Handle of a capture request in the owner's frame table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

/// Kind of capture request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShotKind {
    #[default]
    Normal,
    /// Synthesized by the driver, no user buffers
    Internal,
    /// One request spanning several engines or buffers
    Multi,
}

/// Frame completion outcome reported to the lifecycle owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneType {
    Success,
    Unprocessed,
    LateFrame,
    Overflow,
    InvalidFrameNumber,
    Timeout,
}

/// State of the pipeline group the request belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupContext {
    /// Group input is streamed from the previous block
    pub otf_input: bool,
    /// Shots already processed by the group
    pub shot_count: u32,
    /// Sensor is streaming
    pub streaming: bool,
    pub video_mode: bool,
}

/// Source ports of the DS and YSUM sub-blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubBlockPorts {
    pub ds: Option<OutputId>,
    pub ysum: Option<OutputId>,
}

/// Geometry of the upstream 3AA stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaaGeometry {
    /// Sensor binning ratio
    pub binning_x: u32,
    pub binning_y: u32,
    /// Crop applied by 3AA before BDS
    pub crop: Rect,
    /// BDS output size, zero when BDS is bypassed
    pub bds_width: u32,
    pub bds_height: u32,
}

/// A capture request
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub id: FrameId,
    pub instance: u32,
    pub fcount: u32,
    pub kind: ShotKind,
    pub num_buffers: u32,
    pub cur_buf_index: u32,
    /// Reported noise index, already scaled by the NI multiplier
    pub noise_index: u32,
    /// Outputs this request expects completions for
    pub out_flag: OutputMask,
    pub changed: ParamChange,
    pub group: GroupContext,
    pub ports: SubBlockPorts,
    pub ds_crop: Rect,
    pub taa: Option<TaaGeometry>,
    /// Input plane addresses, `planes` entries per buffer slot
    pub input_addrs: Vec<u32>,
    /// Output plane addresses per port, `planes` entries per buffer slot
    pub output_addrs: [Vec<u32>; MCSC_OUTPUT_MAX],
}

impl Frame {
    pub fn new(id: FrameId, instance: u32, fcount: u32) -> Self {
        Self {
            id,
            instance,
            fcount,
            num_buffers: 1,
            ..Default::default()
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ShotKind::Internal
    }

    pub fn is_multi(&self) -> bool {
        self.kind == ShotKind::Multi
    }

    /// Plane address for a buffer slot, zero when missing
    pub fn input_addr(&self, planes: u32, buf: u32, plane: u32) -> u32 {
        let idx = (planes * buf + plane) as usize;
        self.input_addrs.get(idx).copied().unwrap_or(0)
    }

    pub fn output_addr(&self, out: OutputId, planes: u32, buf: u32, plane: u32) -> u32 {
        let idx = (planes * buf + plane) as usize;
        self.output_addrs[out.index()].get(idx).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_addressing() {
        let mut frame = Frame::new(FrameId(1), 0, 10);
        frame.input_addrs = vec![0x1000, 0x2000, 0x3000, 0x4000];
        assert_eq!(frame.input_addr(2, 1, 0), 0x3000);
        assert_eq!(frame.input_addr(2, 1, 1), 0x4000);
        assert_eq!(frame.input_addr(2, 2, 0), 0);
        assert_eq!(frame.num_buffers, 1);
    }
}
