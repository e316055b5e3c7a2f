//! Per-instance scaler parameters supplied by the capture pipeline

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::types::{OutputId, MCSC_OUTPUT_MAX};

/// Pixel rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the rectangle lies inside a `width`x`height` image
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Memory layout requested for a DMA path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmaFormat {
    #[default]
    Yuv422,
    Yuv420,
    Y,
    Rgb,
}

/// Component order within a plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmaOrder {
    #[default]
    CbCr,
    CrCb,
    YCbYCr,
    YCrYCb,
    CbYCrY,
    CrYCbY,
    Argb,
    Bgra,
    Rgba,
    Abgr,
}

/// Streamed path format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtfFormat {
    #[default]
    Yuv422,
    Y,
}

/// Output flip mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum FlipMode {
    #[default]
    None = 0,
    X = 1,
    Y = 2,
    Xy = 3,
}

/// YUV quantization range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum YuvRange {
    #[default]
    Full,
    Narrow,
}

impl YuvRange {
    pub fn index(self) -> usize {
        match self {
            YuvRange::Full => 0,
            YuvRange::Narrow => 1,
        }
    }
}

/// Control parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlParam {
    /// Base address of the internal TDNR buffer pair
    pub buffer_address: u32,
}

/// Scaler input parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParam {
    pub otf_cmd: bool,
    pub otf_format: OtfFormat,
    pub otf_bitwidth: u32,
    pub width: u32,
    pub height: u32,
    pub dma_cmd: bool,
    pub dma_format: DmaFormat,
    pub dma_bitwidth: u32,
    pub dma_order: DmaOrder,
    pub plane: u32,
    /// Crop applied to the DMA input
    pub dma_crop: Rect,
    pub dma_stride_y: u32,
    pub dma_stride_c: u32,
}

impl InputParam {
    /// Size of the image entering the scaler
    pub fn scaler_input_size(&self) -> (u32, u32) {
        if self.dma_cmd {
            (self.dma_crop.width, self.dma_crop.height)
        } else {
            (self.width, self.height)
        }
    }
}

/// Per-output parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputParam {
    pub otf_cmd: bool,
    pub otf_format: OtfFormat,
    pub otf_bitwidth: u32,
    pub dma_cmd: bool,
    pub dma_format: DmaFormat,
    pub dma_bitwidth: u32,
    pub dma_order: DmaOrder,
    pub plane: u32,
    /// Source crop in scaler input coordinates
    pub crop: Rect,
    pub width: u32,
    pub height: u32,
    pub dma_stride_y: u32,
    pub dma_stride_c: u32,
    pub flip: FlipMode,
    pub yuv_range: YuvRange,
    pub hwfc: bool,
}

impl OutputParam {
    pub fn is_enabled(&self) -> bool {
        self.otf_cmd || self.dma_cmd
    }
}

/// Parameters of the scaler for one stream instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McsParam {
    pub control: ControlParam,
    pub input: InputParam,
    pub outputs: [OutputParam; MCSC_OUTPUT_MAX],
    /// Downstream denoise bypass request
    pub tdnr_bypass: bool,
}

impl McsParam {
    pub fn output(&self, out: OutputId) -> &OutputParam {
        &self.outputs[out.index()]
    }

    pub fn output_mut(&mut self, out: OutputId) -> &mut OutputParam {
        &mut self.outputs[out.index()]
    }
}

bitflags! {
    /// Parameter groups changed by a shot
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParamChange: u32 {
        const CONTROL = 1 << 0;
        const INPUT   = 1 << 1;
        const OUTPUT  = 1 << 2;
        const TDNR    = 1 << 3;
    }
}
