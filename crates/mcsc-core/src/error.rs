//! Error types for the MCSC control core

use thiserror::Error;

use crate::types::{EngineId, OutputId};

/// Main error type for the scaler control core
#[derive(Error, Debug)]
pub enum McscError {
    #[error("{engine}: not initialized (instance {instance})")]
    NotInitialized { engine: EngineId, instance: u32 },

    #[error("Invalid format: {0}")]
    InvalidFormat(#[from] FormatError),

    #[error("Invalid address for {path}: buffer {index} is unset")]
    InvalidAddress { path: DmaPath, index: u32 },

    #[error("{engine}: timeout waiting for {what} ({timeout_ms} ms)")]
    HardwareTimeout {
        engine: EngineId,
        what: &'static str,
        timeout_ms: u64,
    },

    #[error("Unsupported ratio on {output}: {src} -> {dst}")]
    UnsupportedRatio { output: OutputId, src: u32, dst: u32 },

    #[error("Setfile version mismatch: expected 0x{expected:x}, found 0x{found:x}")]
    SetfileVersionMismatch { expected: u32, found: u32 },

    #[error("Setfile index {index} out of range (using {using_count})")]
    InvalidSetfileIndex { index: u32, using_count: u32 },

    #[error("{engine}: frame accounting anomaly (start {start} < end {end})")]
    FrameAccountingAnomaly { engine: EngineId, start: u32, end: u32 },

    #[error("{0}: software reset failed")]
    ResetFailed(EngineId),

    #[error("{engine}: operation not allowed in state {state}")]
    InvalidState { engine: EngineId, state: &'static str },

    #[error("Invalid sub-block port: {0}")]
    InvalidPort(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pixel format validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported format {format} with {planes} plane(s)")]
    Unsupported { format: &'static str, planes: u32 },

    #[error("unsupported bit depth {0}")]
    BitWidth(u32),

    #[error("invalid size {width}x{height}")]
    Size { width: u32, height: u32 },

    #[error("post-chain output {post_w}x{post_h} does not match {out_w}x{out_h}")]
    SizeMismatch {
        post_w: u32,
        post_h: u32,
        out_w: u32,
        out_h: u32,
    },
}

/// DMA path identifiers used in address errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaPath {
    Rdma,
    Wdma(OutputId),
    TdnrRdma,
    TdnrWdma,
}

impl std::fmt::Display for DmaPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DmaPath::Rdma => write!(f, "rdma"),
            DmaPath::Wdma(out) => write!(f, "wdma{}", out.index()),
            DmaPath::TdnrRdma => write!(f, "tdnr rdma"),
            DmaPath::TdnrWdma => write!(f, "tdnr wdma"),
        }
    }
}

/// Result type alias for the control core
pub type Result<T> = std::result::Result<T, McscError>;
