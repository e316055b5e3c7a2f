//! Core types for the multi-channel scaler control core
//!
//! This crate provides the foundational types, error handling,
//! configuration, logging and register-access plumbing shared by the
//! tuning, scaler and hardware-control crates.

pub mod cap;
pub mod config;
pub mod error;
pub mod event;
pub mod frame;
pub mod logging;
pub mod param;
pub mod regfile;
pub mod regs;
pub mod types;

pub use cap::McscCap;
pub use config::Config;
pub use error::{DmaPath, FormatError, McscError, Result};
pub use event::{
    create_frame_event_channel, FrameEvent, FrameEventReceiver, FrameEventSender,
    FRAME_EVENT_QUEUE_CAPACITY,
};
pub use frame::{DoneType, Frame, FrameId, GroupContext, ShotKind, SubBlockPorts, TaaGeometry};
pub use param::{McsParam, ParamChange, Rect};
pub use regfile::{RegWrite, RegisterFile};
pub use regs::{Field, Reg, RegisterAccess};
pub use types::{EngineId, OutputId, OutputMask, ENGINE_COUNT, MCSC_OUTPUT_MAX, MCSC_RST_CHK};
