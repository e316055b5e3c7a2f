//! Hardware control for the multi-channel scaler engine pair
//!
//! Each [`McscEngine`] turns capture requests into register writes through
//! the [`mcsc_core::RegisterAccess`] capability and reacts to its interrupt.
//! The two engines of a [`McscPair`] share output ports; the ownership
//! bitmask in [`PairShared`] keeps a disable or reset on one engine from
//! tearing down a port the other is still draining.

pub mod dma;
pub mod dump;
pub mod engine;
pub mod irq;
pub mod ops;
pub mod output;
pub mod pair;
pub mod shared;
pub mod shot;
pub mod state;
pub mod subblk;

pub use engine::{CounterSnapshot, McscEngine, WDMA_BUF_SLOTS};
pub use ops::{HwIp, InitRequest, YsumMeta};
pub use pair::McscPair;
pub use shared::{OutputOwnership, PairShared, NI_BACKUP_MAX, OWNERSHIP_INIT};
pub use state::{EngineState, HwState};
