//! State shared by the two engines of a pair
//!
//! Output ports can be driven by either engine. [`OutputOwnership`] tracks
//! which ports are idle and which engine is draining a frame through a busy
//! one, so that a disable or reset on one engine never tears down a port the
//! sibling is still using. The ownership lock is held only around bit
//! updates, never across register programming.

use parking_lot::Mutex;
use std::sync::Arc;

use mcsc_core::config::Config;
use mcsc_core::{EngineId, McscCap, OutputId, RegisterAccess, ENGINE_COUNT, MCSC_OUTPUT_MAX, MCSC_RST_CHK};

use crate::state::{HwState, StateCell};

/// Depth of the per-engine noise-index backup ring
pub const NI_BACKUP_MAX: usize = 32;

/// Ownership value at power-up: every port idle
pub const OWNERSHIP_INIT: u32 = 0xFFFF;

/// Port ownership bitmask. A set bit means the port is idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOwnership {
    bits: u32,
    owner: [Option<EngineId>; MCSC_OUTPUT_MAX],
}

impl Default for OutputOwnership {
    fn default() -> Self {
        Self {
            bits: OWNERSHIP_INIT,
            owner: [None; MCSC_OUTPUT_MAX],
        }
    }
}

impl OutputOwnership {
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_idle(&self, out: OutputId) -> bool {
        self.bits & (1 << out.index()) != 0
    }

    pub fn owner(&self, out: OutputId) -> Option<EngineId> {
        self.owner[out.index()]
    }

    /// Busy on behalf of an engine other than `engine`
    pub fn busy_elsewhere(&self, out: OutputId, engine: EngineId) -> bool {
        !self.is_idle(out) && self.owner(out) != Some(engine)
    }

    /// Busy on behalf of `engine`
    pub fn held_by(&self, out: OutputId, engine: EngineId) -> bool {
        !self.is_idle(out) && self.owner(out) == Some(engine)
    }

    /// Mark a port as draining a frame of `engine`
    pub fn claim(&mut self, out: OutputId, engine: EngineId) {
        self.bits &= !(1 << out.index());
        self.owner[out.index()] = Some(engine);
    }

    /// Mark a port idle again
    pub fn release(&mut self, out: OutputId) {
        self.bits |= 1 << out.index();
        self.owner[out.index()] = None;
    }

    /// Every port idle, reset-check cleared
    pub fn release_all(&mut self) {
        for out in OutputId::all() {
            self.release(out);
        }
        self.bits &= !(1 << MCSC_RST_CHK);
    }

    pub fn reset_checked(&self) -> bool {
        self.bits & (1 << MCSC_RST_CHK) != 0
    }

    pub fn set_reset_check(&mut self, on: bool) {
        if on {
            self.bits |= 1 << MCSC_RST_CHK;
        } else {
            self.bits &= !(1 << MCSC_RST_CHK);
        }
    }
}

/// Resources of an engine pair
pub struct PairShared {
    pub(crate) config: Config,
    pub(crate) regs: [Arc<dyn RegisterAccess>; ENGINE_COUNT],
    pub(crate) states: [StateCell; ENGINE_COUNT],
    /// Serializes shot, enable and reset paths across the pair
    pub(crate) config_lock: Mutex<()>,
    pub(crate) ownership: Mutex<OutputOwnership>,
    ni_ring: Mutex<[[u32; NI_BACKUP_MAX]; ENGINE_COUNT]>,
}

impl PairShared {
    pub fn new(config: Config, regs: [Arc<dyn RegisterAccess>; ENGINE_COUNT]) -> Self {
        Self {
            config,
            regs,
            states: [StateCell::new(), StateCell::new()],
            config_lock: Mutex::new(()),
            ownership: Mutex::new(OutputOwnership::default()),
            ni_ring: Mutex::new([[0; NI_BACKUP_MAX]; ENGINE_COUNT]),
        }
    }

    pub fn cap(&self) -> &McscCap {
        &self.config.capability
    }

    pub fn regs(&self, engine: EngineId) -> &Arc<dyn RegisterAccess> {
        &self.regs[engine.index()]
    }

    pub fn state(&self, engine: EngineId) -> &StateCell {
        &self.states[engine.index()]
    }

    /// An engine of the pair that is running, when outputs are shared
    pub fn core_running(&self) -> Option<EngineId> {
        if !self.cap().enable_shared_output {
            return None;
        }
        EngineId::ALL
            .into_iter()
            .rev()
            .find(|e| self.state(*e).test(HwState::RUN))
    }

    /// Port driven by the sibling while outputs are shared
    pub fn shared_out_busy(&self, out: OutputId, engine: EngineId) -> bool {
        self.cap().enable_shared_output && self.ownership.lock().busy_elsewhere(out, engine)
    }

    pub fn ownership_bits(&self) -> u32 {
        self.ownership.lock().bits()
    }

    pub fn store_ni(&self, engine: EngineId, fcount: u32, ni: u32) {
        self.ni_ring.lock()[engine.index()][fcount as usize % NI_BACKUP_MAX] = ni;
    }

    pub fn load_ni(&self, engine: EngineId, fcount: u32) -> u32 {
        self.ni_ring.lock()[engine.index()][fcount as usize % NI_BACKUP_MAX]
    }
}
