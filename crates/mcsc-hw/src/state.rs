//! Engine state flags and the frame-valid signal

use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

bitflags! {
    /// Per-engine state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HwState: u32 {
        const OPEN     = 1 << 0;
        const INIT     = 1 << 1;
        const RUN      = 1 << 2;
        /// Shadow registers hold a configured shot
        const CONFIG   = 1 << 3;
        /// A setfile is loaded
        const TUNESET  = 1 << 4;
        /// DS output armed for a memory-fed shot
        const DS_CFG   = 1 << 5;
        /// YSUM armed for a memory-fed shot
        const YSUM_CFG = 1 << 6;
        /// Register programming failed, waiting for restore
        const ERROR    = 1 << 7;
    }
}

/// Lifecycle state derived from the flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Closed,
    Opened,
    Initialized,
    Running,
    ErrorRecovery,
}

impl EngineState {
    pub fn name(self) -> &'static str {
        match self {
            EngineState::Closed => "closed",
            EngineState::Opened => "opened",
            EngineState::Initialized => "initialized",
            EngineState::Running => "running",
            EngineState::ErrorRecovery => "error-recovery",
        }
    }
}

/// Atomic holder of [`HwState`], readable from the sibling engine
#[derive(Debug, Default)]
pub struct StateCell(AtomicU32);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn get(&self) -> HwState {
        HwState::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    pub fn test(&self, flag: HwState) -> bool {
        self.get().contains(flag)
    }

    pub fn set(&self, flag: HwState) {
        self.0.fetch_or(flag.bits(), Ordering::AcqRel);
    }

    pub fn clear(&self, flag: HwState) {
        self.0.fetch_and(!flag.bits(), Ordering::AcqRel);
    }

    /// Clear `flag` and report whether it was set
    pub fn test_and_clear(&self, flag: HwState) -> bool {
        let prev = self.0.fetch_and(!flag.bits(), Ordering::AcqRel);
        prev & flag.bits() != 0
    }

    pub fn engine_state(&self) -> EngineState {
        let state = self.get();
        if state.contains(HwState::ERROR) {
            EngineState::ErrorRecovery
        } else if state.contains(HwState::RUN) {
            EngineState::Running
        } else if state.contains(HwState::INIT) {
            EngineState::Initialized
        } else if state.contains(HwState::OPEN) {
            EngineState::Opened
        } else {
            EngineState::Closed
        }
    }
}

/// Whether a frame is currently being drained by the engine.
///
/// `disable()` waits on this for the in-flight frame to finish.
#[derive(Debug, Default)]
pub struct Vvalid {
    valid: Mutex<bool>,
    cond: Condvar,
}

impl Vvalid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        *self.valid.lock()
    }

    /// Frame started draining
    pub fn set_valid(&self) {
        *self.valid.lock() = true;
    }

    /// Frame finished, wake any waiter
    pub fn set_blank(&self) {
        let mut valid = self.valid.lock();
        *valid = false;
        self.cond.notify_all();
    }

    /// Wait until blank. Returns false on timeout.
    pub fn wait_blank(&self, timeout: Duration) -> bool {
        let mut valid = self.valid.lock();
        if !*valid {
            return true;
        }
        let result = self.cond.wait_while_for(&mut valid, |v| *v, timeout);
        !result.timed_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_state_derivation() {
        let cell = StateCell::new();
        assert_eq!(cell.engine_state(), EngineState::Closed);
        cell.set(HwState::OPEN);
        assert_eq!(cell.engine_state(), EngineState::Opened);
        cell.set(HwState::INIT);
        cell.set(HwState::RUN);
        assert_eq!(cell.engine_state(), EngineState::Running);
        cell.set(HwState::ERROR);
        assert_eq!(cell.engine_state(), EngineState::ErrorRecovery);
    }

    #[test]
    fn test_test_and_clear() {
        let cell = StateCell::new();
        cell.set(HwState::DS_CFG);
        assert!(cell.test_and_clear(HwState::DS_CFG));
        assert!(!cell.test_and_clear(HwState::DS_CFG));
    }

    #[test]
    fn test_vvalid_wait() {
        let vvalid = Arc::new(Vvalid::new());
        assert!(vvalid.wait_blank(Duration::from_millis(1)));

        vvalid.set_valid();
        assert!(!vvalid.wait_blank(Duration::from_millis(5)));

        let waker = Arc::clone(&vvalid);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            waker.set_blank();
        });
        assert!(vvalid.wait_blank(Duration::from_secs(5)));
        handle.join().unwrap();
    }
}
