//! In-memory register bank
//!
//! Backs an engine when no hardware is mapped. Every write is journaled so
//! callers can inspect the exact programming sequence of a shot.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::regs::{Field, Reg, RegisterAccess};

/// One journaled register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWrite {
    Field(Field, u32),
    Register(Reg, u32),
}

/// Register bank held in memory
pub struct RegisterFile {
    name: String,
    fields: Mutex<HashMap<Field, u32>>,
    regs: Mutex<HashMap<Reg, u32>>,
    journal: Mutex<Vec<RegWrite>>,
    reset_stuck: AtomicBool,
    reset_count: AtomicU32,
}

impl RegisterFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Mutex::new(HashMap::new()),
            regs: Mutex::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            reset_stuck: AtomicBool::new(false),
            reset_count: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a field without journaling (hardware-side state)
    pub fn poke(&self, field: Field, value: u32) {
        self.fields.lock().insert(field, value);
    }

    /// Latch interrupt status bits as the hardware would
    pub fn raise(&self, status: u32) {
        let mut regs = self.regs.lock();
        *regs.entry(Reg::IntrStatus).or_insert(0) |= status;
    }

    /// Current value of a field, zero when never written
    pub fn field(&self, field: Field) -> u32 {
        self.fields.lock().get(&field).copied().unwrap_or(0)
    }

    /// Drain the write journal
    pub fn take_writes(&self) -> Vec<RegWrite> {
        std::mem::take(&mut *self.journal.lock())
    }

    /// Number of journaled writes since the last drain
    pub fn write_count(&self) -> usize {
        self.journal.lock().len()
    }

    /// Make the next software resets fail
    pub fn set_reset_stuck(&self, stuck: bool) {
        self.reset_stuck.store(stuck, Ordering::Release);
    }

    pub fn reset_count(&self) -> u32 {
        self.reset_count.load(Ordering::Acquire)
    }
}

impl RegisterAccess for RegisterFile {
    fn set_field(&self, field: Field, value: u32) {
        self.fields.lock().insert(field, value);
        self.journal.lock().push(RegWrite::Field(field, value));
    }

    fn get_field(&self, field: Field) -> u32 {
        self.field(field)
    }

    fn set_register(&self, reg: Reg, value: u32) {
        {
            let mut regs = self.regs.lock();
            match reg {
                // Write-one-to-clear
                Reg::IntrClear => {
                    *regs.entry(Reg::IntrStatus).or_insert(0) &= !value;
                }
                _ => {
                    regs.insert(reg, value);
                }
            }
        }
        self.journal.lock().push(RegWrite::Register(reg, value));
    }

    fn get_register(&self, reg: Reg) -> u32 {
        self.regs.lock().get(&reg).copied().unwrap_or(0)
    }

    fn sw_reset(&self) -> bool {
        if self.reset_stuck.load(Ordering::Acquire) {
            tracing::warn!("{}: sw reset did not complete", self.name);
            return false;
        }
        self.reset_count.fetch_add(1, Ordering::AcqRel);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{CtrlField, IntrStatus};

    #[test]
    fn test_journal_and_readback() {
        let regs = RegisterFile::new("test");
        regs.set_field(Field::Ctrl(CtrlField::ScalerEnable), 1);
        assert_eq!(regs.get_field(Field::Ctrl(CtrlField::ScalerEnable)), 1);
        assert_eq!(regs.write_count(), 1);

        let writes = regs.take_writes();
        assert_eq!(writes, vec![RegWrite::Field(Field::Ctrl(CtrlField::ScalerEnable), 1)]);
        assert_eq!(regs.write_count(), 0);
    }

    #[test]
    fn test_interrupt_clear() {
        let regs = RegisterFile::new("test");
        regs.raise((IntrStatus::FRAME_START | IntrStatus::FRAME_END).bits());
        regs.set_register(Reg::IntrClear, IntrStatus::FRAME_START.bits());
        assert_eq!(regs.get_register(Reg::IntrStatus), IntrStatus::FRAME_END.bits());
    }

    #[test]
    fn test_stuck_reset() {
        let regs = RegisterFile::new("test");
        assert!(regs.sw_reset());
        regs.set_reset_stuck(true);
        assert!(!regs.sw_reset());
        assert_eq!(regs.reset_count(), 1);
    }
}
