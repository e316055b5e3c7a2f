//! Engine and output identifiers shared by every layer

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of logical outputs per engine
pub const MCSC_OUTPUT_MAX: usize = 6;

/// Number of physical engines in a pair
pub const ENGINE_COUNT: usize = 2;

/// Bit index of the reset-check sentinel in the ownership mask
pub const MCSC_RST_CHK: u32 = MCSC_OUTPUT_MAX as u32;

/// Physical scaler engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EngineId {
    Mcsc0,
    Mcsc1,
}

impl EngineId {
    pub const ALL: [EngineId; ENGINE_COUNT] = [EngineId::Mcsc0, EngineId::Mcsc1];

    pub fn index(self) -> usize {
        match self {
            EngineId::Mcsc0 => 0,
            EngineId::Mcsc1 => 1,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(EngineId::Mcsc0),
            1 => Some(EngineId::Mcsc1),
            _ => None,
        }
    }

    /// The other engine of the pair
    pub fn sibling(self) -> Self {
        match self {
            EngineId::Mcsc0 => EngineId::Mcsc1,
            EngineId::Mcsc1 => EngineId::Mcsc0,
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MCSC{}", self.index())
    }
}

/// Logical output port of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputId(u8);

impl OutputId {
    /// Detection (DS/VRA) output
    pub const DS: OutputId = OutputId(5);

    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < MCSC_OUTPUT_MAX);
        OutputId(index)
    }

    pub fn try_new(index: u32) -> Option<Self> {
        if (index as usize) < MCSC_OUTPUT_MAX {
            Some(OutputId(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All outputs in port order
    pub fn all() -> impl Iterator<Item = OutputId> {
        (0..MCSC_OUTPUT_MAX as u8).map(OutputId)
    }

    pub fn is_ds(self) -> bool {
        self == Self::DS
    }

    /// Outputs 3 and 4 have no post-chain stage
    pub fn supports_post_chain(self) -> bool {
        !matches!(self.0, 3 | 4)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OUT{}", self.0)
    }
}

bitflags! {
    /// Set of output ports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OutputMask: u8 {
        const OUT0 = 1 << 0;
        const OUT1 = 1 << 1;
        const OUT2 = 1 << 2;
        const OUT3 = 1 << 3;
        const OUT4 = 1 << 4;
        const OUT5 = 1 << 5;
    }
}

impl OutputMask {
    pub fn from_output(out: OutputId) -> Self {
        Self::from_bits_truncate(1 << out.0)
    }

    pub fn has(&self, out: OutputId) -> bool {
        self.contains(Self::from_output(out))
    }

    pub fn insert_output(&mut self, out: OutputId) {
        self.insert(Self::from_output(out));
    }

    pub fn remove_output(&mut self, out: OutputId) {
        self.remove(Self::from_output(out));
    }

    /// Outputs contained in the mask, in port order
    pub fn outputs(self) -> impl Iterator<Item = OutputId> {
        OutputId::all().filter(move |out| self.has(*out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_sibling() {
        assert_eq!(EngineId::Mcsc0.sibling(), EngineId::Mcsc1);
        assert_eq!(EngineId::Mcsc1.sibling(), EngineId::Mcsc0);
        assert_eq!(EngineId::from_index(2), None);
    }

    #[test]
    fn test_output_mask() {
        let mut mask = OutputMask::empty();
        mask.insert_output(OutputId::new(1));
        mask.insert_output(OutputId::DS);
        let outs: Vec<_> = mask.outputs().collect();
        assert_eq!(outs, vec![OutputId::new(1), OutputId::DS]);
        assert!(!OutputId::new(3).supports_post_chain());
        assert!(OutputId::new(2).supports_post_chain());
    }
}
