//! Engine capability descriptor

use serde::{Deserialize, Serialize};

use crate::types::{OutputId, MCSC_OUTPUT_MAX};

/// Static description of what an engine supports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct McscCap {
    /// Packed major.minor.patch.rev version
    pub hw_ver: u32,
    pub max_output: u32,
    pub max_djag: u32,
    pub max_cac: u32,
    pub max_uvsp: u32,
    pub in_otf: bool,
    pub in_dma: bool,
    pub out_otf: [bool; MCSC_OUTPUT_MAX],
    pub out_dma: [bool; MCSC_OUTPUT_MAX],
    pub out_hwfc: [bool; MCSC_OUTPUT_MAX],
    pub hwfc: bool,
    pub enable_shared_output: bool,
    pub tdnr: bool,
    pub djag: bool,
    pub cac: bool,
    pub uvsp: bool,
    pub ds_vra: bool,
    pub ysum: bool,
}

/// Pack a hardware version the way the version register reports it
pub const fn hw_version(major: u32, minor: u32, patch: u32, rev: u32) -> u32 {
    (major << 24) | (minor << 16) | (patch << 8) | rev
}

impl Default for McscCap {
    fn default() -> Self {
        Self {
            hw_ver: hw_version(5, 0, 0, 0),
            max_output: MCSC_OUTPUT_MAX as u32,
            max_djag: 1,
            max_cac: 1,
            max_uvsp: 2,
            in_otf: true,
            in_dma: true,
            out_otf: [false; MCSC_OUTPUT_MAX],
            out_dma: [true; MCSC_OUTPUT_MAX],
            out_hwfc: [false, false, false, true, true, false],
            hwfc: true,
            enable_shared_output: true,
            tdnr: true,
            djag: true,
            cac: true,
            uvsp: true,
            ds_vra: true,
            ysum: true,
        }
    }
}

impl McscCap {
    pub fn has_out_dma(&self, out: OutputId) -> bool {
        self.out_dma[out.index()]
    }

    pub fn has_out_otf(&self, out: OutputId) -> bool {
        self.out_otf[out.index()]
    }

    pub fn has_out_hwfc(&self, out: OutputId) -> bool {
        self.out_hwfc[out.index()]
    }

    /// Outputs this engine exposes
    pub fn outputs(&self) -> impl Iterator<Item = OutputId> {
        let max = self.max_output.min(MCSC_OUTPUT_MAX as u32) as usize;
        OutputId::all().take(max)
    }

    pub fn version_string(&self) -> String {
        format!(
            "v{}.{}.{}.{}",
            self.hw_ver >> 24,
            (self.hw_ver >> 16) & 0xff,
            (self.hw_ver >> 8) & 0xff,
            self.hw_ver & 0xff
        )
    }

    /// Log the descriptor at open time
    pub fn log_summary(&self, name: &str) {
        tracing::info!(
            "{name}: hw {} max_output {} in otf/dma {}/{} hwfc {} tdnr {} djag {} cac {} uvsp {} ds_vra {} ysum {} shared {}",
            self.version_string(),
            self.max_output,
            self.in_otf,
            self.in_dma,
            self.hwfc,
            self.tdnr,
            self.djag,
            self.cac,
            self.uvsp,
            self.ds_vra,
            self.ysum,
            self.enable_shared_output
        );
        for out in self.outputs() {
            tracing::info!(
                "{name}: {out} otf {} dma {} hwfc {}",
                self.has_out_otf(out),
                self.has_out_dma(out),
                self.has_out_hwfc(out)
            );
        }
    }
}
