//! Setfile container
//!
//! A setfile carries one tuning table per sensor scenario. Tables are
//! selected through an index map so several scenarios can share a table.

use serde::{Deserialize, Serialize};

use mcsc_core::{McscError, Result};

use crate::cac::CacTuneset;
use crate::interp::NoiseFactors;
use crate::tdnr::TdnrTuneset;
use crate::uvsp::UvspTuneset;

/// Table layout version the engines understand
pub const MCSC_SETFILE_VERSION: u32 = 0x14027432;

/// Container format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetfileFormat {
    V2,
    #[default]
    V3,
}

/// YUV range conversion base values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YuvRangeBase {
    pub y_offset: u32,
    pub y_gain: u32,
    pub c_gain00: u32,
    pub c_gain01: u32,
    pub c_gain10: u32,
    pub c_gain11: u32,
}

/// YUV output clamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BchsClamp {
    pub y_max: u32,
    pub y_min: u32,
    pub c_max: u32,
    pub c_min: u32,
}

/// DJAG filter tuning for one scaling-ratio bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DjagTuning {
    pub dejagging_weight0: u32,
    pub dejagging_weight1: u32,
    pub hf_boost_weight: u32,
    pub center_hf_boost_weight: u32,
    pub diagonal_hf_boost_weight: u32,
    pub center_weighted_mean_weight: u32,
    pub thres_1x5_matching_sad: u32,
    pub thres_1x5_abshf: u32,
    pub thres_shooting_llcrr: u32,
    pub thres_shooting_lcr: u32,
    pub thres_shooting_neighbor: u32,
    pub thres_shooting_uucdd: u32,
    pub thres_shooting_ucd: u32,
    pub min_max_weight: u32,
}

/// Number of DJAG ratio buckets in a table
pub const DJAG_TUNING_BUCKETS: usize = 4;

/// One scenario's tuning table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McscSetfile {
    pub setfile_version: u32,
    /// Indexed by YUV range: full, narrow
    pub sc_base: [YuvRangeBase; 2],
    pub sc_bchs: Option<[BchsClamp; 2]>,
    pub djag: [DjagTuning; DJAG_TUNING_BUCKETS],
    pub tdnr: TdnrTuneset,
    pub cac: CacTuneset,
    pub uvsp: UvspTuneset,
}

/// A loaded setfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetfileBlob {
    pub format: SetfileFormat,
    /// Scenario to table index
    pub index: Vec<u32>,
    pub using_count: u32,
    pub tables: Vec<McscSetfile>,
}

impl SetfileBlob {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every table against the version this build expects
    pub fn validate(&self, expected: u32) -> Result<()> {
        if self.using_count as usize != self.tables.len() {
            tracing::warn!(
                "setfile: using_count {} but {} tables",
                self.using_count,
                self.tables.len()
            );
        }

        for (i, table) in self.tables.iter().enumerate() {
            if table.setfile_version != expected {
                return Err(McscError::SetfileVersionMismatch {
                    expected,
                    found: table.setfile_version,
                });
            }
            check_ni_order(i, "tdnr", &table.tdnr.ni_dep_factors)?;
            check_ni_order(i, "cac", &table.cac.ni_dep_factors)?;
            check_ni_order(i, "uvsp", &table.uvsp.ni_dep_factors)?;
        }
        Ok(())
    }

    /// Table for a sensor scenario
    pub fn table_for(&self, scenario: u32) -> Result<&McscSetfile> {
        let index = self.index.get(scenario as usize).copied().unwrap_or(scenario);
        if index >= self.using_count {
            return Err(McscError::InvalidSetfileIndex {
                index,
                using_count: self.using_count,
            });
        }
        self.tables
            .get(index as usize)
            .ok_or(McscError::InvalidSetfileIndex {
                index,
                using_count: self.using_count,
            })
    }
}

/// Reference points must be non-decreasing in noise index
fn check_ni_order<F: NoiseFactors>(table: usize, block: &str, factors: &[F]) -> Result<()> {
    for (i, pair) in factors.windows(2).enumerate() {
        let (prev, next) = (pair[0].noise_index(), pair[1].noise_index());
        if next < prev {
            return Err(McscError::Config(format!(
                "setfile table {} {} noise index {} at entry {} below {}",
                table,
                block,
                next,
                i + 1,
                prev
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cac::CacFactors;
    use crate::uvsp::UvspFactors;

    fn blob() -> SetfileBlob {
        let table = McscSetfile {
            setfile_version: MCSC_SETFILE_VERSION,
            ..Default::default()
        };
        SetfileBlob {
            format: SetfileFormat::V3,
            index: vec![0, 1, 1],
            using_count: 2,
            tables: vec![table.clone(), table],
        }
    }

    #[test]
    fn test_table_for() {
        let blob = blob();
        assert!(blob.table_for(2).is_ok());
        let mut bad = blob.clone();
        bad.index[1] = 5;
        assert!(matches!(
            bad.table_for(1),
            Err(McscError::InvalidSetfileIndex { index: 5, using_count: 2 })
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let mut blob = blob();
        assert!(blob.validate(MCSC_SETFILE_VERSION).is_ok());
        blob.tables[1].setfile_version = 1;
        assert!(matches!(
            blob.validate(MCSC_SETFILE_VERSION),
            Err(McscError::SetfileVersionMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_unsorted_noise_index_rejected() {
        let cac = |noise_index| CacFactors {
            noise_index,
            ..Default::default()
        };
        let mut blob = blob();
        blob.tables[0].cac.ni_dep_factors = vec![cac(1), cac(10), cac(10)];
        assert!(blob.validate(MCSC_SETFILE_VERSION).is_ok());

        blob.tables[1].cac.ni_dep_factors = vec![cac(10), cac(1)];
        let err = blob.validate(MCSC_SETFILE_VERSION).unwrap_err();
        assert!(matches!(err, McscError::Config(ref msg) if msg.contains("table 1 cac")));

        let uvsp = |noise_index| UvspFactors {
            noise_index,
            ..Default::default()
        };
        blob.tables[1].cac.ni_dep_factors.clear();
        blob.tables[0].uvsp.ni_dep_factors = vec![uvsp(5), uvsp(3)];
        assert!(matches!(blob.validate(MCSC_SETFILE_VERSION), Err(McscError::Config(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let blob = blob();
        let parsed = SetfileBlob::from_json(&blob.to_json().unwrap()).unwrap();
        assert_eq!(parsed, blob);
    }

    #[test]
    fn test_from_json_error() {
        assert!(matches!(SetfileBlob::from_json("{"), Err(McscError::Json(_))));
    }
}
