//! Chromatic aberration correction (CAC) tuning

use serde::{Deserialize, Serialize};

use mcsc_core::EngineId;

use crate::interp::{resolve, Lerp, NiCache, NoiseFactors};

/// Spot detection thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacMapThr {
    pub spot_thr_l: u32,
    pub spot_thr_h: u32,
    pub spot_thr: u32,
    pub spot_nr_strength: u32,
}

/// Color correction thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacCrtThr {
    pub crt_color_thr_l_dot: u32,
    pub crt_color_thr_l_line: u32,
    pub crt_color_thr_h: u32,
}

/// One CAC reference point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacFactors {
    pub noise_index: u32,
    pub map_thr: CacMapThr,
    pub crt_thr: CacCrtThr,
}

/// Register-ready CAC thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacConfig {
    pub map_thr: CacMapThr,
    pub crt_thr: CacCrtThr,
}

impl NoiseFactors for CacFactors {
    type Output = CacConfig;

    fn noise_index(&self) -> u32 {
        self.noise_index
    }

    fn interpolate(b: &Self, t: &Self, lerp: &Lerp) -> CacConfig {
        CacConfig {
            map_thr: CacMapThr {
                spot_thr_l: lerp.value_u32(b.map_thr.spot_thr_l, t.map_thr.spot_thr_l),
                spot_thr_h: lerp.value_u32(b.map_thr.spot_thr_h, t.map_thr.spot_thr_h),
                spot_thr: lerp.value_u32(b.map_thr.spot_thr, t.map_thr.spot_thr),
                spot_nr_strength: lerp
                    .value_u32(b.map_thr.spot_nr_strength, t.map_thr.spot_nr_strength),
            },
            crt_thr: CacCrtThr {
                crt_color_thr_l_dot: lerp
                    .value_u32(b.crt_thr.crt_color_thr_l_dot, t.crt_thr.crt_color_thr_l_dot),
                crt_color_thr_l_line: lerp
                    .value_u32(b.crt_thr.crt_color_thr_l_line, t.crt_thr.crt_color_thr_l_line),
                crt_color_thr_h: lerp.value_u32(b.crt_thr.crt_color_thr_h, t.crt_thr.crt_color_thr_h),
            },
        }
    }
}

/// CAC section of a setfile table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacTuneset {
    pub cac_enable: bool,
    pub ni_dep_factors: Vec<CacFactors>,
}

/// Engine that feeds the CAC block: the video path in video mode, the
/// capture path otherwise.
pub fn input_source(video_mode: bool) -> EngineId {
    if video_mode {
        EngineId::Mcsc0
    } else {
        EngineId::Mcsc1
    }
}

/// Per-engine CAC state
#[derive(Debug, Clone, Default)]
pub struct CacTuner {
    cache: NiCache,
}

impl CacTuner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Thresholds to write for `ni`, or `None` when nothing changed
    pub fn tune(&mut self, tuneset: &CacTuneset, ni: u32) -> Option<CacConfig> {
        if !self.cache.is_stale(ni) {
            return None;
        }
        let config = resolve(&tuneset.ni_dep_factors, ni)?;
        self.cache.commit(ni);
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ni: u32, v: u32) -> CacFactors {
        CacFactors {
            noise_index: ni,
            map_thr: CacMapThr {
                spot_thr_l: v,
                spot_thr_h: v * 2,
                spot_thr: v * 3,
                spot_nr_strength: v,
            },
            crt_thr: CacCrtThr {
                crt_color_thr_l_dot: v,
                crt_color_thr_l_line: v,
                crt_color_thr_h: v * 4,
            },
        }
    }

    #[test]
    fn test_input_source() {
        assert_eq!(input_source(true), EngineId::Mcsc0);
        assert_eq!(input_source(false), EngineId::Mcsc1);
    }

    #[test]
    fn test_tune_interpolates_and_caches() {
        let tuneset = CacTuneset {
            cac_enable: true,
            ni_dep_factors: vec![entry(10, 100), entry(30, 300)],
        };
        let mut tuner = CacTuner::new();

        let cfg = tuner.tune(&tuneset, 200).unwrap();
        assert_eq!(cfg.map_thr.spot_thr_l, 200);
        assert_eq!(cfg.crt_thr.crt_color_thr_h, 800);
        assert_eq!(tuner.tune(&tuneset, 200), None);

        let cfg = tuner.tune(&tuneset, 5000).unwrap();
        assert_eq!(cfg.map_thr.spot_thr_l, 300);
    }

    #[test]
    fn test_empty_table() {
        let mut tuner = CacTuner::new();
        assert_eq!(tuner.tune(&CacTuneset::default(), 100), None);
    }
}
