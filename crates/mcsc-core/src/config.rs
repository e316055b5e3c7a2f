//! Configuration for the scaler control core

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cap::McscCap;
use crate::error::{McscError, Result};
use crate::types::EngineId;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub scaler: ScalerConfig,
    pub pipeline: PipelineConfig,
    pub tdnr: TdnrConfig,
    pub capability: McscCap,
    pub debug: DebugConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: LogLevel,
}

/// Scaling limits and constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScalerConfig {
    /// Down-scale bound poly-phase handles at full quality
    pub quality_ratio_down: u32,
    /// Poly-phase up-scale bound
    pub poly_ratio_up: u32,
    /// Poly-phase hard down-scale bound
    pub poly_ratio_down: u32,
    /// Post-chain down-scale bound
    pub post_ratio_down: u32,
    /// Widest image the post-chain accepts
    pub post_max_width: u32,
    /// Align the poly output so the post ratio is an exact binary fraction
    pub post_wa_enabled: bool,
    /// Largest denominator exponent tried by the alignment search
    pub post_wa_shift: u32,
    /// DJAG upscale limit, in tenths
    pub djag_max_ratio_x10: u32,
    /// Largest image the scaler input accepts
    pub max_input_width: u32,
    pub max_input_height: u32,
    pub min_size: u32,
    pub max_size: u32,
}

/// Pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bound of the wait for the current frame to drain in disable()
    pub stop_timeout_ms: u64,
    /// Capacity of the frame event channel
    pub event_queue_capacity: usize,
}

/// TDNR internal buffers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TdnrConfig {
    pub buffer_width: u32,
    pub buffer_height: u32,
}

/// Debug overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Dump registers when an interrupt reports an error
    pub dump_on_error: bool,
    pub force_cac: Option<ForcedBlock>,
    pub force_uvsp: Option<ForcedBlock>,
}

/// Forced sub-block routing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForcedBlock {
    pub input: EngineId,
    pub enable: bool,
}

/// Log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by the env filter
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
        }
    }
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            quality_ratio_down: 4,
            poly_ratio_up: 8,
            poly_ratio_down: 16,
            post_ratio_down: 16,
            post_max_width: 1472,
            post_wa_enabled: true,
            post_wa_shift: 8,
            djag_max_ratio_x10: 25,
            max_input_width: 8192,
            max_input_height: 8192,
            min_size: 16,
            max_size: 8192,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stop_timeout_ms: 200,
            event_queue_capacity: 64,
        }
    }
}

impl Default for TdnrConfig {
    fn default() -> Self {
        Self {
            buffer_width: 4032,
            buffer_height: 3024,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            dump_on_error: true,
            force_cac: None,
            force_uvsp: None,
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::from_file(&path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| McscError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| McscError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mcsc")
            .join("config.toml")
    }

    /// Reject constants the scaling algorithm cannot work with
    pub fn validate(&self) -> Result<()> {
        let s = &self.scaler;
        if s.quality_ratio_down == 0 || s.poly_ratio_up == 0 || s.post_ratio_down == 0 {
            return Err(McscError::Config("scaler ratio bounds must be non-zero".into()));
        }
        if s.post_wa_shift > 16 {
            return Err(McscError::Config(format!(
                "post_wa_shift {} exceeds 16",
                s.post_wa_shift
            )));
        }
        if s.min_size > s.max_size {
            return Err(McscError::Config("min_size above max_size".into()));
        }
        if self.pipeline.event_queue_capacity == 0 {
            return Err(McscError::Config("event queue capacity must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scaler.quality_ratio_down, 4);
        assert_eq!(config.scaler.post_max_width, 1472);
        assert_eq!(config.pipeline.stop_timeout_ms, 200);
        assert!(config.capability.enable_shared_output);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.debug.force_cac = Some(ForcedBlock {
            input: EngineId::Mcsc1,
            enable: false,
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scaler, config.scaler);
        assert_eq!(parsed.debug.force_cac, config.debug.force_cac);
    }

    #[test]
    fn test_partial_config() {
        let parsed: Config = toml::from_str("[scaler]\npost_max_width = 2048\n").unwrap();
        assert_eq!(parsed.scaler.post_max_width, 2048);
        assert_eq!(parsed.scaler.poly_ratio_up, 8);
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = Config::default();
        config.scaler.quality_ratio_down = 0;
        assert!(matches!(config.validate(), Err(McscError::Config(_))));
    }
}
