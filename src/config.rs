use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parameter ranges the decimator IP is specified for.
pub const DATA_WIDTH_RANGE: (u32, u32) = (8, 32);
pub const DECIMATION_RATIO_RANGE: (u32, u32) = (2, 48);
pub const FIFO_DEPTH_RANGE: (u32, u32) = (8, 64);
pub const CIC_STAGES_RANGE: (u32, u32) = (1, 8);
pub const FIR_TAPS_RANGE: (u32, u32) = (16, 128);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error(
        "decimation_ratio {ratio} != cic_decimation {cic} * halfband_decimation {halfband}"
    )]
    StageMismatch { ratio: u32, cic: u32, halfband: u32 },
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parameters of the decimator under test plus the knobs of the harness.
///
/// One object for everything; earlier revisions of this bench kept several
/// near-identical copies of these values and they always had to agree anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimatorConfig {
    /// PCM output word width in bits.
    pub data_width: u32,
    /// PDM bits consumed per PCM output word.
    pub decimation_ratio: u32,
    pub cic_stages: u32,
    pub cic_decimation: u32,
    pub halfband_decimation: u32,
    pub fir_taps: u32,
    pub fifo_depth: u32,
    pub clock_period_ns: u32,
    /// Cycle budget for every handshake or output wait.
    pub timeout_cycles: u32,
    pub num_random_tests: u32,
}

impl Default for DecimatorConfig {
    fn default() -> Self {
        Self {
            data_width: 16,
            decimation_ratio: 16,
            cic_stages: 4,
            cic_decimation: 8,
            halfband_decimation: 2,
            fir_taps: 64,
            fifo_depth: 16,
            clock_period_ns: 10,
            timeout_cycles: 1000,
            num_random_tests: 10,
        }
    }
}

fn check_range(name: &'static str, value: u32, range: (u32, u32)) -> Result<(), ConfigError> {
    let (min, max) = range;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { name, value, min, max });
    }
    Ok(())
}

impl DecimatorConfig {
    /// Load from a JSON file; absent fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Environment overrides for the harness knobs (`PDM_VIP_TIMEOUT_CYCLES`,
    /// `PDM_VIP_RANDOM_TESTS`). Device parameters come from the config file
    /// only, so a stray environment cannot change what is being verified.
    pub fn apply_env(mut self) -> Self {
        if let Some(v) = env_u32("PDM_VIP_TIMEOUT_CYCLES") {
            self.timeout_cycles = v;
        }
        if let Some(v) = env_u32("PDM_VIP_RANDOM_TESTS") {
            self.num_random_tests = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("data_width", self.data_width, DATA_WIDTH_RANGE)?;
        check_range("decimation_ratio", self.decimation_ratio, DECIMATION_RATIO_RANGE)?;
        check_range("fifo_depth", self.fifo_depth, FIFO_DEPTH_RANGE)?;
        check_range("cic_stages", self.cic_stages, CIC_STAGES_RANGE)?;
        check_range("fir_taps", self.fir_taps, FIR_TAPS_RANGE)?;
        if self.cic_decimation * self.halfband_decimation != self.decimation_ratio {
            return Err(ConfigError::StageMismatch {
                ratio: self.decimation_ratio,
                cic: self.cic_decimation,
                halfband: self.halfband_decimation,
            });
        }
        Ok(())
    }

    pub fn pcm_min(&self) -> i64 {
        crate::pcm_min(self.data_width)
    }

    pub fn pcm_max(&self) -> i64 {
        crate::pcm_max(self.data_width)
    }

    pub fn clock_frequency_mhz(&self) -> f64 {
        1000.0 / self.clock_period_ns as f64
    }
}

fn env_u32(name: &str) -> Option<u32> {
    match std::env::var(name) {
        Ok(v) => match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                log::warn!("ignoring {}={:?}: not a number", name, v);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DecimatorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_width() {
        let mut cfg = DecimatorConfig::default();
        cfg.data_width = 64;
        match cfg.validate() {
            Err(ConfigError::OutOfRange { name, .. }) => assert_eq!(name, "data_width"),
            other => panic!("expected OutOfRange, got {:?}", other.err()),
        }
    }

    #[test]
    fn rejects_inconsistent_stage_decimations() {
        let mut cfg = DecimatorConfig::default();
        cfg.cic_decimation = 4; // 4 * 2 != 16
        assert!(matches!(cfg.validate(), Err(ConfigError::StageMismatch { .. })));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: DecimatorConfig = serde_json::from_str(r#"{"decimation_ratio": 32}"#).unwrap();
        assert_eq!(cfg.decimation_ratio, 32);
        assert_eq!(cfg.data_width, 16);
        assert_eq!(cfg.fifo_depth, 16);
    }

    #[test]
    fn signed_range_helpers() {
        let cfg = DecimatorConfig::default();
        assert_eq!(cfg.pcm_min(), -32768);
        assert_eq!(cfg.pcm_max(), 32767);
    }
}
