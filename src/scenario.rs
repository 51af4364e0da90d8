//! The scenario tables. One copy; the pass ranges are derived from the
//! configured data width and decimation ratio instead of being written out by
//! hand for every variant.

use serde::{Deserialize, Serialize};

use crate::config::DecimatorConfig;
use crate::pcm_from_ones;
use crate::stimulus::Pattern;

/// Pass window of 1/64 full scale around the expected value.
fn tolerance(config: &DecimatorConfig) -> i64 {
    ((1i64 << config.data_width) - 1) / 64
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub pattern: Pattern,
    pub expected_duty_cycle: f64,
    /// Inclusive PCM pass range.
    pub expected_pcm_range: (i64, i64),
}

fn scenario(
    config: &DecimatorConfig,
    name: &str,
    description: &str,
    pattern: Pattern,
    ones: u32,
) -> Scenario {
    let ratio = config.decimation_ratio;
    let expected = pcm_from_ones(ones, ratio, config.data_width);
    let tol = tolerance(config);
    Scenario {
        name: name.to_string(),
        description: description.to_string(),
        pattern,
        expected_duty_cycle: ones as f64 / ratio as f64,
        expected_pcm_range: (
            (expected - tol).max(config.pcm_min()),
            (expected + tol).min(config.pcm_max()),
        ),
    }
}

pub fn basic_scenarios(config: &DecimatorConfig) -> Vec<Scenario> {
    let r = config.decimation_ratio;
    vec![
        scenario(config, "all_zeros", "All zeros PDM pattern", Pattern::AllZeros, 0),
        scenario(config, "all_ones", "All ones PDM pattern", Pattern::AllOnes, r),
        scenario(
            config,
            "alternating",
            "Alternating PDM pattern",
            Pattern::Alternating,
            r / 2,
        ),
        scenario(
            config,
            "quarter_ones",
            "25% ones PDM pattern",
            Pattern::DutyCycle { num: 1, den: 4 },
            r / 4,
        ),
        scenario(
            config,
            "three_quarter_ones",
            "75% ones PDM pattern",
            Pattern::DutyCycle { num: 3, den: 4 },
            3 * r / 4,
        ),
        scenario(
            config,
            "sine_approximation",
            "Half-window square sine approximation",
            Pattern::HalfWindowSquare,
            r / 2,
        ),
    ]
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ErrorKind {
    /// Hold output-ready low for a few windows; the FIFO must absorb them.
    Backpressure { windows: u32 },
    /// Hold output-ready low past the FIFO depth.
    Overflow { windows: u32 },
    /// Read with nothing pending.
    Underflow { idle_cycles: u32 },
    /// Drop enable mid-window, then resume.
    DisableRecovery { disable_cycles: u32 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorScenario {
    pub name: String,
    pub description: String,
    pub kind: ErrorKind,
    pub expected_overflow: bool,
    pub expected_underflow: bool,
}

pub fn error_scenarios(config: &DecimatorConfig) -> Vec<ErrorScenario> {
    vec![
        ErrorScenario {
            name: "backpressure".to_string(),
            description: "Backpressure handling test".to_string(),
            kind: ErrorKind::Backpressure { windows: 3 },
            expected_overflow: false,
            expected_underflow: false,
        },
        ErrorScenario {
            name: "overflow".to_string(),
            description: "FIFO overflow test".to_string(),
            kind: ErrorKind::Overflow {
                windows: config.fifo_depth + 2,
            },
            expected_overflow: true,
            expected_underflow: false,
        },
        ErrorScenario {
            name: "underflow".to_string(),
            description: "FIFO underflow test".to_string(),
            kind: ErrorKind::Underflow { idle_cycles: 20 },
            expected_overflow: false,
            expected_underflow: true,
        },
        ErrorScenario {
            name: "disable_during_operation".to_string(),
            description: "Disable module during operation".to_string(),
            kind: ErrorKind::DisableRecovery { disable_cycles: 10 },
            expected_overflow: false,
            expected_underflow: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_table_covers_duty_cycle_extremes() {
        let cfg = DecimatorConfig::default();
        let table = basic_scenarios(&cfg);
        assert_eq!(table.len(), 6);
        assert!(table.iter().any(|s| s.pattern == Pattern::HalfWindowSquare));

        let all_zeros = &table[0];
        assert_eq!(all_zeros.expected_pcm_range.0, cfg.pcm_min());
        let all_ones = &table[1];
        assert_eq!(all_ones.expected_pcm_range.1, cfg.pcm_max());

        let alternating = &table[2];
        assert!(alternating.expected_pcm_range.0 < 0 && alternating.expected_pcm_range.1 > 0);
    }

    #[test]
    fn ranges_stay_inside_representable_values() {
        let cfg = DecimatorConfig::default();
        for s in basic_scenarios(&cfg) {
            let (lo, hi) = s.expected_pcm_range;
            assert!(lo <= hi, "{}", s.name);
            assert!(lo >= cfg.pcm_min() && hi <= cfg.pcm_max(), "{}", s.name);
        }
    }

    #[test]
    fn overflow_scenario_exceeds_fifo_depth() {
        let cfg = DecimatorConfig::default();
        let table = error_scenarios(&cfg);
        let overflow = table.iter().find(|s| s.name == "overflow").unwrap();
        match overflow.kind {
            ErrorKind::Overflow { windows } => assert!(windows > cfg.fifo_depth),
            _ => panic!("wrong kind"),
        }
    }
}
