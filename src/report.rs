//! JSON test report, the bench's machine-readable results file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::DecimatorConfig;

pub const IP_NAME: &str = "pdm_pcm_decimator";
pub const IP_VERSION: &str = "1.4.1";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<i64>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub details: String,
}

impl TestResult {
    pub fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            actual: None,
            expected: None,
            details: String::new(),
        }
    }

    pub fn fail(name: &str, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            actual: None,
            expected: None,
            details: details.into(),
        }
    }

    pub fn with_values(mut self, actual: i64, expected: i64) -> Self {
        self.actual = Some(actual);
        self.expected = Some(expected);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestReport {
    pub ip_name: String,
    pub ip_version: String,
    pub config: DecimatorConfig,
    pub results: Vec<TestResult>,
    pub summary: TestSummary,
}

impl TestReport {
    pub fn new(config: DecimatorConfig, results: Vec<TestResult>) -> Self {
        let summary = TestSummary::from_results(&results);
        Self {
            ip_name: IP_NAME.to_string(),
            ip_version: IP_VERSION.to_string(),
            config,
            results,
            summary,
        }
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(path, text)
    }
}
