//! Stimulus/checker harness. Drives the decimator model one clock edge at a
//! time through the same request/await-ready loops the RTL bench uses: every
//! wait is bounded by the configured cycle budget, every scenario starts from
//! reset, and failures are reported as plain pass/fail results.

use rand::Rng;
use thiserror::Error;

use crate::config::{ConfigError, DecimatorConfig};
use crate::decimator::Decimator;
use crate::report::{TestResult, TestSummary};
use crate::scenario::{ErrorKind, ErrorScenario, Scenario};
use crate::stimulus;
use crate::trace::TraceRecorder;
use crate::pcm_from_ones;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("timeout after {cycles} cycles waiting for {what}")]
    Timeout { what: &'static str, cycles: u32 },
}

pub struct Tester {
    config: DecimatorConfig,
    dut: Decimator,
    results: Vec<TestResult>,
    trace: Option<TraceRecorder>,
}

impl Tester {
    pub fn new(config: DecimatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dut = Decimator::new(&config);
        Ok(Self {
            config,
            dut,
            results: Vec::new(),
            trace: None,
        })
    }

    pub fn config(&self) -> &DecimatorConfig {
        &self.config
    }

    pub fn dut(&mut self) -> &mut Decimator {
        &mut self.dut
    }

    pub fn attach_trace(&mut self, trace: TraceRecorder) {
        self.trace = Some(trace);
    }

    pub fn take_trace(&mut self) -> Option<TraceRecorder> {
        self.trace.take()
    }

    /// One rising clock edge.
    pub fn step(&mut self) {
        self.dut.posedge();
        if let Some(trace) = self.trace.as_mut() {
            trace.sample(&self.dut);
        }
    }

    pub fn steps(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Hold reset for 10 cycles, release, settle, then enable the module.
    /// Every scenario starts here; tests are independent by construction.
    /// `pcm_ready` is left deasserted so the sticky status flags stay clear
    /// until a scenario drives the output handshake on purpose.
    pub fn reset(&mut self) {
        self.dut.reset_n = false;
        self.dut.enable = false;
        self.dut.pdm_valid = false;
        self.dut.pdm_data = 0;
        self.dut.pcm_ready = false;
        self.steps(10);
        self.dut.reset_n = true;
        self.steps(5);
        self.dut.enable = true;
        self.steps(2);
    }

    fn wait_ready(&mut self) -> Result<(), HarnessError> {
        let budget = self.config.timeout_cycles;
        for _ in 0..budget {
            if self.dut.pdm_ready {
                return Ok(());
            }
            self.step();
        }
        Err(HarnessError::Timeout {
            what: "pdm_ready",
            cycles: budget,
        })
    }

    /// Drive bits strictly in sequence, one per accepted clock edge.
    pub fn send_bits(&mut self, bits: &[u8]) -> Result<(), HarnessError> {
        for &bit in bits {
            self.dut.pdm_data = bit & 1;
            self.dut.pdm_valid = true;
            self.wait_ready()?;
            self.step();
        }
        self.dut.pdm_valid = false;
        Ok(())
    }

    /// Step until `pcm_valid` asserts or the cycle budget runs out.
    pub fn wait_for_pcm(&mut self, timeout_cycles: u32) -> bool {
        for _ in 0..timeout_cycles {
            if self.dut.pcm_valid {
                return true;
            }
            self.step();
        }
        self.dut.pcm_valid
    }

    /// Consume one output word through the ready/valid handshake.
    pub fn take_pcm(&mut self) -> Option<i64> {
        if !self.dut.pcm_valid {
            return None;
        }
        let word = self.dut.pcm_data;
        let prev_ready = self.dut.pcm_ready;
        self.dut.pcm_ready = true;
        self.step();
        self.dut.pcm_ready = prev_ready;
        Some(word)
    }

    /// Checker-side reference value for a window of bits.
    pub fn expected_pcm(&self, bits: &[u8]) -> i64 {
        pcm_from_ones(
            stimulus::ones_count(bits),
            self.config.decimation_ratio,
            self.config.data_width,
        )
    }

    fn record(&mut self, result: TestResult) -> TestResult {
        if result.passed {
            log::info!("PASS: {}", result.name);
        } else {
            match (result.actual, result.expected) {
                (Some(actual), Some(expected)) => log::error!(
                    "FAIL: {} - Actual: {}, Expected: {} ({})",
                    result.name,
                    actual,
                    expected,
                    result.details
                ),
                _ => log::error!("FAIL: {} - {}", result.name, result.details),
            }
        }
        self.results.push(result.clone());
        result
    }

    /// Run one pattern scenario: reset, drive a full window, check the output
    /// word exactly against the duty-cycle mapping and against the tabled
    /// pass range.
    pub fn run_scenario<R: Rng>(&mut self, scenario: &Scenario, rng: &mut R) -> TestResult {
        self.reset();
        let bits = scenario
            .pattern
            .generate(self.config.decimation_ratio, rng);

        if let Err(e) = self.send_bits(&bits) {
            return self.record(TestResult::fail(&scenario.name, e.to_string()));
        }
        if !self.wait_for_pcm(self.config.timeout_cycles) {
            return self.record(TestResult::fail(&scenario.name, "timeout waiting for pcm_valid"));
        }

        let actual = self.take_pcm().expect("pcm_valid was asserted");
        let expected = self.expected_pcm(&bits);
        let (lo, hi) = scenario.expected_pcm_range;

        let result = if actual != expected {
            TestResult::fail(&scenario.name, "output mismatch").with_values(actual, expected)
        } else if actual < lo || actual > hi {
            TestResult::fail(
                &scenario.name,
                format!("output {} outside pass range {}..={}", actual, lo, hi),
            )
            .with_values(actual, expected)
        } else {
            TestResult::pass(&scenario.name).with_values(actual, expected)
        };
        self.record(result)
    }

    /// Drive `count` random windows back to back, checking each output word.
    pub fn run_random_windows<R: Rng>(&mut self, count: u32, rng: &mut R) -> TestResult {
        self.reset();
        for i in 0..count {
            let bits = stimulus::random(self.config.decimation_ratio, rng);
            if let Err(e) = self.send_bits(&bits) {
                return self.record(TestResult::fail(
                    "random_patterns",
                    format!("window {}: {}", i, e),
                ));
            }
            if !self.wait_for_pcm(self.config.timeout_cycles) {
                return self.record(TestResult::fail(
                    "random_patterns",
                    format!("window {}: timeout waiting for pcm_valid", i),
                ));
            }
            let actual = self.take_pcm().expect("pcm_valid was asserted");
            let expected = self.expected_pcm(&bits);
            if actual != expected {
                return self.record(
                    TestResult::fail("random_patterns", format!("window {}: output mismatch", i))
                        .with_values(actual, expected),
                );
            }
            if actual < self.config.pcm_min() || actual > self.config.pcm_max() {
                return self.record(TestResult::fail(
                    "random_patterns",
                    format!("window {}: output {} out of representable range", i, actual),
                ));
            }
        }
        self.record(TestResult::pass("random_patterns"))
    }

    /// Stream `count` windows with the consumer always ready and check the
    /// cycle cost: the input handshake must sustain one bit per cycle within
    /// a small settling allowance per window.
    pub fn run_throughput<R: Rng>(&mut self, count: u32, rng: &mut R) -> TestResult {
        self.reset();
        let start = self.dut.cycle();
        for i in 0..count {
            let bits = stimulus::random(self.config.decimation_ratio, rng);
            if let Err(e) = self.send_bits(&bits) {
                return self.record(TestResult::fail(
                    "throughput",
                    format!("window {}: {}", i, e),
                ));
            }
            if !self.wait_for_pcm(self.config.timeout_cycles) {
                return self.record(TestResult::fail(
                    "throughput",
                    format!("window {}: timeout waiting for pcm_valid", i),
                ));
            }
            self.take_pcm();
        }
        let cycles = self.dut.cycle() - start;
        let budget = count as u64 * (self.config.decimation_ratio as u64 + 8);
        let result = if cycles <= budget {
            TestResult {
                details: format!("{} windows in {} cycles", count, cycles),
                ..TestResult::pass("throughput")
            }
        } else {
            TestResult::fail(
                "throughput",
                format!("{} windows took {} cycles, budget {}", count, cycles, budget),
            )
        };
        self.record(result)
    }

    pub fn run_error_scenario(&mut self, scenario: &ErrorScenario) -> TestResult {
        let result = match scenario.kind {
            ErrorKind::Backpressure { windows } => self.drive_backpressure(scenario, windows),
            ErrorKind::Overflow { windows } => self.drive_overflow(scenario, windows),
            ErrorKind::Underflow { idle_cycles } => self.drive_underflow(scenario, idle_cycles),
            ErrorKind::DisableRecovery { disable_cycles } => {
                self.drive_disable_recovery(scenario, disable_cycles)
            }
        };
        self.record(result)
    }

    fn drive_backpressure(&mut self, scenario: &ErrorScenario, windows: u32) -> TestResult {
        self.reset();
        self.dut.pcm_ready = false;
        for i in 0..windows {
            let bits = stimulus::alternating(self.config.decimation_ratio);
            if let Err(e) = self.send_bits(&bits) {
                return TestResult::fail(&scenario.name, format!("window {}: {}", i, e));
            }
            self.steps(5);
        }
        if self.dut.overflow != scenario.expected_overflow {
            return TestResult::fail(
                &scenario.name,
                format!(
                    "overflow flag {} after {} buffered windows",
                    self.dut.overflow, windows
                ),
            );
        }
        if self.dut.fifo_level() != windows as usize {
            return TestResult::fail(
                &scenario.name,
                format!("expected {} buffered words, found {}", windows, self.dut.fifo_level()),
            );
        }
        if self.dut.underflow != scenario.expected_underflow {
            return TestResult::fail(
                &scenario.name,
                format!("underflow flag {} with consumer stalled", self.dut.underflow),
            );
        }
        TestResult::pass(&scenario.name)
    }

    fn drive_overflow(&mut self, scenario: &ErrorScenario, windows: u32) -> TestResult {
        self.reset();
        self.dut.pcm_ready = false;
        for i in 0..windows {
            let bits = stimulus::all_ones(self.config.decimation_ratio);
            if let Err(e) = self.send_bits(&bits) {
                return TestResult::fail(&scenario.name, format!("window {}: {}", i, e));
            }
            self.steps(2);
        }
        if self.dut.overflow != scenario.expected_overflow {
            return TestResult::fail(
                &scenario.name,
                format!("overflow flag {} past fifo depth", self.dut.overflow),
            );
        }
        // Overflow is informational: everything accepted before the flag must
        // drain back out intact.
        let expected = self.config.pcm_max();
        for i in 0..self.config.fifo_depth {
            if !self.wait_for_pcm(self.config.timeout_cycles) {
                return TestResult::fail(&scenario.name, format!("drain {}: no pcm_valid", i));
            }
            match self.take_pcm() {
                Some(word) if word == expected => {}
                Some(word) => {
                    return TestResult::fail(&scenario.name, format!("drain {}: corrupted word", i))
                        .with_values(word, expected)
                }
                None => return TestResult::fail(&scenario.name, format!("drain {}: no word", i)),
            }
        }
        if self.dut.underflow != scenario.expected_underflow {
            return TestResult::fail(
                &scenario.name,
                format!("underflow flag {} after draining valid words only", self.dut.underflow),
            );
        }
        TestResult::pass(&scenario.name)
    }

    fn drive_underflow(&mut self, scenario: &ErrorScenario, idle_cycles: u32) -> TestResult {
        self.reset();
        if self.dut.underflow {
            return TestResult::fail(&scenario.name, "underflow latched before any read");
        }
        self.dut.pcm_ready = true;
        self.steps(idle_cycles);
        if self.dut.underflow != scenario.expected_underflow {
            return TestResult::fail(
                &scenario.name,
                format!("underflow flag {} after reading empty fifo", self.dut.underflow),
            );
        }
        if self.dut.overflow != scenario.expected_overflow {
            return TestResult::fail(
                &scenario.name,
                format!("overflow flag {} on an empty fifo", self.dut.overflow),
            );
        }
        TestResult::pass(&scenario.name)
    }

    fn drive_disable_recovery(&mut self, scenario: &ErrorScenario, disable_cycles: u32) -> TestResult {
        self.reset();
        let ratio = self.config.decimation_ratio;
        let bits = stimulus::all_ones(ratio);
        let half = (ratio / 2) as usize;

        if let Err(e) = self.send_bits(&bits[..half]) {
            return TestResult::fail(&scenario.name, format!("first half: {}", e));
        }

        self.dut.enable = false;
        self.steps(disable_cycles);
        self.dut.enable = true;

        // Handshake must come back within a handful of cycles
        let mut recovered = false;
        for _ in 0..4 {
            self.step();
            if self.dut.pdm_ready {
                recovered = true;
                break;
            }
        }
        if !recovered {
            return TestResult::fail(&scenario.name, "pdm_ready not restored after re-enable");
        }

        if let Err(e) = self.send_bits(&bits[half..]) {
            return TestResult::fail(&scenario.name, format!("second half: {}", e));
        }
        if !self.wait_for_pcm(self.config.timeout_cycles) {
            return TestResult::fail(&scenario.name, "no output after resuming the window");
        }
        let actual = self.take_pcm().expect("pcm_valid was asserted");
        let expected = self.expected_pcm(&bits);
        if actual != expected {
            return TestResult::fail(&scenario.name, "window corrupted across disable")
                .with_values(actual, expected);
        }
        if self.dut.overflow != scenario.expected_overflow
            || self.dut.underflow != scenario.expected_underflow
        {
            return TestResult::fail(
                &scenario.name,
                format!(
                    "status flags after recovery: overflow={} underflow={}",
                    self.dut.overflow, self.dut.underflow
                ),
            );
        }
        TestResult::pass(&scenario.name)
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TestResult> {
        self.results
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary::from_results(&self.results)
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        let bar = "=".repeat(60);
        log::info!("{}", bar);
        log::info!("TEST SUMMARY");
        log::info!("{}", bar);
        log::info!("Total Tests: {}", summary.total);
        log::info!("Passed: {}", summary.passed);
        log::info!("Failed: {}", summary.failed);
        log::info!("Success Rate: {:.1}%", summary.success_rate());
        log::info!("{}", bar);
    }
}
