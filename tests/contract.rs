//! End-to-end checks of the decimator's streaming contract: duty-cycle
//! mapping at the extremes, output range, and scenario table conformance.

use rand::rngs::StdRng;
use rand::SeedableRng;

use pdm_pcm_vip::config::DecimatorConfig;
use pdm_pcm_vip::harness::Tester;
use pdm_pcm_vip::scenario::basic_scenarios;
use pdm_pcm_vip::stimulus::Pattern;
use pdm_pcm_vip::{pcm_from_ones, stimulus};

fn tester() -> Tester {
    Tester::new(DecimatorConfig::default()).unwrap()
}

fn run_window(tester: &mut Tester, bits: &[u8]) -> i64 {
    tester.reset();
    tester.send_bits(bits).unwrap();
    assert!(
        tester.wait_for_pcm(1000),
        "timeout waiting for pcm_valid after a full window"
    );
    tester.take_pcm().unwrap()
}

#[test]
fn reset_state_is_quiescent() {
    let mut t = tester();
    {
        let dut = t.dut();
        dut.reset_n = false;
        dut.pcm_ready = true;
    }
    t.steps(5);
    let dut = t.dut();
    assert!(!dut.busy, "busy must be low in reset");
    assert!(!dut.overflow, "overflow must be low in reset");
    assert!(!dut.underflow, "underflow must be low in reset");
    assert!(!dut.pdm_ready, "no input handshake while in reset");
    assert!(!dut.pcm_valid, "no output while in reset");
}

#[test]
fn input_handshake_restored_after_reset_and_enable() {
    let mut t = tester();
    t.reset();
    assert!(t.dut().pdm_ready, "pdm_ready must assert once enabled");
}

#[test]
fn all_zeros_window_hits_most_negative() {
    let mut t = tester();
    let pcm = run_window(&mut t, &stimulus::all_zeros(16));
    assert_eq!(pcm, -32768);
}

#[test]
fn all_ones_window_hits_most_positive() {
    let mut t = tester();
    let pcm = run_window(&mut t, &stimulus::all_ones(16));
    assert_eq!(pcm, 32767);
}

#[test]
fn alternating_window_lands_near_zero() {
    let mut t = tester();
    let pcm = run_window(&mut t, &stimulus::alternating(16));
    assert!(pcm.abs() <= 1024, "50% duty cycle gave {}", pcm);
    assert_eq!(pcm, pcm_from_ones(8, 16, 16));
}

#[test]
fn output_tracks_every_duty_cycle_exactly() {
    let mut t = tester();
    for ones in 0..=16u32 {
        let bits: Vec<u8> = (0..16).map(|i| u8::from(i < ones)).collect();
        let pcm = run_window(&mut t, &bits);
        assert_eq!(pcm, pcm_from_ones(ones, 16, 16), "ones={}", ones);
        assert!(pcm >= -32768 && pcm <= 32767, "ones={}", ones);
    }
}

#[test]
fn repeated_sine_approximation_stays_inside_rails() {
    let mut t = tester();
    let mut rng = StdRng::seed_from_u64(11);
    let ratio = t.config().decimation_ratio;
    let (min, max) = (t.config().pcm_min(), t.config().pcm_max());
    let bits = Pattern::HalfWindowSquare.generate(ratio, &mut rng);

    t.reset();
    for cycle in 0..5 {
        t.send_bits(&bits).unwrap();
        assert!(t.wait_for_pcm(1000), "cycle {}: no output", cycle);
        let pcm = t.take_pcm().unwrap();
        assert!(
            pcm > min && pcm < max,
            "cycle {}: output {} stuck at a rail",
            cycle,
            pcm
        );
    }
}

#[test]
fn every_tabled_scenario_passes() {
    let mut t = tester();
    let mut rng = StdRng::seed_from_u64(3);
    for scenario in basic_scenarios(t.config()) {
        let result = t.run_scenario(&scenario, &mut rng);
        assert!(result.passed, "{}: {}", scenario.name, result.details);
    }
    assert!(t.summary().all_passed());
}

#[test]
fn random_windows_match_reference_and_stay_in_range() {
    let mut t = tester();
    let mut rng = StdRng::seed_from_u64(99);
    let result = t.run_random_windows(20, &mut rng);
    assert!(result.passed, "{}", result.details);
}

#[test]
fn streaming_sustains_one_bit_per_cycle() {
    let mut t = tester();
    let mut rng = StdRng::seed_from_u64(5);
    let result = t.run_throughput(50, &mut rng);
    assert!(result.passed, "{}", result.details);
}

#[test]
fn contract_holds_for_wider_configuration() {
    let config = DecimatorConfig {
        data_width: 24,
        decimation_ratio: 32,
        cic_decimation: 16,
        halfband_decimation: 2,
        ..DecimatorConfig::default()
    };
    let mut t = Tester::new(config).unwrap();

    let max = run_window(&mut t, &stimulus::all_ones(32));
    assert_eq!(max, (1 << 23) - 1);
    let min = run_window(&mut t, &stimulus::all_zeros(32));
    assert_eq!(min, -(1 << 23));
}
