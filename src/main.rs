//! Scenario runner for the PDM to PCM decimator bench. Runs the full
//! scenario tables against the behavioral model, prints a summary, and can
//! write a JSON report and a VCD trace.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pdm_pcm_vip::config::DecimatorConfig;
use pdm_pcm_vip::harness::Tester;
use pdm_pcm_vip::report::TestReport;
use pdm_pcm_vip::scenario::{basic_scenarios, error_scenarios};
use pdm_pcm_vip::trace::TraceRecorder;

#[derive(Parser, Debug)]
#[command(name = "pdm-vip-run", about = "PDM to PCM decimator verification runner")]
struct Args {
    /// JSON config file; defaults apply for absent fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON test report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a VCD trace here (also honors PDM_VIP_WAVES).
    #[arg(long)]
    waves: Option<PathBuf>,

    /// Seed for random stimulus.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// List the scenario tables and exit.
    #[arg(long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DecimatorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DecimatorConfig::default(),
    }
    .apply_env();
    config.validate().context("invalid configuration")?;

    log::info!(
        "{} v{}: width={} ratio={} fifo_depth={} clock={:.1}MHz",
        pdm_pcm_vip::report::IP_NAME,
        pdm_pcm_vip::report::IP_VERSION,
        config.data_width,
        config.decimation_ratio,
        config.fifo_depth,
        config.clock_frequency_mhz(),
    );

    let basic = basic_scenarios(&config);
    let errors = error_scenarios(&config);

    if args.list {
        for s in &basic {
            println!("{:24} {}", s.name, s.description);
        }
        for s in &errors {
            println!("{:24} {}", s.name, s.description);
        }
        return Ok(());
    }

    let waves = args.waves.clone().or_else(|| {
        std::env::var_os("PDM_VIP_WAVES").map(PathBuf::from)
    });

    let mut tester = Tester::new(config.clone())?;
    if waves.is_some() {
        tester.attach_trace(TraceRecorder::new());
    }
    let mut rng = StdRng::seed_from_u64(args.seed);

    for scenario in &basic {
        tester.run_scenario(scenario, &mut rng);
    }
    tester.run_random_windows(config.num_random_tests, &mut rng);
    tester.run_throughput(50, &mut rng);
    for scenario in &errors {
        tester.run_error_scenario(scenario);
    }

    tester.log_summary();
    let summary = tester.summary();

    if let Some(path) = waves {
        if let Some(trace) = tester.take_trace() {
            trace
                .write_vcd(&path, config.data_width, config.clock_period_ns)
                .with_context(|| format!("writing waves {}", path.display()))?;
            log::info!("wrote {} cycles of waves to {}", trace.len(), path.display());
        }
    }

    if let Some(path) = &args.report {
        let report = TestReport::new(config, tester.into_results());
        report
            .write_json(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        log::info!("wrote report to {}", path.display());
    }

    if !summary.all_passed() {
        anyhow::bail!("{} of {} tests failed", summary.failed, summary.total);
    }
    Ok(())
}
