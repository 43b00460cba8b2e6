use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info};

use rdt_abstract::{LinkConfig, LinkConfigOverride, Variant};
use rdt_core::{RetransmitTimer, TokioTimer, VirtualTimer};
use rdt_simulator::{SimulationReport, Transcript, scenario_runner};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    /// Corruption only, no timer (alternating-bit without loss).
    CorruptionOnly,
    /// Corruption and loss, timer-driven retransmission.
    LossAware,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::CorruptionOnly => Variant::CorruptionOnly,
            VariantArg::LossAware => Variant::LossAware,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Stop-and-wait reliable data transfer simulator")]
struct Args {
    /// Messages to transfer, in order.
    messages: Vec<String>,

    /// Load a link configuration (TOML) before applying command-line overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a scenario file and check its assertions.
    #[arg(long, conflicts_with = "messages")]
    scenario: Option<PathBuf>,

    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Probability that a segment is corrupted.
    #[arg(long)]
    error_rate: Option<f64>,

    /// Probability that an ACK is flipped.
    #[arg(long)]
    ack_error_rate: Option<f64>,

    /// Probability that a segment or ACK is lost (loss-aware variant).
    #[arg(long)]
    loss_rate: Option<f64>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Give up on a message after this many transmissions.
    #[arg(long)]
    max_attempts: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Simulate timeouts instead of sleeping through them.
    #[arg(long, default_value_t = false)]
    virtual_time: bool,

    /// Write a JSON trace of the finished run.
    #[arg(long)]
    trace_out: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> LinkConfigOverride {
        LinkConfigOverride {
            variant: self.variant.map(Variant::from),
            error_rate: self.error_rate,
            ack_error_rate: self.ack_error_rate,
            loss_rate: self.loss_rate,
            timeout_ms: self.timeout_ms,
            max_attempts: self.max_attempts,
            seed: self.seed,
        }
    }

    fn link_config(&self) -> Result<LinkConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => LinkConfig::default(),
        };
        self.overrides().apply_to(&mut config);
        Ok(config)
    }

    fn messages(&self) -> Vec<String> {
        if self.messages.is_empty() {
            vec!["Packet 1".into(), "Packet 2".into(), "Packet 3".into()]
        } else {
            self.messages.clone()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("rdt-sim-cli starting…");

    let report = if args.virtual_time {
        run(&args, VirtualTimer::new()).await?
    } else {
        run(&args, TokioTimer::new()).await?
    };
    log_summary(&report);

    if let Some(trace_path) = &args.trace_out {
        write_trace(trace_path, &report)?;
    }

    if let Some(failure) = &report.failure {
        anyhow::bail!("Transfer incomplete: {failure}");
    }
    Ok(())
}

async fn run<T: RetransmitTimer>(args: &Args, timer: T) -> Result<SimulationReport> {
    let mut transcript = Transcript::new();

    if let Some(path) = &args.scenario {
        let scenario = scenario_runner::load_scenario(path)?;
        let mut config = scenario_runner::scenario_config(&scenario);
        args.overrides().apply_to(&mut config);
        return scenario_runner::run_with_config(&scenario, &config, timer, &mut transcript).await;
    }

    let config = args.link_config()?;
    info!("Link configuration: {config:?}");
    scenario_runner::simulate(&config, &[], &args.messages(), timer, &mut transcript).await
}

fn init_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt::init();
    }
}

fn log_summary(report: &SimulationReport) {
    info!(
        "Timeouts: {} ms | segments sent: {} | retransmissions: {} | deliveries: {}",
        report.duration_ms,
        report.segments_sent,
        report.retransmissions,
        report.delivered_data.len()
    );
}

fn load_config(path: &Path) -> Result<LinkConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize simulation trace")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write trace file {}", path.display()))?;
    Ok(())
}
