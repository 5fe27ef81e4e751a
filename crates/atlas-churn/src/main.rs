//! Atlas Churn - synthetic order flow through the order registry.
//!
//! Drives new/replace/cancel/lookup traffic through one registry and
//! reports per-operation latency and how well slots were reused.

mod workload;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use atlas_core::{OrderRegistry, RegistryConfig};
use atlas_metrics::OpLatencies;

use crate::workload::{Mix, Workload};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file holding a registry config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Slots allocated up front (overrides the config file)
    #[arg(long)]
    initial_capacity: Option<usize>,

    /// Hard slot limit; adds beyond it are rejected (overrides the config file)
    #[arg(long)]
    max_capacity: Option<usize>,

    /// Orders resting in the registry before measurement starts
    #[arg(long, default_value = "100000")]
    resting: usize,

    /// Messages to apply during measurement
    #[arg(short, long, default_value = "1000000")]
    messages: u64,

    /// Percent of messages that are new orders
    #[arg(long, default_value = "40")]
    new_pct: u32,

    /// Percent of messages that are replaces
    #[arg(long, default_value = "30")]
    replace_pct: u32,

    /// Percent of messages that are cancels (the rest are lookups)
    #[arg(long, default_value = "20")]
    cancel_pct: u32,

    /// Workload RNG seed
    #[arg(long, default_value = "1")]
    seed: u64,

    /// CPU core to pin to
    #[arg(short = 'c', long)]
    cpu_core: Option<usize>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    Ok(())
}

fn load_config(args: &Args) -> Result<RegistryConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => RegistryConfig::default(),
    };

    if let Some(initial) = args.initial_capacity {
        config.initial_capacity = initial;
    }
    if args.max_capacity.is_some() {
        config.max_capacity = args.max_capacity;
    }
    Ok(config)
}

fn pin_to_core(core: usize) -> Result<()> {
    let ids = core_affinity::get_core_ids().context("listing CPU cores")?;
    let id = ids
        .into_iter()
        .find(|id| id.id == core)
        .with_context(|| format!("CPU core {} not available", core))?;

    anyhow::ensure!(core_affinity::set_for_current(id), "failed to pin to core {}", core);
    tracing::info!("Pinned to CPU core {}", core);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    anyhow::ensure!(
        args.new_pct + args.replace_pct + args.cancel_pct <= 100,
        "message mix exceeds 100%"
    );

    let config = load_config(&args)?;
    let mut registry = OrderRegistry::with_config(config).context("invalid registry config")?;
    tracing::info!(
        initial_capacity = config.initial_capacity,
        max_capacity = ?config.max_capacity,
        "registry ready"
    );

    if let Some(core) = args.cpu_core {
        pin_to_core(core)?;
    }

    let mix = Mix {
        new_pct: args.new_pct,
        replace_pct: args.replace_pct,
        cancel_pct: args.cancel_pct,
    };
    let mut workload = Workload::new(args.seed, mix);
    let mut latencies = OpLatencies::new();

    tracing::info!("[1/2] Resting {} orders...", args.resting);
    workload
        .populate(&mut registry, args.resting)
        .context("populating registry")?;
    let before = registry.stats();

    tracing::info!("[2/2] Applying {} messages...", args.messages);
    let start = Instant::now();
    let report = workload
        .run(&mut registry, args.messages, &mut latencies)
        .context("workload diverged from registry")?;
    let elapsed = start.elapsed();
    let rate = report.messages as f64 / elapsed.as_secs_f64();

    tracing::info!("=== Churn Summary ===");
    tracing::info!("Messages: {} in {:.2?} ({:.0} msg/sec)", report.messages, elapsed, rate);
    tracing::info!(
        "New: {}  Replace: {} ({} rekeyed)  Cancel: {}  Lookup: {}  Rejected (full): {}",
        report.added,
        report.replaced,
        report.rekeyed,
        report.cancelled,
        report.lookups,
        report.rejected_full,
    );
    for (op, summary) in latencies.summaries() {
        tracing::info!("{:>8}: {}", op.name(), summary);
    }

    let after = registry.stats();
    tracing::info!(
        "Live: {}  Peak: {}  Slots: {} (was {})  Pool growths: {}  Index capacity: {}",
        after.live,
        after.peak_live,
        after.slot_capacity,
        before.slot_capacity,
        after.pool_growths,
        after.index_capacity,
    );
    if after.pool_growths > before.pool_growths {
        tracing::warn!(
            "Pool grew {} time(s) during measurement; raise --initial-capacity to keep the hot path allocation-free",
            after.pool_growths - before.pool_growths
        );
    }

    Ok(())
}
