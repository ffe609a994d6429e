//! Sure-bet scanner entry point.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surebet_scan::arbitrage::{
    diagnose, normalize_feed, normalize_records, scan, scan_parallel, ScanReport,
};
use surebet_scan::config::Config;
use surebet_scan::feed::{load_records, save_records, OddsSimulator};
use surebet_scan::metrics;
use surebet_scan::odds::{EventOddsSnapshot, RawRecord};
use surebet_scan::utils::{format_amount, format_pct, shutdown_signal};

/// Cross-bookmaker sure-bet scanner.
#[derive(Parser, Debug)]
#[command(name = "surebet-scan")]
#[command(about = "Detects arbitrage opportunities across bookmaker odds")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "LOG_JSON")]
    json_logs: bool,

    /// Print Prometheus metrics to stderr before exiting.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Options shared by `scan` and `watch`.
#[derive(clap::Args, Debug, Default)]
struct ScanOpts {
    /// JSON snapshot file to scan (defaults to the simulated feed).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Total amount to distribute per opportunity.
    #[arg(short, long)]
    investment: Option<Decimal>,

    /// Minimum profit percentage to report.
    #[arg(long)]
    min_profit: Option<Decimal>,

    /// Seed for the simulated feed.
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate events in parallel.
    #[arg(long)]
    parallel: bool,

    /// Print opportunities as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan one batch of odds (default).
    Scan(ScanOpts),

    /// Print simulated odds records.
    Simulate {
        /// Seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,

        /// Only this event id.
        #[arg(long)]
        event: Option<String>,

        /// Write the records to a snapshot file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Scan repeatedly until interrupted.
    Watch {
        #[command(flatten)]
        opts: ScanOpts,

        /// Seconds between scans.
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many scans.
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = match Config::load() {
        Ok(config) => EnvFilter::new(config.log_directive(args.verbose)),
        Err(_) if args.verbose => EnvFilter::new("surebet_scan=debug,info"),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if args.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    // Initialize metrics
    let prometheus = if args.metrics {
        Some(install_metrics()?)
    } else {
        None
    };

    let result = match args.command {
        Some(Command::Scan(opts)) => cmd_scan(opts),
        Some(Command::Simulate { seed, event, out }) => cmd_simulate(seed, event, out),
        Some(Command::Watch { opts, interval, cycles }) => cmd_watch(opts, interval, cycles).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        None => cmd_scan(ScanOpts::default()),
    };

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    result
}

fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::init_metrics();
    Ok(handle)
}

/// Load configuration and apply command-line overrides.
fn resolve_config(opts: &ScanOpts) -> anyhow::Result<Config> {
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(file) = &opts.file {
        config.snapshot_path = Some(file.display().to_string());
    }
    if let Some(investment) = opts.investment {
        config.total_investment = investment;
    }
    if let Some(min_profit) = opts.min_profit {
        config.min_profit_pct = min_profit;
    }
    if let Some(seed) = opts.seed {
        config.simulator_seed = Some(seed);
    }
    if opts.parallel {
        config.parallel_scan = true;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Where odds come from.
enum OddsSource {
    File(PathBuf),
    Simulator(OddsSimulator),
}

impl OddsSource {
    fn from_config(config: &Config) -> Self {
        match (&config.snapshot_path, config.simulator_seed) {
            (Some(path), _) => OddsSource::File(PathBuf::from(path)),
            (None, Some(seed)) => OddsSource::Simulator(OddsSimulator::seeded(seed)),
            (None, None) => OddsSource::Simulator(OddsSimulator::new()),
        }
    }

    /// Fetch one batch of snapshots, with the number of rejected records.
    fn next_batch(&mut self) -> anyhow::Result<(Vec<EventOddsSnapshot>, usize)> {
        match self {
            OddsSource::File(path) => {
                let records = load_records(path)?;
                Ok(normalize_records(&records))
            }
            OddsSource::Simulator(simulator) => Ok(normalize_feed(simulator.fetch(None)?)),
        }
    }
}

fn run_scan(
    config: &Config,
    source: &mut OddsSource,
) -> anyhow::Result<(ScanReport, Vec<EventOddsSnapshot>)> {
    let (snapshots, malformed) = source.next_batch()?;

    let mut report = if config.parallel_scan {
        scan_parallel(&snapshots, config.total_investment)?
    } else {
        scan(&snapshots, config.total_investment)?
    };
    report.malformed = malformed;

    Ok((report, snapshots))
}

/// Scan one batch and print the opportunities.
fn cmd_scan(opts: ScanOpts) -> anyhow::Result<()> {
    let config = resolve_config(&opts)?;
    info!(source = %config.source_label(), investment = %config.total_investment, "Scanning odds");

    let mut source = OddsSource::from_config(&config);
    let (report, snapshots) = run_scan(&config, &mut source)?;

    if opts.json {
        let selected = report.above_threshold(config.min_profit_pct);
        println!("{}", serde_json::to_string_pretty(&selected)?);
    } else {
        print_report(&config, &report, &snapshots);
    }

    Ok(())
}

fn print_report(config: &Config, report: &ScanReport, snapshots: &[EventOddsSnapshot]) {
    let mut selected = report.above_threshold(config.min_profit_pct);
    selected.sort_by(|a, b| b.profit_percentage.cmp(&a.profit_percentage));

    let dp = config.stake_decimals;

    println!("======================================================================");
    println!("SURE BET SCAN");
    println!("======================================================================");
    println!("  Source: {}", config.source_label());
    println!("  Investment: {}", format_amount(config.total_investment, dp));
    println!("  Min profit: {}", format_pct(config.min_profit_pct));
    println!("----------------------------------------------------------------------");

    if selected.is_empty() {
        println!("No opportunities found.");
    }

    for opp in &selected {
        println!(
            "{} [{}] {} / {}",
            opp.event.description, opp.market_type, opp.event.sport, opp.event.league
        );
        println!(
            "  Implied sum: {}  Profit: {}  Return: {}  Net: {}",
            opp.implied_probability_sum.round_dp(4),
            format_pct(opp.profit_percentage),
            format_amount(opp.guaranteed_return, dp),
            format_amount(opp.expected_profit(), dp),
        );
        for leg in opp.rounded_allocations(dp) {
            println!(
                "    {:<24} @ {:>6} {:<14} stake {:>10} -> {:>10}",
                leg.outcome_label,
                leg.odd,
                leg.bookmaker_name,
                format_amount(leg.stake_amount, dp),
                format_amount(leg.guaranteed_individual_return, dp),
            );
        }
    }

    let hits: Vec<&str> = report.opportunities.iter().map(|o| o.event_id()).collect();
    let mut misses: Vec<_> = snapshots
        .iter()
        .filter(|s| !hits.contains(&s.event_id()))
        .map(diagnose)
        .collect();
    misses.sort_by_key(|d| (d.gap().is_none(), d.gap()));

    if !misses.is_empty() {
        println!("----------------------------------------------------------------------");
        println!("Closest misses:");
        for diagnosis in misses.iter().take(3) {
            println!("  {}", diagnosis);
        }
    }

    println!("----------------------------------------------------------------------");
    println!(
        "  Scanned: {}  Found: {}  Reported: {}  Incomplete: {}  No arb: {}  Malformed: {}  Failed: {}",
        report.events_scanned,
        report.opportunities.len(),
        selected.len(),
        report.incomplete,
        report.no_arbitrage,
        report.malformed,
        report.failed,
    );
    println!("======================================================================");
}

/// Print (or save) simulated odds records.
fn cmd_simulate(
    seed: Option<u64>,
    event: Option<String>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut simulator = match seed {
        Some(seed) => OddsSimulator::seeded(seed),
        None => OddsSimulator::new(),
    };

    let records: Vec<RawRecord> = simulator
        .fetch(event.as_deref())?
        .into_iter()
        .map(RawRecord::Event)
        .collect();

    match out {
        Some(path) => {
            save_records(&path, &records)?;
            info!(path = %path.display(), records = records.len(), "Snapshot written");
        }
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }

    Ok(())
}

/// Scan on a fixed interval until Ctrl+C or the cycle limit.
async fn cmd_watch(opts: ScanOpts, interval: Option<u64>, cycles: Option<u64>) -> anyhow::Result<()> {
    let mut config = resolve_config(&opts)?;
    if let Some(secs) = interval {
        if secs == 0 {
            return Err(anyhow::anyhow!("--interval must be at least 1 second"));
        }
        config.scan_interval_secs = secs;
    }

    info!(
        source = %config.source_label(),
        interval_secs = config.scan_interval_secs,
        "Watching odds"
    );

    let mut source = OddsSource::from_config(&config);
    let mut ticker = tokio::time::interval(Duration::from_secs(config.scan_interval_secs));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut cycle = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        cycle += 1;
        match run_scan(&config, &mut source) {
            Ok((report, snapshots)) => {
                if opts.json {
                    let selected = report.above_threshold(config.min_profit_pct);
                    println!("{}", serde_json::to_string(&selected)?);
                } else {
                    print_report(&config, &report, &snapshots);
                }
                debug!(cycle, opportunities = report.opportunities.len(), "Cycle complete");
            }
            Err(e) => warn!(cycle, error = %e, "Scan cycle failed"),
        }

        if cycles.is_some_and(|limit| cycle >= limit) {
            break;
        }
    }

    info!(cycles = cycle, "Watch stopped");
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SURE BET SCAN - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    if let Some(path) = &config.snapshot_path {
        print!("Reading snapshot... ");
        match load_records(path) {
            Ok(records) => println!("OK ({} records)", records.len()),
            Err(e) => {
                println!("FAILED");
                println!("  Error: {}", e);
                return Err(anyhow::anyhow!("Snapshot file unreadable"));
            }
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Source: {}", config.source_label());
    println!("  Total Investment: {}", format_amount(config.total_investment, config.stake_decimals));
    println!("  Min Profit: {}", format_pct(config.min_profit_pct));
    println!("  Stake Decimals: {}", config.stake_decimals);
    println!("  Scan Interval: {}s", config.scan_interval_secs);
    println!("  Parallel Scan: {}", if config.parallel_scan { "Enabled" } else { "Disabled" });
    println!("  Log Level: {}", config.rust_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
