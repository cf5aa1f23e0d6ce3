//! workfan CLI: runs the pool and fan-out scenarios and checks every item ran.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use workfan::config::Config;
use workfan::diag::{LineBuffer, Log, TracingLog};
use workfan::model::RunReport;
use workfan::pool::WorkerPool;
use workfan::signal::AsyncSignal;
use workfan::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "workfan", about = "Worker pool and asynchronous notification fan-out")]
struct Cli {
    /// TOML config file (defaults come from the environment otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print the run report as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post ITEMS counter increments to a pool of WORKERS threads
    Post {
        /// Worker thread count
        workers: Option<usize>,
        /// Number of work items
        items: Option<usize>,
    },
    /// Fan one notification out to SUBSCRIBERS sleeping slots
    Signal {
        /// Worker thread count
        workers: Option<usize>,
        /// Number of connected slots
        subscribers: Option<usize>,
        /// How long each slot sleeps
        #[arg(long, default_value_t = 1000)]
        nap_ms: u64,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "workfan".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let log: Arc<dyn Log> = Arc::new(TracingLog);

    let report = match cli.command {
        Command::Post { workers, items } => {
            let mut config = config;
            config.pool.workers = workers.unwrap_or(config.pool.workers);
            cmd_post(&config, items.unwrap_or(config.items), log)?
        }
        Command::Signal {
            workers,
            subscribers,
            nap_ms,
        } => {
            let mut config = config;
            config.pool.workers = workers.unwrap_or(config.pool.workers);
            cmd_signal(
                &config,
                subscribers.unwrap_or(config.items),
                Duration::from_millis(nap_ms),
                log,
            )?
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: workers={}, n={}, seen={}, failed={}, elapsed={}ms",
            report.scenario,
            report.workers,
            report.n,
            report.seen,
            report.metrics.failed,
            report.elapsed_ms()
        );
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_post(config: &Config, n: usize, log: Arc<dyn Log>) -> anyhow::Result<RunReport> {
    let started_at = Utc::now();
    let pool = WorkerPool::with_config(&config.pool, log)?;
    let seen = Arc::new(AtomicUsize::new(0));

    for _ in 0..n {
        let seen = Arc::clone(&seen);
        pool.submit(move || {
            seen.fetch_add(1, Ordering::Relaxed);
        })?;
    }

    pool.shutdown();
    pool.join();

    Ok(RunReport {
        scenario: "post".to_string(),
        workers: pool.worker_count(),
        n,
        seen: seen.load(Ordering::Relaxed),
        metrics: pool.metrics(),
        started_at,
        finished_at: Utc::now(),
    })
}

fn cmd_signal(
    config: &Config,
    n: usize,
    nap: Duration,
    log: Arc<dyn Log>,
) -> anyhow::Result<RunReport> {
    let started_at = Utc::now();
    let pool = Arc::new(WorkerPool::with_config(&config.pool, Arc::clone(&log))?);
    let signal = AsyncSignal::new(Arc::clone(&pool), Arc::clone(&log));
    let seen = Arc::new(AtomicUsize::new(0));

    for slot in 1..=n {
        let seen = Arc::clone(&seen);
        let log = Arc::clone(&log);
        signal.connect(move || {
            let mut line = LineBuffer::new(log.as_ref());
            let _ = write!(line, "  slot {slot}: start");
            line.flush();
            std::thread::sleep(nap);
            let _ = write!(line, "  slot {slot}: end");
            line.flush();
            seen.fetch_add(1, Ordering::Relaxed);
        });
    }

    let mut line = LineBuffer::new(log.as_ref());
    let _ = write!(line, "main: sync call, async exec");
    line.flush();
    signal.emit()?;
    let _ = write!(line, "main: done");
    line.flush();

    pool.shutdown();
    pool.join();

    Ok(RunReport {
        scenario: "signal".to_string(),
        workers: pool.worker_count(),
        n,
        seen: seen.load(Ordering::Relaxed),
        metrics: pool.metrics(),
        started_at,
        finished_at: Utc::now(),
    })
}
