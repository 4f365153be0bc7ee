//! fsd - scheduler daemon entry point

use std::fs;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use fairsched::cli::{Cli, Command, OutputFormat, get_log_path};
use fairsched::daemon::DaemonManager;
use fairsched::scheduler::{IntervalTicker, Scheduler, SignalControl};
use fairsched::signals;
use jobtable::Config;
use jobtable::table::JobTable;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    // Write to a log file, not stdout/stderr: the daemon runs detached
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let table_name = cli.table.unwrap_or(config.table.clone());

    match cli.command {
        Command::Run => cmd_run(&table_name),
        Command::Start => cmd_start(&table_name),
        Command::Stop => cmd_stop(),
        Command::Status { format } => cmd_status(format),
    }
}

/// Run the scheduler loop in the foreground until drained
fn cmd_run(table_name: &str) -> Result<()> {
    let daemon = DaemonManager::new();
    daemon.register_self()?;

    let mut table =
        JobTable::open(table_name).with_context(|| format!("Failed to attach to job table '{table_name}'"))?;

    // read once; immutable for the life of the scheduler
    let (ncpu, tslice_ms) = table.params();
    if ncpu == 0 || tslice_ms == 0 {
        return Err(eyre::eyre!(
            "Job table '{table_name}' carries invalid parameters (ncpu={ncpu}, tslice={tslice_ms}ms)"
        ));
    }
    info!(table = table_name, ncpu, tslice_ms, "Attached to job table");

    let shutdown = signals::install_shutdown_handler()?;
    let mut ticker = IntervalTicker::new(tslice_ms, shutdown.clone());
    let mut scheduler = Scheduler::new(ncpu, Box::new(SignalControl), shutdown);

    scheduler.run(&mut table, &mut ticker).context("Scheduler loop failed")?;

    // drop of the table handle unmaps and closes; the submitter unlinks
    println!("fsd: drained and stopped");
    Ok(())
}

/// Start the daemon in the background
fn cmd_start(table_name: &str) -> Result<()> {
    let daemon = DaemonManager::new();

    if daemon.is_running() {
        println!(
            "fsd is already running (PID: {})",
            daemon.running_pid().map(|p| p.to_string()).unwrap_or_default()
        );
        return Ok(());
    }

    // fail here, not in the detached child, if the table is missing
    JobTable::open(table_name).with_context(|| format!("Failed to attach to job table '{table_name}'"))?;

    let pid = daemon.start(table_name)?;
    println!("fsd started (PID: {pid})");
    Ok(())
}

/// Stop the daemon
fn cmd_stop() -> Result<()> {
    let daemon = DaemonManager::new();

    if !daemon.is_running() {
        println!("fsd is not running");
        return Ok(());
    }

    let pid = daemon.running_pid().unwrap_or_default();
    daemon.stop()?;
    println!("fsd stopped (was PID: {pid})");
    Ok(())
}

/// Show daemon status
fn cmd_status(format: OutputFormat) -> Result<()> {
    let daemon = DaemonManager::new();
    let status = daemon.status();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "running": status.running,
                "pid": status.pid,
                "pid_file": status.pid_file.to_string_lossy(),
                "log_file": get_log_path().to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("fsd status");
            println!("----------");
            if status.running {
                println!("Status: running");
                if let Some(pid) = status.pid {
                    println!("PID: {pid}");
                }
            } else {
                println!("Status: stopped");
            }
            println!("PID file: {}", status.pid_file.display());
            println!("Log file: {}", get_log_path().display());
        }
    }

    Ok(())
}
