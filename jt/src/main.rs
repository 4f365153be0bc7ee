use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use jobtable::cli::{Cli, Command};
use jobtable::config::Config;
use jobtable::table::JobTable;
use jobtable::{report, submit};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let table_name = cli.table.unwrap_or(config.table.clone());

    match cli.command {
        Command::Create { ncpu, tslice } => {
            let ncpu = ncpu.unwrap_or(config.ncpu);
            let tslice = tslice.unwrap_or(config.tslice_ms);
            JobTable::create(&table_name, ncpu, tslice)?;
            println!(
                "{} Created table {} (ncpu={}, tslice={}ms)",
                "✓".green(),
                table_name.cyan(),
                ncpu,
                tslice
            );
        }
        Command::Submit {
            priority,
            no_wait,
            command,
        } => {
            let mut table = JobTable::open(&table_name)?;
            let (submission, child) = submit::submit(&mut table, priority, &command)?;
            println!(
                "{} Submitted pid {} (priority {})",
                "✓".green(),
                submission.pid.to_string().cyan(),
                priority
            );
            if no_wait {
                // leave the child to its own devices; the record stays
                // uncompleted until something reaps it
                info!("not watching pid {} for exit", submission.pid);
            } else {
                submit::watch_exit(&mut table, submission.slot, child)?;
                println!("{} Job pid {} completed", "✓".green(), submission.pid);
            }
        }
        Command::Jobs => {
            let mut table = JobTable::open(&table_name)?;
            let snapshot = table.snapshot()?;
            if snapshot.is_empty() {
                println!("No jobs submitted");
            } else {
                print!("{}", report::render(&snapshot));
            }
        }
        Command::Report => {
            let mut table = JobTable::open(&table_name)?;
            let snapshot = table.snapshot()?;
            print!("{}", report::render(&snapshot));
        }
        Command::Destroy => {
            let table = JobTable::open(&table_name)?;
            table.destroy()?;
            println!("{} Destroyed table {}", "✓".green(), table_name);
        }
    }

    Ok(())
}
