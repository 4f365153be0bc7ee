//! Job submission and the child-exit watcher
//!
//! Submission spawns the command, immediately stops it, and appends its
//! record to the shared table with `submitted = true`. From then on the
//! scheduler owns every resume/suspend decision. The watcher half waits
//! for the child to exit naturally and flips `completed`, which the
//! scheduler treats as authoritative.

use std::process::{Child, Command};

use chrono::Utc;
use eyre::{Context, Result, eyre};
use log::{info, warn};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::record::JobRecord;
use crate::table::JobTable;

/// Outcome of a submission
#[derive(Debug)]
pub struct Submission {
    pub pid: i32,
    pub slot: usize,
}

/// Spawn `argv`, stop it before its first quantum, and register it in the
/// table. Returns the child handle so the caller can watch for its exit.
pub fn submit(table: &mut JobTable, priority: u32, argv: &[String]) -> Result<(Submission, Child)> {
    let program = argv.first().ok_or_else(|| eyre!("empty command"))?;

    let child = Command::new(program)
        .args(&argv[1..])
        .spawn()
        .with_context(|| format!("failed to spawn '{program}'"))?;
    let pid = child.id() as i32;

    // stop it before it gets meaningful work done; the scheduler resumes
    // it once a slot opens
    kill(Pid::from_raw(pid), Signal::SIGSTOP).context("failed to stop submitted job")?;

    let now = Utc::now().timestamp_millis();
    let record = JobRecord::new(pid, priority, &argv.join(" "), now)?;
    let slot = table.with_lock(|v| v.push_job(record))??;

    info!("submitted pid={pid} slot={slot} priority={priority}");
    Ok((Submission { pid, slot }, child))
}

/// Block until the child exits, then mark its record completed. This is
/// the child-exit watcher: the scheduler never flips `completed` itself.
pub fn watch_exit(table: &mut JobTable, slot: usize, mut child: Child) -> Result<()> {
    let status = child.wait().context("failed to wait for job")?;

    table.with_lock(|v| match v.jobs_mut().get_mut(slot) {
        Some(job) => {
            job.completed = true;
            info!("job pid={} completed ({status})", job.pid);
        }
        None => warn!("job slot {slot} vanished from the table"),
    })?;

    Ok(())
}
