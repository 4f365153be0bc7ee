//! Accounting report printed at graceful shutdown

use colored::Colorize;

use crate::record::JobRecord;

/// Render the per-job accounting table: identity, execution time, wait
/// time, and the fairness key each job ended up with.
pub fn render(jobs: &[JobRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>8}  {:>4}  {:>10}  {:>10}  {:>10}  {:>10}  {}\n",
        "PID".bold(),
        "PRI".bold(),
        "STATE".bold(),
        "EXEC(ms)".bold(),
        "WAIT(ms)".bold(),
        "VRUNTIME".bold(),
        "COMMAND".bold(),
    ));

    for job in jobs.iter().filter(|j| j.submitted) {
        out.push_str(&format!(
            "{:>8}  {:>4}  {:>10}  {:>10}  {:>10}  {:>10}  {}\n",
            job.pid,
            job.priority,
            state_of(job),
            job.execution_ms,
            job.wait_ms,
            job.vruntime,
            job.command(),
        ));
    }

    if jobs.iter().filter(|j| j.submitted).count() == 0 {
        out.push_str("(no jobs submitted)\n");
    }

    out
}

fn state_of(job: &JobRecord) -> &'static str {
    if job.completed {
        "completed"
    } else if job.queued {
        "scheduled"
    } else {
        "pending"
    }
}
