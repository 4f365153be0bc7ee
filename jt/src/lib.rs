//! Shared job table for the fairsched scheduler
//!
//! This crate owns everything both sides of the scheduler agree on: the
//! [`JobRecord`] layout, the named shared-memory table with its
//! process-shared mutex, and the submitter-side tooling (`jt`) that
//! creates tables, submits jobs, watches for their exit, and prints the
//! final accounting report.
//!
//! The table is the single source of truth. The scheduler's ready heap
//! and running queue hold indices into it, never copies.

pub mod cli;
pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod submit;
pub mod table;

pub use config::Config;
pub use error::TableError;
pub use record::{CMD_MAX, JobRecord};
pub use table::{JobTable, MAX_JOBS, TableView};
