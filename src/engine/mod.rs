//! Productivity KPI & Alert Engine
//!
//! Pure data transforms, no I/O. The pipeline runs leaf first:
//!
//! - `rate`: per-record throughput and tier
//! - `aggregate`: per-worker / per-line summary statistics
//! - `kpi`: named indicators and the composite global score
//! - `alerts`: threshold evaluation and the session alert log
//!
//! Every stage takes its inputs (records, incidents, thresholds) as explicit
//! parameters and is idempotent: identical inputs produce identical outputs.

pub mod aggregate;
pub mod alerts;
pub mod kpi;
pub mod rate;

pub use aggregate::{aggregate, Aggregates, GroupStats, LineStats, RecordFilter, WorkerStats};
pub use alerts::{evaluate, AlertLog};
pub use kpi::compute_snapshot;
pub use rate::{throughput, RateFault};
