//! Rate Calculator
//!
//! Derives per-record throughput (kg/h) and its qualitative tier. The
//! stored duration is the only input that can fault: a non-positive value
//! makes the division meaningless, so the record is reported as faulted and
//! excluded upstream — never silently patched with a default shift length.

use thiserror::Error;

use crate::types::{Tier, WeighRecord};

/// Why a weigh record could not produce a throughput value.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum RateFault {
    #[error("work duration must be > 0 hours, got {0}")]
    NonPositiveDuration(f64),
}

/// Throughput in kg/h for one record.
///
/// Fails with [`RateFault::NonPositiveDuration`] when the stored duration is
/// zero or negative; callers exclude such records and count them.
pub fn throughput(record: &WeighRecord) -> Result<f64, RateFault> {
    if record.work_duration_hours <= 0.0 {
        return Err(RateFault::NonPositiveDuration(record.work_duration_hours));
    }
    Ok(record.weight_kg / record.work_duration_hours)
}

/// Throughput plus its tier, for table rows.
pub fn rate_and_tier(record: &WeighRecord) -> Result<(f64, Tier), RateFault> {
    let kg_per_hour = throughput(record)?;
    Ok((kg_per_hour, Tier::classify(kg_per_hour)))
}
