//! Python bindings. JSON in, JSON out, so the host never has to mirror the
//! Rust types.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::calendar::PlanCalendar;
use crate::config::SchedulerConfig;
use crate::models::ItemId;
use crate::normalize::snapshot_from_json;
use crate::{compute_plan, drag_plan, rebalance_plan};

fn parse(snapshot_json: &str) -> PyResult<crate::models::PlanSnapshot> {
    snapshot_from_json(snapshot_json).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn dump<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Compute the full plan view for a persisted snapshot.
///
/// # Arguments
/// * `snapshot_json` - Persisted plan object (normalized before use)
/// * `verbosity` - Logging level written to stderr (0-3)
///
/// # Raises
/// * ValueError if `snapshot_json` is not valid JSON
#[pyfunction]
#[pyo3(signature = (snapshot_json, verbosity=0))]
fn compute_plan_json(snapshot_json: &str, verbosity: u8) -> PyResult<String> {
    let snapshot = parse(snapshot_json)?;
    let config = SchedulerConfig::default().with_verbosity(verbosity);
    dump(&compute_plan(&snapshot, &config))
}

/// Resolve a drag and return the complete override map it produces.
#[pyfunction]
#[pyo3(signature = (snapshot_json, item_id, proposed_start, verbosity=0))]
fn drag_json(
    snapshot_json: &str,
    item_id: ItemId,
    proposed_start: i64,
    verbosity: u8,
) -> PyResult<String> {
    let snapshot = parse(snapshot_json)?;
    let config = SchedulerConfig::default().with_verbosity(verbosity);
    dump(&drag_plan(&snapshot, item_id, proposed_start, &config).overrides)
}

/// Rebalance around frozen pins and return the new override map.
#[pyfunction]
#[pyo3(signature = (snapshot_json, verbosity=0))]
fn rebalance_json(snapshot_json: &str, verbosity: u8) -> PyResult<String> {
    let snapshot = parse(snapshot_json)?;
    let config = SchedulerConfig::default().with_verbosity(verbosity);
    dump(&rebalance_plan(&snapshot, &config))
}

/// Normalize an untrusted plan object.
#[pyfunction]
fn normalize_json(snapshot_json: &str) -> PyResult<String> {
    dump(&parse(snapshot_json)?)
}

/// First day of month `index` for a plan starting in the month of `plan_start`.
///
/// Returns None when the month falls outside the supported date range.
#[pyfunction]
fn month_start_date(plan_start: NaiveDate, index: i64) -> Option<NaiveDate> {
    PlanCalendar::starting(plan_start).month_start(index)
}

/// Fractional month position of `today` (e.g. 2.5 = halfway through month 2).
#[pyfunction]
fn today_marker(plan_start: NaiveDate, today: NaiveDate) -> f64 {
    PlanCalendar::starting(plan_start).today_marker(today)
}

#[pyfunction]
fn month_label(plan_start: NaiveDate, index: i64) -> String {
    PlanCalendar::starting(plan_start).month_label(index)
}

/// The portfolio_rust Python module.
#[pymodule]
fn portfolio_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_plan_json, m)?)?;
    m.add_function(wrap_pyfunction!(drag_json, m)?)?;
    m.add_function(wrap_pyfunction!(rebalance_json, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_json, m)?)?;
    m.add_function(wrap_pyfunction!(month_start_date, m)?)?;
    m.add_function(wrap_pyfunction!(today_marker, m)?)?;
    m.add_function(wrap_pyfunction!(month_label, m)?)?;
    Ok(())
}
