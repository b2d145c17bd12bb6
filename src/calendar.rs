//! Working-day expansion of a date range under a weekday mask.

use chrono::{Datelike, NaiveDate};

use crate::settings::WorkDays;

/// Every date in the inclusive range whose weekday is enabled in the mask,
/// in ascending order. Empty when `from` is after `to`.
pub fn work_dates(from: NaiveDate, to: NaiveDate, work_days: &WorkDays) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        if work_days.contains(current.weekday()) {
            dates.push(current);
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}
