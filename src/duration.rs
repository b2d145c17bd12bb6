//! Work-duration parsing and formatting in tracker notation.

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(w|d|h|m)").expect("invalid duration regex"));

const WORKDAYS_PER_WEEK: u64 = 5;

/// Parses `"1h30m"`-style strings to seconds. `d` counts as `workday_hours`
/// hours and `w` as five workdays. A bare integer is minutes, a bare decimal
/// is hours. Returns `None` for unparseable or zero-length input.
pub fn parse_seconds(input: &str, workday_hours: u64) -> Option<u64> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let mut weeks = 0u64;
    let mut days = 0u64;
    let mut hours = 0u64;
    let mut minutes = 0u64;

    for capture in DURATION_TOKEN_REGEX.captures_iter(&normalized) {
        let value = capture[1].parse::<u64>().ok()?;
        match &capture[2] {
            "w" => weeks += value,
            "d" => days += value,
            "h" => hours += value,
            "m" => minutes += value,
            _ => {}
        }
    }

    if weeks == 0 && days == 0 && hours == 0 && minutes == 0 {
        if let Ok(value) = normalized.parse::<u64>() {
            minutes = value;
        } else if let Ok(value) = normalized.parse::<f64>() {
            if !value.is_finite() || value < 0.0 {
                return None;
            }
            let whole_hours = value.trunc();
            hours = whole_hours as u64;
            let fractional_minutes = ((value - whole_hours) * 60.0).round();
            if fractional_minutes > 0.0 {
                minutes = fractional_minutes as u64;
            }
        } else {
            return None;
        }
    }

    let total = weeks * WORKDAYS_PER_WEEK * workday_hours * 3600
        + days * workday_hours * 3600
        + hours * 3600
        + minutes * 60;

    if total == 0 {
        None
    } else {
        Some(total)
    }
}

/// Renders seconds as `"Xh YYm"`, or `"Ym"` under an hour.
pub fn format_seconds(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
