//! Query-string parsing for the report endpoints.
//!
//! Values that fail to parse, or fall outside the accepted range, degrade to
//! the documented default instead of failing the request.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::config::Constants;

/// `year`, defaulting to the current UTC year.
pub fn year_param(params: &HashMap<String, String>, now: DateTime<Utc>) -> i32 {
    params
        .get("year")
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|y| (Constants::MIN_YEAR..=Constants::MAX_YEAR).contains(y))
        .unwrap_or_else(|| now.year())
}

/// `limit`, defaulting to 10 and clamped to the maximum.
pub fn limit_param(params: &HashMap<String, String>) -> usize {
    params
        .get("limit")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|l| *l >= 1)
        .map(|l| (l as u64).min(Constants::MAX_FREQUENT_ISSUES_LIMIT as u64) as usize)
        .unwrap_or(Constants::DEFAULT_FREQUENT_ISSUES_LIMIT)
}

/// `weeks`, defaulting to 12 and clamped to the maximum.
pub fn weeks_param(params: &HashMap<String, String>) -> i64 {
    params
        .get("weeks")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|w| *w >= 1)
        .map(|w| w.min(Constants::MAX_WEEKS))
        .unwrap_or(Constants::DEFAULT_WEEKS)
}
