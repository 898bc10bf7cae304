//! Well-known probe result field names and typed accessors.
//!
//! Probe results are free-form JSON. Collaborators written against the
//! original camelCase contract and native snake_case collaborators are both
//! accepted, so every lookup takes a list of aliases and uses the first one
//! present.

use serde_json::Value;

/// Reported status string (see [`crate::status`] for the vocabulary).
pub const STATUS_KEYS: &[&str] = &["status", "state"];

/// Single error value. Any non-empty value marks the result as failing.
pub const ERROR_KEY: &str = "error";

/// Error list (or count). Non-empty marks the result as failing.
pub const ERRORS_KEY: &str = "errors";

/// Error rate in `0.0..=1.0`.
pub const ERROR_RATE_KEYS: &[&str] = &["errorRate", "error_rate"];

/// Memory usage as a percentage in `0.0..=100.0`.
pub const MEMORY_PERCENT_KEYS: &[&str] = &["memoryUsagePercent", "memory_usage_percent"];

/// Cache hit rate in `0.0..=1.0`.
pub const CACHE_HIT_RATE_KEYS: &[&str] = &["cacheHitRate", "cache_hit_rate"];

/// Cumulative API call counter.
pub const API_CALL_KEYS: &[&str] = &["apiCalls", "totalCalls", "api_calls", "total_calls"];

/// Cumulative error counter. `errors` only counts when it is numeric.
pub const ERROR_COUNT_KEYS: &[&str] = &["errorCount", "errors", "error_count"];

/// Memory usage in megabytes.
pub const MEMORY_MB_KEYS: &[&str] = &[
    "memoryUsageMB",
    "memoryUsage",
    "memory_usage_mb",
    "memory_usage",
];

/// Return the first numeric value found under any of `keys`.
///
/// Non-numeric values under a key are skipped rather than treated as zero,
/// so `{"errors": ["boom"], "errorCount": 3}` still yields `3` for
/// [`ERROR_COUNT_KEYS`].
pub fn number(result: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| result.get(*key))
        .find_map(Value::as_f64)
}

/// Return the first string value found under any of `keys`.
pub fn string<'a>(result: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| result.get(*key))
        .find_map(Value::as_str)
}

/// Whether the result carries an `error` value or a non-empty `errors` field.
pub fn has_error_indicator(result: &Value) -> bool {
    [ERROR_KEY, ERRORS_KEY]
        .iter()
        .filter_map(|key| result.get(*key))
        .any(is_non_empty)
}

/// Emptiness in the loose sense probe authors use it: `null`, `false`, `0`,
/// `""`, `[]` and `{}` are all "no error".
fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Convert a reported counter to a non-negative integer.
pub fn counter(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_uses_first_present_alias() {
        let result = json!({"totalCalls": 12, "api_calls": 99});
        assert_eq!(number(&result, API_CALL_KEYS), Some(12.0));
    }

    #[test]
    fn number_skips_non_numeric_aliases() {
        let result = json!({"errors": ["disk full"], "error_count": 3});
        assert_eq!(number(&result, ERROR_COUNT_KEYS), Some(3.0));
    }

    #[test]
    fn number_on_non_object_is_none() {
        assert_eq!(number(&json!("ok"), ERROR_RATE_KEYS), None);
    }

    #[test]
    fn error_indicator_detection() {
        assert!(has_error_indicator(&json!({"error": "boom"})));
        assert!(has_error_indicator(&json!({"errors": ["a"]})));
        assert!(!has_error_indicator(&json!({"errors": []})));
        assert!(!has_error_indicator(&json!({"error": null})));
        assert!(!has_error_indicator(&json!({"error": ""})));
        assert!(!has_error_indicator(&json!({"uptime": 5})));
    }

    #[test]
    fn counter_rounds_and_floors_at_zero() {
        assert_eq!(counter(4.6), 5);
        assert_eq!(counter(-3.0), 0);
        assert_eq!(counter(f64::NAN), 0);
    }
}
