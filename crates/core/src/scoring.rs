//! Entry score adjustment and platform score reduction.

use serde_json::Value;

use crate::fields;
use crate::status::HealthStatus;
use crate::types::Score;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound of every score.
pub const MAX_SCORE: Score = 100;

/// Largest deduction for a reported error rate.
const MAX_ERROR_RATE_PENALTY: f64 = 30.0;

/// Largest deduction for memory pressure.
const MAX_MEMORY_PENALTY: f64 = 20.0;

/// Largest deduction for a poor cache hit rate.
const MAX_CACHE_PENALTY: f64 = 10.0;

/// Memory usage percentage above which the memory penalty applies.
const MEMORY_PRESSURE_PERCENT: f64 = 80.0;

/// Cache hit rate below which the cache penalty applies.
const CACHE_HIT_RATE_FLOOR: f64 = 0.5;

// ---------------------------------------------------------------------------
// Entry scoring
// ---------------------------------------------------------------------------

/// Score for a resolved status, refined by whatever metrics the result reports.
pub fn score_for(status: HealthStatus, result: Option<&Value>) -> Score {
    adjust_score(status.base_score(), result)
}

/// Apply bounded metric penalties to `base`.
///
/// A base of `0` is returned untouched. The result is always in
/// `0..=MAX_SCORE`.
pub fn adjust_score(base: Score, result: Option<&Value>) -> Score {
    if base == 0 {
        return 0;
    }
    let base = base.min(MAX_SCORE);
    let Some(result) = result else {
        return base;
    };

    let mut score = f64::from(base);

    if let Some(rate) = fields::number(result, fields::ERROR_RATE_KEYS) {
        if rate > 0.0 {
            score -= (rate * 100.0).round().min(MAX_ERROR_RATE_PENALTY);
        }
    }

    if let Some(percent) = fields::number(result, fields::MEMORY_PERCENT_KEYS) {
        if percent > MEMORY_PRESSURE_PERCENT {
            score -= (percent - MEMORY_PRESSURE_PERCENT)
                .round()
                .min(MAX_MEMORY_PENALTY);
        }
    }

    if let Some(hit_rate) = fields::number(result, fields::CACHE_HIT_RATE_KEYS) {
        if hit_rate < CACHE_HIT_RATE_FLOOR {
            score -= ((CACHE_HIT_RATE_FLOOR - hit_rate) * 20.0)
                .round()
                .min(MAX_CACHE_PENALTY);
        }
    }

    score.round().clamp(0.0, f64::from(MAX_SCORE)) as Score
}

// ---------------------------------------------------------------------------
// Platform scoring
// ---------------------------------------------------------------------------

/// Rounded mean of all entry scores, or [`MAX_SCORE`] when there are none.
pub fn overall_score(scores: impl IntoIterator<Item = Score>) -> Score {
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| (sum + u64::from(s), count + 1));

    if count == 0 {
        return MAX_SCORE;
    }
    (sum as f64 / count as f64).round() as Score
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn base_scores_per_status() {
        assert_eq!(score_for(HealthStatus::Healthy, None), 100);
        assert_eq!(score_for(HealthStatus::Degraded, None), 50);
        assert_eq!(score_for(HealthStatus::Unhealthy, None), 0);
        assert_eq!(score_for(HealthStatus::Unresponsive, None), 0);
    }

    #[test]
    fn zero_base_is_never_adjusted() {
        let result = json!({"errorRate": 0.9, "memoryUsagePercent": 99, "cacheHitRate": 0.0});
        assert_eq!(adjust_score(0, Some(&result)), 0);
    }

    #[test]
    fn error_rate_penalty_is_capped() {
        assert_eq!(adjust_score(100, Some(&json!({"errorRate": 0.12}))), 88);
        assert_eq!(adjust_score(100, Some(&json!({"errorRate": 0.75}))), 70);
        assert_eq!(adjust_score(100, Some(&json!({"errorRate": 0.0}))), 100);
    }

    #[test]
    fn memory_penalty_applies_above_eighty_percent() {
        assert_eq!(adjust_score(100, Some(&json!({"memoryUsagePercent": 80}))), 100);
        assert_eq!(adjust_score(100, Some(&json!({"memoryUsagePercent": 87.4}))), 93);
        assert_eq!(adjust_score(100, Some(&json!({"memory_usage_percent": 100}))), 80);
    }

    #[test]
    fn cache_penalty_applies_below_half_hit_rate() {
        assert_eq!(adjust_score(100, Some(&json!({"cacheHitRate": 0.5}))), 100);
        assert_eq!(adjust_score(100, Some(&json!({"cacheHitRate": 0.25}))), 95);
        assert_eq!(adjust_score(100, Some(&json!({"cacheHitRate": 0.0}))), 90);
    }

    #[test]
    fn penalties_combine_and_clamp() {
        let result = json!({"errorRate": 1.0, "memoryUsagePercent": 100, "cacheHitRate": 0.0});
        assert_eq!(adjust_score(100, Some(&result)), 40);
        assert_eq!(adjust_score(50, Some(&result)), 0);
    }

    #[test]
    fn overall_score_is_rounded_mean() {
        assert_eq!(overall_score([100, 0]), 50);
        assert_eq!(overall_score([100, 50, 50]), 67);
        assert_eq!(overall_score([90]), 90);
    }

    #[test]
    fn overall_score_of_empty_registry_is_max() {
        assert_eq!(overall_score(std::iter::empty()), MAX_SCORE);
    }
}
