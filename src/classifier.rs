//! Replenishment and rediscovery rules.
//!
//! Each product is judged on its own metrics. Rediscovery is only considered
//! when the replenishment rule does not fire, so a product lands in at most
//! one list.

use crate::error::{Result, SmartCartError};
use crate::models::{ProductHistory, ProductMetrics, Recommendation};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: u32 = 365;
/// A century of history; larger windows fall outside chrono's date range
pub const MAX_WINDOW_DAYS: u32 = 36_500;
/// Interval assumed for a product bought only once
pub const DEFAULT_FALLBACK_INTERVAL_DAYS: f64 = 30.0;
pub const DEFAULT_REPLENISH_MIN_FREQUENCY: usize = 3;
pub const DEFAULT_REPLENISH_INTERVAL_FACTOR: f64 = 0.6;
pub const DEFAULT_REPLENISH_MIN_DAYS: f64 = 4.0;
pub const DEFAULT_REDISCOVER_MIN_FREQUENCY: usize = 5;
pub const DEFAULT_REDISCOVER_INTERVAL_FACTOR: f64 = 2.5;

/// Tuning knobs for the cadence heuristics
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Trailing days of order history analysed
    pub window_days: u32,
    pub fallback_interval_days: f64,
    /// Purchases needed before a cadence is trusted
    pub replenish_min_frequency: usize,
    /// Fraction of the average interval after which a refill is due
    pub replenish_interval_factor: f64,
    /// Never suggest a refill sooner than this many days after the last purchase
    pub replenish_min_days: f64,
    pub rediscover_min_frequency: usize,
    /// Multiple of the average interval after which a habit counts as lapsed
    pub rediscover_interval_factor: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            fallback_interval_days: DEFAULT_FALLBACK_INTERVAL_DAYS,
            replenish_min_frequency: DEFAULT_REPLENISH_MIN_FREQUENCY,
            replenish_interval_factor: DEFAULT_REPLENISH_INTERVAL_FACTOR,
            replenish_min_days: DEFAULT_REPLENISH_MIN_DAYS,
            rediscover_min_frequency: DEFAULT_REDISCOVER_MIN_FREQUENCY,
            rediscover_interval_factor: DEFAULT_REDISCOVER_INTERVAL_FACTOR,
        }
    }
}

impl HeuristicConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(SmartCartError::validation_error(
                "window_days",
                "must be at least one day",
            ));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(SmartCartError::validation_error(
                "window_days",
                &format!("must not exceed {} days", MAX_WINDOW_DAYS),
            ));
        }
        let positive = [
            ("fallback_interval_days", self.fallback_interval_days),
            ("replenish_interval_factor", self.replenish_interval_factor),
            ("rediscover_interval_factor", self.rediscover_interval_factor),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SmartCartError::validation_error(field, "must be positive"));
            }
        }
        if !self.replenish_min_days.is_finite() || self.replenish_min_days < 0.0 {
            return Err(SmartCartError::validation_error(
                "replenish_min_days",
                "must not be negative",
            ));
        }
        Ok(())
    }

    /// Days that must pass since the last purchase before a refill is suggested
    pub fn replenish_threshold(&self, avg_interval_days: f64) -> f64 {
        (avg_interval_days * self.replenish_interval_factor).max(self.replenish_min_days)
    }

    pub fn is_replenishment_due(&self, metrics: &ProductMetrics) -> bool {
        metrics.frequency >= self.replenish_min_frequency
            && metrics.days_since_last as f64 >= self.replenish_threshold(metrics.avg_interval_days)
    }

    pub fn is_lapsed_habit(&self, metrics: &ProductMetrics) -> bool {
        metrics.frequency >= self.rediscover_min_frequency
            && metrics.days_since_last as f64
                > metrics.avg_interval_days * self.rediscover_interval_factor
    }
}

/// Outcome of classifying one product
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Replenish(Recommendation),
    Rediscover(Recommendation),
    NoAction,
}

pub fn classify(
    history: &ProductHistory,
    metrics: &ProductMetrics,
    heuristics: &HeuristicConfig,
) -> Classification {
    if heuristics.is_replenishment_due(metrics) {
        Classification::Replenish(Recommendation {
            id: history.product_id.clone(),
            name: history.product_name.clone(),
            reason: format!(
                "Regular replenishment (Last: {}d ago, Avg Int: {:.1}d)",
                metrics.days_since_last, metrics.avg_interval_days
            ),
            suggested_quantity: suggested_quantity(metrics.avg_quantity),
            frequency: Some(metrics.frequency),
        })
    } else if heuristics.is_lapsed_habit(metrics) {
        Classification::Rediscover(Recommendation {
            id: history.product_id.clone(),
            name: history.product_name.clone(),
            reason: format!(
                "Haven't bought in {} days (Avg: {:.1})",
                metrics.days_since_last, metrics.avg_interval_days
            ),
            suggested_quantity: 1,
            frequency: None,
        })
    } else {
        Classification::NoAction
    }
}

/// Rounded average quantity, never below one unit
pub fn suggested_quantity(avg_quantity: f64) -> u32 {
    let rounded = avg_quantity.round();
    if rounded.is_finite() && rounded >= 1.0 {
        rounded.min(u32::MAX as f64) as u32
    } else {
        1
    }
}
