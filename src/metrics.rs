use crate::classifier::HeuristicConfig;
use crate::helpers::{calculate_average, whole_days_between};
use crate::models::{ProductHistory, ProductMetrics};
use chrono::{DateTime, Utc};

impl ProductMetrics {
    /// Derive cadence metrics for one product as of `now`.
    ///
    /// Returns `None` only for an empty history, which aggregation never builds.
    pub fn compute(
        history: &ProductHistory,
        now: DateTime<Utc>,
        heuristics: &HeuristicConfig,
    ) -> Option<Self> {
        let mut dates = history.dates.clone();
        dates.sort();
        let last_purchased = *dates.last()?;

        let gaps: Vec<f64> = dates
            .windows(2)
            .map(|pair| whole_days_between(pair[0], pair[1]) as f64)
            .collect();

        let avg_interval_days = if gaps.is_empty() {
            heuristics.fallback_interval_days
        } else {
            calculate_average(&gaps)
        };

        let avg_quantity = if history.quantities.is_empty() {
            1.0
        } else {
            calculate_average(&history.quantities)
        };

        Some(Self {
            frequency: history.frequency(),
            days_since_last: whole_days_between(last_purchased, now),
            avg_quantity,
            avg_interval_days,
        })
    }
}
