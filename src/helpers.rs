use chrono::{DateTime, Utc};

/// Calculate average from a slice of numeric values
pub fn calculate_average<T>(values: &[T]) -> f64
where
    T: Into<f64> + Copy,
{
    if values.is_empty() {
        return 0.0;
    }

    let sum: f64 = values.iter().map(|&v| v.into()).sum();
    sum / values.len() as f64
}

/// Whole days elapsed from `earlier` to `later`, rounded down
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().div_euclid(86_400)
}
