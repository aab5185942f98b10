//! Order ingestion: turns raw order records into purchase events.
//!
//! Orders are kept only when their start date parses and falls inside the
//! trailing analysis window `(now - window_days, now]`. Anything unusable is
//! dropped silently (logged at debug level); a broken order never aborts a run.

use crate::error::{Result, SmartCartError};
use crate::models::{PurchaseEvent, RawOrder, RawOrderLine};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse an order start date into UTC.
///
/// Accepts RFC 3339 (a trailing `Z` means `+00:00`), plus naive date-times
/// and plain dates, which are read as UTC.
pub fn parse_order_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The trailing window of order history considered for metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub start_exclusive: DateTime<Utc>,
    pub end_inclusive: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn trailing(now: DateTime<Utc>, window_days: u32) -> Self {
        Self {
            start_exclusive: now - Duration::days(i64::from(window_days)),
            end_inclusive: now,
        }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date > self.start_exclusive && date <= self.end_inclusive
    }
}

/// An order that survived date filtering, paired with its parsed date
#[derive(Debug, Clone)]
pub struct DatedOrder {
    pub order: RawOrder,
    pub date: DateTime<Utc>,
}

/// Keep orders whose start date parses and falls inside the window, newest first
pub fn retain_orders_in_window(orders: Vec<RawOrder>, window: &AnalysisWindow) -> Vec<DatedOrder> {
    let mut retained: Vec<DatedOrder> = orders
        .into_iter()
        .filter_map(|order| {
            let Some(raw_date) = order.start_date.as_deref() else {
                debug!(order_id = %order.id, "skipping order without start date");
                return None;
            };
            let Some(date) = parse_order_date(raw_date) else {
                debug!(order_id = %order.id, start_date = raw_date, "skipping order with unparsable start date");
                return None;
            };
            if !window.contains(date) {
                debug!(order_id = %order.id, %date, "order outside analysis window");
                return None;
            }
            Some(DatedOrder { order, date })
        })
        .collect();

    // Stable, so orders placed at the same instant keep their listed order
    retained.sort_by(|a, b| b.date.cmp(&a.date));
    retained
}

/// Purchase events contributed by one order's lines
pub fn events_from_lines(lines: &[RawOrderLine], date: DateTime<Utc>) -> Vec<PurchaseEvent> {
    lines
        .iter()
        .filter_map(|line| {
            let product_id = line.product_id.as_ref()?;
            Some(PurchaseEvent {
                product_id: product_id.clone(),
                product_name: line.product_name().to_string(),
                date,
                quantity: line.ordered_quantity.unwrap_or(0.0).max(0.0),
            })
        })
        .collect()
}

/// Purchase events of retained orders, newest order first.
///
/// Orders without lines contribute nothing. Repeated purchases across orders
/// are kept as separate events.
pub fn events_from_orders(retained: &[DatedOrder]) -> Vec<PurchaseEvent> {
    // Indexed parallel collect keeps the newest-first order of events
    let per_order: Vec<Vec<PurchaseEvent>> = retained
        .par_iter()
        .map(|dated| match &dated.order.lines {
            Some(lines) => events_from_lines(lines, dated.date),
            None => Vec::new(),
        })
        .collect();

    per_order.into_iter().flatten().collect()
}

/// Load an order history dump (a JSON array of orders) from disk
pub fn load_orders_dump(path: &Path) -> Result<Vec<RawOrder>> {
    if !path.exists() {
        return Err(SmartCartError::order_source(&format!(
            "order dump not found at {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| SmartCartError::json_parse_error(path, e))
}
