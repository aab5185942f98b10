//! End-to-end smart cart calculation.
//!
//! The order source, the output sink and the reference instant are all passed
//! in, so a run is fully determined by its inputs.

use crate::classifier::HeuristicConfig;
use crate::error::Result;
use crate::history::{aggregate_purchases, aggregate_purchases_parallel};
use crate::models::{AnalysisResult, ProductHistoryMap, PurchaseEvent, RawOrder, RawOrderLine};
use crate::parser::{
    AnalysisWindow, events_from_orders, load_orders_dump, retain_orders_in_window,
};
use crate::reports::generate_analysis_result;
use crate::sink::ResultSink;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Above this many events, aggregation is sharded across threads
const PARALLEL_AGGREGATION_THRESHOLD: usize = 50_000;

/// Supplies past orders and, on demand, their line items
pub trait OrderSource {
    fn list_orders(&self) -> Result<Vec<RawOrder>>;

    /// Lines of one order; `None` when the source has nothing for it
    fn order_lines(&self, order_id: &str) -> Result<Option<Vec<RawOrderLine>>>;
}

/// Order history read from a JSON dump whose orders embed their lines
pub struct DumpOrderSource {
    path: PathBuf,
}

impl DumpOrderSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl OrderSource for DumpOrderSource {
    fn list_orders(&self) -> Result<Vec<RawOrder>> {
        load_orders_dump(&self.path)
    }

    fn order_lines(&self, _order_id: &str) -> Result<Option<Vec<RawOrderLine>>> {
        // Everything the dump knows is already embedded in the listed orders
        Ok(None)
    }
}

/// Result of one smart cart run
#[derive(Debug, Clone, PartialEq)]
pub enum SmartCartOutcome {
    NoOrderHistory,
    Calculated {
        result: AnalysisResult,
        location: String,
    },
}

impl SmartCartOutcome {
    pub fn summary(&self) -> String {
        match self {
            SmartCartOutcome::NoOrderHistory => "No order history found.".to_string(),
            SmartCartOutcome::Calculated { result, location } => format!(
                "Smart cart calculated with {} recommendations. Saved to {}.",
                result.recommendations.len(),
                location
            ),
        }
    }
}

/// Ingest, aggregate, classify and persist.
///
/// Orders whose lines cannot be fetched contribute nothing. A failure to
/// persist the result is returned to the caller.
pub fn calculate_smart_cart(
    source: &dyn OrderSource,
    sink: &dyn ResultSink,
    now: DateTime<Utc>,
    heuristics: &HeuristicConfig,
) -> Result<SmartCartOutcome> {
    heuristics.validate()?;

    let orders = source.list_orders()?;
    let listed = orders.len();
    let window = AnalysisWindow::trailing(now, heuristics.window_days);
    let mut retained = retain_orders_in_window(orders, &window);
    info!(listed, retained = retained.len(), "orders in analysis window");

    for dated in retained.iter_mut() {
        if dated.order.lines.is_some() {
            continue;
        }
        match source.order_lines(&dated.order.id) {
            Ok(lines) => {
                if lines.is_none() {
                    debug!(order_id = %dated.order.id, "no lines available for order");
                }
                dated.order.lines = lines;
            }
            Err(e) => warn!(order_id = %dated.order.id, error = %e, "failed to fetch order lines"),
        }
    }

    let histories = build_histories(&events_from_orders(&retained));
    if histories.is_empty() {
        return Ok(SmartCartOutcome::NoOrderHistory);
    }

    let result = generate_analysis_result(&histories, now, heuristics);
    sink.write(&result)?;
    info!(
        products = histories.len(),
        recommendations = result.recommendations.len(),
        discovery = result.discovery.len(),
        "smart cart calculated"
    );

    Ok(SmartCartOutcome::Calculated {
        result,
        location: sink.location(),
    })
}

fn build_histories(events: &[PurchaseEvent]) -> ProductHistoryMap {
    if events.len() > PARALLEL_AGGREGATION_THRESHOLD {
        aggregate_purchases_parallel(events)
    } else {
        aggregate_purchases(events)
    }
}
