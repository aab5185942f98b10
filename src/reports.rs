use crate::classifier::{Classification, HeuristicConfig, classify};
use crate::models::{AnalysisResult, ProductHistoryMap, ProductMetrics};
use chrono::{DateTime, Utc};

/// Classify every product and assemble the smart cart document.
///
/// Recommendations are ordered by frequency, highest first, with ties kept in
/// aggregation order. Discovery items stay in aggregation order.
pub fn generate_analysis_result(
    histories: &ProductHistoryMap,
    now: DateTime<Utc>,
    heuristics: &HeuristicConfig,
) -> AnalysisResult {
    let mut recommendations = Vec::new();
    let mut discovery = Vec::new();

    for history in histories.values() {
        let Some(metrics) = ProductMetrics::compute(history, now, heuristics) else {
            continue;
        };
        match classify(history, &metrics, heuristics) {
            Classification::Replenish(item) => recommendations.push(item),
            Classification::Rediscover(item) => discovery.push(item),
            Classification::NoAction => {}
        }
    }

    // sort_by is stable
    recommendations.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    AnalysisResult {
        generated_at: now,
        recommendations,
        discovery,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::aggregate_purchases;
    use crate::models::PurchaseEvent;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    /// Purchases of one product on the given "days ago"
    fn purchases(product_id: &str, days_ago: &[i64], quantity: f64) -> Vec<PurchaseEvent> {
        days_ago
            .iter()
            .map(|&d| PurchaseEvent {
                product_id: product_id.to_string(),
                product_name: format!("Product {}", product_id),
                date: now() - Duration::days(d),
                quantity,
            })
            .collect()
    }

    #[test]
    fn test_sorted_by_frequency_with_stable_ties() {
        let mut events = Vec::new();
        events.extend(purchases("a", &[10, 20, 30], 1.0));
        events.extend(purchases("b", &[10, 20, 30, 40], 1.0));
        events.extend(purchases("c", &[10, 20, 30], 1.0));
        events.extend(purchases("d", &[10, 20, 30, 40, 50], 1.0));

        let result =
            generate_analysis_result(&aggregate_purchases(&events), now(), &HeuristicConfig::default());
        let ids: Vec<&str> = result.recommendations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
        assert!(result.discovery.is_empty());
        assert_eq!(result.generated_at, now());
    }

    #[test]
    fn test_rediscovery_keeps_aggregation_order_and_lists_disjoint() {
        let heuristics = HeuristicConfig {
            replenish_min_days: 120.0,
            ..HeuristicConfig::default()
        };
        let mut events = Vec::new();
        // six purchases, 20 days apart, last one 60 days ago
        events.extend(purchases("q2", &[60, 80, 100, 120, 140, 160], 1.0));
        events.extend(purchases("q1", &[70, 90, 110, 130, 150, 170], 1.0));
        events.extend(purchases("fresh", &[1, 2, 3, 4, 5, 6], 2.0));

        let result = generate_analysis_result(&aggregate_purchases(&events), now(), &heuristics);
        let discovery: Vec<&str> = result.discovery.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(discovery, vec!["q2", "q1"]);

        let main: HashSet<&str> = result.recommendations.iter().map(|r| r.id.as_str()).collect();
        assert!(discovery.iter().all(|id| !main.contains(id)));
    }

    #[test]
    fn test_suggested_quantity_from_average() {
        let mut events = purchases("eggs", &[30, 60], 2.0);
        events.extend(purchases("eggs", &[90], 3.0));

        let result =
            generate_analysis_result(&aggregate_purchases(&events), now(), &HeuristicConfig::default());
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].suggested_quantity, 2);
        assert!(result.recommendations.iter().all(|r| r.suggested_quantity >= 1));
    }

    #[test]
    fn test_single_purchase_products_never_listed() {
        let events: Vec<PurchaseEvent> = (1..300)
            .step_by(7)
            .flat_map(|d| purchases(&format!("once-{}", d), &[d], 1.0))
            .collect();

        let result =
            generate_analysis_result(&aggregate_purchases(&events), now(), &HeuristicConfig::default());
        assert!(result.is_empty());
    }
}
