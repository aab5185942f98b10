use crate::models::{ProductHistory, ProductHistoryMap, PurchaseEvent};
use rayon::prelude::*;

/// Fold purchase events into per-product histories.
///
/// The first event seen for a product fixes its display name. Keys keep
/// first-seen order so downstream output is reproducible.
pub fn aggregate_purchases(events: &[PurchaseEvent]) -> ProductHistoryMap {
    let mut map = ProductHistoryMap::new();
    for event in events {
        record_event(&mut map, event);
    }
    map
}

/// Same result as [`aggregate_purchases`], built from parallel shards
pub fn aggregate_purchases_parallel(events: &[PurchaseEvent]) -> ProductHistoryMap {
    events
        .par_iter()
        .fold(ProductHistoryMap::new, |mut map, event| {
            record_event(&mut map, event);
            map
        })
        .reduce(ProductHistoryMap::new, merge_histories)
}

/// Merge a later shard into an earlier one.
///
/// Occurrences are concatenated per product, never overwritten, so
/// frequencies survive the merge. Earlier names and key positions win.
pub fn merge_histories(mut earlier: ProductHistoryMap, later: ProductHistoryMap) -> ProductHistoryMap {
    for (product_id, history) in later {
        match earlier.get_mut(&product_id) {
            Some(existing) => existing.absorb(history),
            None => {
                earlier.insert(product_id, history);
            }
        }
    }
    earlier
}

fn record_event(map: &mut ProductHistoryMap, event: &PurchaseEvent) {
    match map.get_mut(&event.product_id) {
        Some(history) => history.record(event),
        None => {
            map.insert(event.product_id.clone(), ProductHistory::from_event(event));
        }
    }
}
