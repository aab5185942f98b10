use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder used when a line carries no product display name
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// One past order as returned by the order history API
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawOrder {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    /// Present once the order has been enriched with its detail lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<RawOrderLine>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawOrderLine {
    #[serde(default, deserialize_with = "optional_id_from_string_or_number")]
    pub product_id: Option<String>,
    /// What the shopper asked for, not what was prepared or substituted
    #[serde(default)]
    pub ordered_quantity: Option<f64>,
    #[serde(default)]
    pub product: Option<RawProduct>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawProduct {
    #[serde(default)]
    pub display_name: Option<String>,
}

impl RawOrderLine {
    pub fn product_name(&self) -> &str {
        self.product
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .unwrap_or(UNKNOWN_PRODUCT_NAME)
    }
}

/// A single line-item occurrence within a retained order
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseEvent {
    pub product_id: String,
    pub product_name: String,
    pub date: DateTime<Utc>,
    pub quantity: f64,
}

/// Every purchase of one product within the analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct ProductHistory {
    pub product_id: String,
    pub product_name: String,
    /// Encounter order, not necessarily chronological
    pub dates: Vec<DateTime<Utc>>,
    /// Aligned with `dates` by occurrence
    pub quantities: Vec<f64>,
}

impl ProductHistory {
    pub fn from_event(event: &PurchaseEvent) -> Self {
        Self {
            product_id: event.product_id.clone(),
            product_name: event.product_name.clone(),
            dates: vec![event.date],
            quantities: vec![event.quantity],
        }
    }

    pub fn record(&mut self, event: &PurchaseEvent) {
        self.dates.push(event.date);
        self.quantities.push(event.quantity);
    }

    /// Appends another shard's occurrences after this one's
    pub fn absorb(&mut self, other: ProductHistory) {
        self.dates.extend(other.dates);
        self.quantities.extend(other.quantities);
    }

    pub fn frequency(&self) -> usize {
        self.dates.len()
    }
}

/// Product histories keyed by product id, in first-seen order
pub type ProductHistoryMap = IndexMap<String, ProductHistory>;

/// Derived view of one product's purchase cadence
#[derive(Debug, Clone, PartialEq)]
pub struct ProductMetrics {
    pub frequency: usize,
    pub days_since_last: i64,
    pub avg_quantity: f64,
    pub avg_interval_days: f64,
}

/// One suggestion in the output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    pub reason: String,
    #[serde(rename = "suggested_qty")]
    pub suggested_quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<usize>,
}

/// The smart cart document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "items")]
    pub recommendations: Vec<Recommendation>,
    pub discovery: Vec<Recommendation>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty() && self.discovery.is_empty()
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(optional_id_from_string_or_number(deserializer)?.unwrap_or_default())
}

/// The store API hands out ids as strings for products but numbers for orders
fn optional_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_raw_line_deserialization() {
        let json = r#"{
            "product_id": "3400",
            "ordered_quantity": 2,
            "product": {
                "display_name": "Leche semidesnatada",
                "price_instructions": {"unit_price": "0.89"}
            }
        }"#;
        let line: RawOrderLine = serde_json::from_str(json).unwrap();
        assert_eq!(line.product_id.as_deref(), Some("3400"));
        assert_eq!(line.ordered_quantity, Some(2.0));
        assert_eq!(line.product_name(), "Leche semidesnatada");
    }

    #[test]
    fn test_raw_line_defaults() {
        let line: RawOrderLine = serde_json::from_str(r#"{"product_id": 51}"#).unwrap();
        assert_eq!(line.product_id.as_deref(), Some("51"));
        assert_eq!(line.product_name(), UNKNOWN_PRODUCT_NAME);
        assert!(line.ordered_quantity.is_none());

        let empty: RawOrderLine = serde_json::from_str(r#"{"product_id": ""}"#).unwrap();
        assert!(empty.product_id.is_none());
    }

    #[test]
    fn test_raw_order_numeric_id() {
        let order: RawOrder =
            serde_json::from_str(r#"{"id": 12345, "start_date": "2026-01-15T18:00:00Z"}"#).unwrap();
        assert_eq!(order.id, "12345");
        assert!(order.lines.is_none());
    }

    #[test]
    fn test_discovery_item_omits_frequency() {
        let item = Recommendation {
            id: "1".to_string(),
            name: "Pan".to_string(),
            reason: "Haven't bought in 60 days (Avg: 20.0)".to_string(),
            suggested_quantity: 1,
            frequency: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("frequency").is_none());
        assert_eq!(value["suggested_qty"], 1);
    }

    #[test]
    fn test_analysis_result_json_roundtrip() {
        let result = AnalysisResult {
            generated_at: Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap(),
            recommendations: vec![Recommendation {
                id: "10".to_string(),
                name: "Huevos".to_string(),
                reason: "Regular replenishment (Last: 18d ago, Avg Int: 30.0d)".to_string(),
                suggested_quantity: 2,
                frequency: Some(3),
            }],
            discovery: vec![Recommendation {
                id: "20".to_string(),
                name: "Cafe".to_string(),
                reason: "Haven't bought in 60 days (Avg: 20.0)".to_string(),
                suggested_quantity: 1,
                frequency: None,
            }],
        };

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("\"items\""));
        assert!(json.contains("\"generated_at\": \"2026-01-15T09:30:00Z\""));

        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_history_absorb_concatenates() {
        let date = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let event = PurchaseEvent {
            product_id: "1".to_string(),
            product_name: "Pan".to_string(),
            date,
            quantity: 1.0,
        };
        let mut left = ProductHistory::from_event(&event);
        let mut right = ProductHistory::from_event(&PurchaseEvent {
            product_name: "Pan de molde".to_string(),
            quantity: 3.0,
            ..event.clone()
        });
        right.record(&event);

        left.absorb(right);
        assert_eq!(left.frequency(), 3);
        assert_eq!(left.quantities, vec![1.0, 3.0, 1.0]);
        assert_eq!(left.product_name, "Pan");
    }
}
