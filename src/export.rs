use crate::error::Result;
use crate::models::AnalysisResult;
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub fn export_result_to_csv(result: &AnalysisResult, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_writer(File::create(path)?);

    wtr.write_record([
        "List",
        "ID",
        "Name",
        "Suggested Qty",
        "Frequency",
        "Reason",
    ])?;

    for item in &result.recommendations {
        wtr.write_record(&[
            "smart_cart".to_string(),
            item.id.clone(),
            item.name.clone(),
            item.suggested_quantity.to_string(),
            item.frequency.map(|f| f.to_string()).unwrap_or_default(),
            item.reason.clone(),
        ])?;
    }

    for item in &result.discovery {
        wtr.write_record(&[
            "discovery".to_string(),
            item.id.clone(),
            item.name.clone(),
            item.suggested_quantity.to_string(),
            String::new(),
            item.reason.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recommendation;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_export_rows() {
        let result = AnalysisResult {
            generated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
            recommendations: vec![Recommendation {
                id: "1".to_string(),
                name: "Aceite, 1L".to_string(),
                reason: "Regular replenishment (Last: 40d ago, Avg Int: 45.0d)".to_string(),
                suggested_quantity: 1,
                frequency: Some(4),
            }],
            discovery: vec![Recommendation {
                id: "2".to_string(),
                name: "Hummus".to_string(),
                reason: "Haven't bought in 90 days (Avg: 14.0)".to_string(),
                suggested_quantity: 1,
                frequency: None,
            }],
        };

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cart.csv");
        export_result_to_csv(&result, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "List,ID,Name,Suggested Qty,Frequency,Reason");
        assert!(lines[1].starts_with("smart_cart,1,\"Aceite, 1L\",1,4,"));
        assert!(lines[2].starts_with("discovery,2,Hummus,1,,"));
    }
}
