use crate::models::{AnalysisResult, Recommendation};
use colored::*;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

pub fn display_result_enhanced(result: &AnalysisResult) {
    let generated = result.generated_at.format("%Y-%m-%d %H:%M:%S UTC");
    println!("{}", "═".repeat(80).bright_black());
    println!(
        "{}  {}",
        "🛒 Smart Cart Recommendations".bright_blue().bold(),
        format!("Generated {}", generated).dimmed()
    );
    println!("{}", "═".repeat(80).bright_black());

    if result.recommendations.is_empty() {
        println!("{}", "Nothing is due for replenishment right now.".dimmed());
    }
    for item in &result.recommendations {
        println!(
            "{} {} {}",
            format!("[{}x]", item.suggested_quantity).bright_green().bold(),
            item.name,
            format!("({})", item.reason).dimmed()
        );
    }

    println!();
    println!("{}", "─".repeat(80).bright_black());
    println!(
        "{}",
        "🔎 Discovery / Forgotten Items".bright_yellow().bold()
    );
    println!("{}", "─".repeat(80).bright_black());

    if result.discovery.is_empty() {
        println!("{}", "No lapsed favourites.".dimmed());
    }
    for item in &result.discovery {
        println!("{} {} - {}", "[?]".yellow(), item.name, item.reason.dimmed());
    }

    println!("{}", "═".repeat(80).bright_black());
}

pub fn display_result_table(result: &AnalysisResult) {
    if result.is_empty() {
        println!("{}", "No suggestions for now.".dimmed());
        return;
    }

    println!("{}", "Smart Cart".bold());
    println!("{}", recommendation_table(&result.recommendations, true));

    if !result.discovery.is_empty() {
        println!("{}", "Discovery".bold());
        println!("{}", recommendation_table(&result.discovery, false));
    }
}

pub fn display_result_json(result: &AnalysisResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result to JSON: {}", e),
    }
}

fn recommendation_table(items: &[Recommendation], with_frequency: bool) -> Table {
    let mut header = vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Suggested Qty").fg(Color::Green),
    ];
    if with_frequency {
        header.push(Cell::new("Frequency").fg(Color::Yellow));
    }
    header.push(Cell::new("Reason").fg(Color::White));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);

    for item in items {
        let mut row = vec![
            Cell::new(&item.id),
            Cell::new(truncate_text(&item.name, 40)),
            Cell::new(item.suggested_quantity).fg(Color::Green),
        ];
        if with_frequency {
            row.push(Cell::new(item.frequency.unwrap_or_default()).fg(Color::Yellow));
        }
        row.push(Cell::new(&item.reason));
        table.add_row(row);
    }

    table
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very-long-product-name", 10), "very-lo...");
        assert_eq!(truncate_text("Piña natural troceada", 8), "Piña ...");
    }

    #[test]
    fn test_recommendation_table_columns() {
        let items = vec![Recommendation {
            id: "5".to_string(),
            name: "Queso".to_string(),
            reason: "Regular replenishment (Last: 9d ago, Avg Int: 12.0d)".to_string(),
            suggested_quantity: 1,
            frequency: Some(7),
        }];

        let rendered = recommendation_table(&items, true).to_string();
        assert!(rendered.contains("Frequency"));
        assert!(rendered.contains("Queso"));

        let rendered = recommendation_table(&items, false).to_string();
        assert!(!rendered.contains("Frequency"));
    }
}
