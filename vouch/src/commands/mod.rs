// vouch/src/commands/mod.rs

pub mod checkpoint;
pub mod clean;
pub mod docs;
pub mod profile;
pub mod run;
pub mod suite;

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use vouch_core::domain::validation::ValidationResult;

/// One row per expectation outcome, in declaration order.
pub fn outcome_table(result: &ValidationResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Column", "Expectation", "Severity", "Status", "Unexpected"]);
    for (i, outcome) in result.results.iter().enumerate() {
        let observed = &outcome.observed;
        let unexpected = match observed.observed_value {
            Some(v) => format!("observed {:.4}", v),
            None => format!(
                "{} ({:.2}%)",
                observed.unexpected_count,
                observed.unexpected_fraction * 100.0
            ),
        };
        table.add_row(vec![
            (i + 1).to_string(),
            outcome.expectation.column.clone(),
            outcome.expectation.rule.describe(),
            outcome.expectation.severity.to_string(),
            if outcome.met { "✅ met" } else { "❌ not met" }.to_string(),
            unexpected,
        ]);
    }
    table
}
