//! Output formatting for CLI

use serde::Serialize;
use tabled::{Table, Tabled};
use vpaid_core::{AdEvent, AttributeSet};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Pretty JSON for machine consumers
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render the attribute store as a two-column table
pub fn attribute_table(attributes: &AttributeSet) -> String {
    let rows = attributes.entries().into_iter().map(|(field, value)| AttributeRow {
        name: field.name(),
        value: value.to_string(),
    });
    Table::new(rows).to_string()
}

/// One line per delivered event, numbered from 1
pub fn event_log(events: &[AdEvent]) -> String {
    if events.is_empty() {
        return "  (no events)".to_string();
    }
    events
        .iter()
        .enumerate()
        .map(|(i, event)| format!("  {:>2}. {}", i + 1, console::style(event).cyan()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_attribute_table_lists_every_field() {
        let table = attribute_table(&AttributeSet::new());
        assert!(table.contains("Attribute"));
        assert!(table.contains("volume"));
        assert!(table.contains("skippableState"));
    }

    #[test]
    fn test_empty_event_log() {
        assert_eq!(event_log(&[]), "  (no events)");
    }
}
