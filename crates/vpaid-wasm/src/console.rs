//! Browser console sink for the controller's `tracing` events
//!
//! Only warnings and errors are forwarded, so refused skips, ignored calls and
//! rejected attribute values show up next to the player's own logs.

use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Install the console layer as the global subscriber.
///
/// A no-op when a subscriber is already set.
pub fn install() {
    let _ = tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(LevelFilter::WARN))
        .try_init();
}

struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let level = *event.metadata().level();
        let line = fields.line(level);

        if level == Level::ERROR {
            web_sys::console::error_1(&line.into());
        } else if level == Level::WARN {
            web_sys::console::warn_1(&line.into());
        } else {
            web_sys::console::log_1(&line.into());
        }
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    pairs: Vec<String>,
}

impl EventFields {
    /// `[VPAID] WARN message key=value ...`
    fn line(&self, level: Level) -> String {
        let mut line = format!("[VPAID] {} {}", level, self.message);
        for pair in &self.pairs {
            line.push(' ');
            line.push_str(pair);
        }
        line
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.pairs.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.pairs.push(format!("{}={:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let fields = EventFields {
            message: "skipAd ignored".to_string(),
            pairs: vec!["state=stopped".to_string()],
        };
        assert_eq!(fields.line(Level::WARN), "[VPAID] WARN skipAd ignored state=stopped");
    }

    #[test]
    fn test_line_without_fields() {
        let fields = EventFields {
            message: "Attribute update rejected".to_string(),
            pairs: Vec::new(),
        };
        assert_eq!(fields.line(Level::ERROR), "[VPAID] ERROR Attribute update rejected");
    }
}
