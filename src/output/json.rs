use serde::Serialize;

use super::{Formatter, ReportEvent, iso8601_timestamp};

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    #[serde(flatten)]
    event: &'a ReportEvent,
}

impl Formatter for JsonFormatter {
    fn format(&self, event: &ReportEvent) -> Option<String> {
        let line = JsonLine {
            ts: iso8601_timestamp(),
            event,
        };
        match serde_json::to_string(&line) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("Could not serialize event: {}", e);
                None
            }
        }
    }
}
