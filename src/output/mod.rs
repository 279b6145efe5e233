mod csv;
mod json;
mod serial;
mod text;

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::serial::SerialFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Serial,
    Json,
    Csv,
}

/// A beat that passed the reporting gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BeatReport {
    pub session: u64,
    /// Time since processing started in milliseconds
    pub elapsed_ms: u64,
    pub ibi_ms: u16,
    pub bpm: u16,
    pub amplitude: u16,
}

/// Events emitted by the processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    SessionStart { session: u64, elapsed_ms: u64 },
    Beat(BeatReport),
    SessionEnd { session: u64, elapsed_ms: u64 },
    Stopped { elapsed_ms: u64 },
}

pub trait Formatter: Send {
    /// Render one event, or `None` if this format does not show it
    fn format(&self, event: &ReportEvent) -> Option<String>;

    fn header(&self) -> Option<&'static str> {
        None
    }

    fn line_ending(&self) -> &'static str {
        "\n"
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Serial => Box::new(SerialFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat() -> ReportEvent {
        ReportEvent::Beat(BeatReport {
            session: 1,
            elapsed_ms: 12_345,
            ibi_ms: 768,
            bpm: 78,
            amplitude: 420,
        })
    }

    #[test]
    fn test_text_format() {
        let f = create_formatter(OutputFormat::Text, false);
        assert_eq!(
            f.format(&beat()).unwrap(),
            "Beat:  78 BPM (IBI  768 ms) at   12.345 s"
        );
        assert!(f.header().is_none());
    }

    #[test]
    fn test_serial_protocol() {
        let f = create_formatter(OutputFormat::Serial, false);
        let start = ReportEvent::SessionStart {
            session: 1,
            elapsed_ms: 0,
        };
        let end = ReportEvent::SessionEnd {
            session: 1,
            elapsed_ms: 60_000,
        };
        assert_eq!(f.format(&start).unwrap(), "S");
        assert_eq!(f.format(&beat()).unwrap(), "768");
        assert_eq!(f.format(&end).unwrap(), "E");
        assert_eq!(f.format(&ReportEvent::Stopped { elapsed_ms: 1 }).unwrap(), "F");
        assert_eq!(f.line_ending(), "\r\n");
    }

    #[test]
    fn test_json_format_is_tagged() {
        let f = create_formatter(OutputFormat::Json, false);
        let line = f.format(&beat()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event"], "beat");
        assert_eq!(value["bpm"], 78);
        assert_eq!(value["ibi_ms"], 768);
        assert!(value["ts"].is_string());
    }

    #[test]
    fn test_csv_skips_markers() {
        let f = create_formatter(OutputFormat::Csv, false);
        assert_eq!(f.header(), Some("ts,session,elapsed_ms,ibi_ms,bpm,amplitude"));
        let row = f.format(&beat()).unwrap();
        assert!(row.ends_with(",1,12345,768,78,420"));
        assert!(
            f.format(&ReportEvent::SessionStart {
                session: 1,
                elapsed_ms: 0
            })
            .is_none()
        );
    }
}
