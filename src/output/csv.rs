use super::{Formatter, ReportEvent, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, event: &ReportEvent) -> Option<String> {
        let ReportEvent::Beat(beat) = event else {
            return None;
        };
        Some(format!(
            "{},{},{},{},{},{}",
            iso8601_timestamp(),
            beat.session,
            beat.elapsed_ms,
            beat.ibi_ms,
            beat.bpm,
            beat.amplitude
        ))
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,session,elapsed_ms,ibi_ms,bpm,amplitude")
    }
}
