//! Line protocol of the sensor board's UART reporter.
//!
//! - `S`: a reporting window started
//! - `<ibi>`: decimal inter-beat interval in milliseconds, one per reported beat
//! - `E`: the window ended
//! - `F`: acquisition was switched off
//!
//! Lines are terminated with CR LF.

use super::{Formatter, ReportEvent};

pub struct SerialFormatter;

impl Formatter for SerialFormatter {
    fn format(&self, event: &ReportEvent) -> Option<String> {
        let line = match event {
            ReportEvent::SessionStart { .. } => "S".to_string(),
            ReportEvent::Beat(beat) => beat.ibi_ms.to_string(),
            ReportEvent::SessionEnd { .. } => "E".to_string(),
            ReportEvent::Stopped { .. } => "F".to_string(),
        };
        Some(line)
    }

    fn line_ending(&self) -> &'static str {
        "\r\n"
    }
}
