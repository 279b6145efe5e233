use super::{Formatter, ReportEvent};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn seconds(elapsed_ms: u64) -> f64 {
    elapsed_ms as f64 / 1000.0
}

impl Formatter for TextFormatter {
    fn format(&self, event: &ReportEvent) -> Option<String> {
        match event {
            ReportEvent::Beat(beat) if self.verbose => Some(format!(
                "Beat: {:>3} BPM (IBI {:>4} ms) at {:>8.3} s [amp: {}, session: {}]",
                beat.bpm,
                beat.ibi_ms,
                seconds(beat.elapsed_ms),
                beat.amplitude,
                beat.session
            )),
            ReportEvent::Beat(beat) => Some(format!(
                "Beat: {:>3} BPM (IBI {:>4} ms) at {:>8.3} s",
                beat.bpm,
                beat.ibi_ms,
                seconds(beat.elapsed_ms)
            )),
            ReportEvent::SessionStart {
                session,
                elapsed_ms,
            } if self.verbose => Some(format!(
                "--- session {} started at {:.3} s ---",
                session,
                seconds(*elapsed_ms)
            )),
            ReportEvent::SessionEnd {
                session,
                elapsed_ms,
            } if self.verbose => Some(format!(
                "--- session {} ended at {:.3} s ---",
                session,
                seconds(*elapsed_ms)
            )),
            ReportEvent::Stopped { elapsed_ms } => {
                Some(format!("Stopped after {:.3} s", seconds(*elapsed_ms)))
            }
            _ => None,
        }
    }
}
