/// Number of inter-beat intervals averaged into the BPM estimate
pub const RATE_HISTORY_LEN: usize = 10;

/// Sliding window of the most recent inter-beat intervals
///
/// Holds exactly [`RATE_HISTORY_LEN`] entries, oldest first. Entries are zero
/// until the window is seeded with the first reliable interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateHistory {
    intervals: [u16; RATE_HISTORY_LEN],
}

impl RateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every slot with the same interval
    pub fn seed(&mut self, ibi_ms: u16) {
        self.intervals = [ibi_ms; RATE_HISTORY_LEN];
    }

    /// Drop the oldest interval and append `ibi_ms` as the newest
    pub fn push(&mut self, ibi_ms: u16) {
        self.intervals.copy_within(1.., 0);
        self.intervals[RATE_HISTORY_LEN - 1] = ibi_ms;
    }

    /// Integer mean of the window in milliseconds
    pub fn average(&self) -> u32 {
        let total: u32 = self.intervals.iter().map(|&v| u32::from(v)).sum();
        total / RATE_HISTORY_LEN as u32
    }

    /// Beats per minute for the averaged interval, or 0 while the average is zero
    pub fn beats_per_minute(&self) -> u16 {
        match self.average() {
            0 => 0,
            avg => u16::try_from(60_000 / avg).unwrap_or(u16::MAX),
        }
    }

    pub fn clear(&mut self) {
        self.intervals = [0; RATE_HISTORY_LEN];
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_drops_oldest() {
        let mut history = RateHistory::new();
        history.seed(800);
        history.push(600);

        assert_eq!(history.as_slice()[0], 800);
        assert_eq!(history.as_slice()[RATE_HISTORY_LEN - 1], 600);
        assert_eq!(history.average(), (9 * 800 + 600) / 10);
    }

    #[test]
    fn test_full_roll_replaces_seed() {
        let mut history = RateHistory::new();
        history.seed(1000);
        for _ in 0..RATE_HISTORY_LEN {
            history.push(500);
        }
        assert!(history.as_slice().iter().all(|&v| v == 500));
        assert_eq!(history.beats_per_minute(), 120);
    }

    #[test]
    fn test_empty_history_has_no_rate() {
        let history = RateHistory::new();
        assert_eq!(history.average(), 0);
        assert_eq!(history.beats_per_minute(), 0);
    }

    #[test]
    fn test_average_rounds_down() {
        let mut history = RateHistory::new();
        history.seed(700);
        history.push(709);
        // (9 * 700 + 709) / 10 = 700
        assert_eq!(history.average(), 700);
        // 60000 / 700 = 85.7
        assert_eq!(history.beats_per_minute(), 85);
    }

    #[test]
    fn test_small_averages_saturate() {
        let mut history = RateHistory::new();
        history.push(1);
        // average of [0; 9] + [1] is zero
        assert_eq!(history.beats_per_minute(), 0);
        history.seed(1);
        assert_eq!(history.beats_per_minute(), 60_000);
    }
}
