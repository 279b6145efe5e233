/// Startup ladder run after every reset or silence timeout
///
/// The interval measured at the first detected beat starts from an arbitrary
/// point and is discarded. The second beat seeds the rate history so the first
/// reported BPM is realistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupPhase {
    #[default]
    AwaitingFirstBeat,
    AwaitingSecondBeat,
    Steady,
}

impl StartupPhase {
    pub fn is_first_beat(self) -> bool {
        self == Self::AwaitingFirstBeat
    }

    pub fn is_second_beat(self) -> bool {
        self == Self::AwaitingSecondBeat
    }
}
