/// Sample-counted hold-off between reported beats
///
/// Reporters use this to rate-limit beat reports independently of the
/// detector's own timing gates. The gate opens once `hold_off_samples` samples
/// have been counted since it was last armed.
#[derive(Debug, Clone)]
pub struct RefractoryGate {
    hold_off_samples: u32,
    remaining: u32,
}

impl RefractoryGate {
    /// Create an open gate
    pub fn new(hold_off_samples: u32) -> Self {
        Self {
            hold_off_samples,
            remaining: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.remaining == 0
    }

    /// Close the gate for the configured number of samples
    pub fn arm(&mut self) {
        self.remaining = self.hold_off_samples;
    }

    /// Count one elapsed sample
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Open the gate and arm it in one step; returns whether it was open
    pub fn try_pass(&mut self) -> bool {
        if self.is_open() {
            self.arm();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_holds_for_configured_samples() {
        let mut gate = RefractoryGate::new(3);
        assert!(gate.try_pass());
        gate.tick();
        assert!(!gate.try_pass());
        gate.tick();
        assert!(!gate.try_pass());
        gate.tick();
        assert!(gate.try_pass());
    }

    #[test]
    fn test_zero_hold_off_never_blocks() {
        let mut gate = RefractoryGate::new(0);
        assert!(gate.try_pass());
        assert!(gate.try_pass());
    }

    #[test]
    fn test_reset_reopens() {
        let mut gate = RefractoryGate::new(100);
        gate.arm();
        assert!(!gate.is_open());
        gate.reset();
        assert!(gate.is_open());
    }
}
