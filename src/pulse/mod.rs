pub mod gate;
pub mod monitor;
pub mod rate_history;
pub mod startup;

pub use gate::RefractoryGate;
pub use monitor::{Beat, HeartRateMonitor, MonitorSnapshot};
pub use rate_history::{RATE_HISTORY_LEN, RateHistory};
pub use startup::StartupPhase;
