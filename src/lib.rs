pub mod config;
pub mod error;
pub mod output;
pub mod processing;
pub mod pulse;
pub mod source;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use processing::PulseProcessor;
pub use pulse::HeartRateMonitor;
pub use wav::save_wav;
