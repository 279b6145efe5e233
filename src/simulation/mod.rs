mod measure;
mod signal;

pub use measure::{HeartRateMeasurement, measure_heart_rate};
pub use signal::{PpgConfig, generate_ppg_signal, square_wave};
