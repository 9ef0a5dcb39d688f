pub mod history;
pub mod peak;

pub use history::MagnitudeHistory;
pub use peak::{PeakDetector, Thresholds};
