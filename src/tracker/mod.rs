pub mod classifier;
pub mod engine;
pub mod progress;
pub mod selector;
pub mod types;

pub use engine::{TrackerError, UserTracker};
