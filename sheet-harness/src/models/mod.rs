pub mod outcome;
pub mod settings;

pub use outcome::{RunOutcome, StopReason};
pub use settings::HarnessSettings;
