mod reducer;
mod state;

pub use reducer::{reduce, SessionAction};
pub use state::{ResultImage, SessionState, Step, StepSet, ALL_STEPS};
