mod fixed;
pub use fixed::{FailureStrategy, RunningStrategy, SuccessStrategy};

mod action;
pub use action::ActionStrategy;

mod condition;
pub use condition::ConditionStrategy;

mod scripted;
pub use scripted::ScriptedStrategy;

mod patrol;
pub use patrol::PatrolStrategy;
