use salix_core::prelude::*;

/// Strategy that always returns [`Status::Success`].
#[derive(Debug, Copy, Clone, Default)]
pub struct SuccessStrategy {}

impl Strategy for SuccessStrategy {
    fn process(&mut self) -> Status {
        Status::Success
    }
}

/// Strategy that always returns [`Status::Failure`].
#[derive(Debug, Copy, Clone, Default)]
pub struct FailureStrategy {}

impl Strategy for FailureStrategy {
    fn process(&mut self) -> Status {
        Status::Failure
    }
}

/// Strategy that always returns [`Status::Running`].
#[derive(Debug, Copy, Clone, Default)]
pub struct RunningStrategy {}

impl Strategy for RunningStrategy {
    fn process(&mut self) -> Status {
        Status::Running
    }
}
