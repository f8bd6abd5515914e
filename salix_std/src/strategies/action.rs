use salix_core::prelude::*;

/// Strategy that runs a callback and reports [`Status::Success`].
///
/// The fire-and-forget leaf: play a sound, bump a counter, write to the
/// world. Anything that can fail or takes more than a tick wants
/// [`ConditionStrategy`](crate::strategies::ConditionStrategy) or a custom
/// [`Strategy`] instead.
pub struct ActionStrategy<F> {
    action: F,
}

impl<F: FnMut()> ActionStrategy<F> {
    pub fn new(action: F) -> Self {
        ActionStrategy { action }
    }
}

impl<F> std::fmt::Debug for ActionStrategy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionStrategy").finish_non_exhaustive()
    }
}

impl<F: FnMut() + 'static> Strategy for ActionStrategy<F> {
    fn process(&mut self) -> Status {
        (self.action)();
        Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_the_callback_and_succeeds() {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        let mut action = ActionStrategy::new(move || inner.set(inner.get() + 1));
        assert_eq!(action.process(), Status::Success);
        assert_eq!(action.process(), Status::Success);
        assert_eq!(count.get(), 2);
    }
}
