use salix_core::prelude::*;

/// Strategy that evaluates a predicate: [`Status::Success`] when it holds,
/// [`Status::Failure`] when it does not.
pub struct ConditionStrategy<F> {
    predicate: F,
}

impl<F: FnMut() -> bool> ConditionStrategy<F> {
    pub fn new(predicate: F) -> Self {
        ConditionStrategy { predicate }
    }
}

impl<F> std::fmt::Debug for ConditionStrategy<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionStrategy").finish_non_exhaustive()
    }
}

impl<F: FnMut() -> bool + 'static> Strategy for ConditionStrategy<F> {
    fn process(&mut self) -> Status {
        if (self.predicate)() {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn follows_the_predicate() {
        let armed = Rc::new(Cell::new(false));
        let inner = armed.clone();
        let mut condition = ConditionStrategy::new(move || inner.get());
        assert_eq!(condition.process(), Status::Failure);
        armed.set(true);
        assert_eq!(condition.process(), Status::Success);
    }
}
