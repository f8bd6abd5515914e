use salix_core::prelude::*;

/// Strategy that walks a list of waypoints, one `step` call per tick.
///
/// The `step` callback moves the agent toward the given waypoint and
/// reports whether it has arrived. While travelling the strategy is
/// [`Status::Running`]; arrival yields [`Status::Success`] and advances to
/// the next waypoint, wrapping around at the end. With no waypoints at all
/// every tick is [`Status::Failure`]. [`Strategy::reset`] returns to the
/// first waypoint, e.g. after the patrol was abandoned for a chase.
pub struct PatrolStrategy<P, F> {
    waypoints: Vec<P>,
    current: usize,
    step: F,
}

impl<P, F: FnMut(&P) -> bool> PatrolStrategy<P, F> {
    pub fn new(waypoints: Vec<P>, step: F) -> Self {
        PatrolStrategy {
            waypoints,
            current: 0,
            step,
        }
    }
}

impl<P, F> std::fmt::Debug for PatrolStrategy<P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatrolStrategy")
            .field("waypoints", &self.waypoints.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<P: 'static, F: FnMut(&P) -> bool + 'static> Strategy for PatrolStrategy<P, F> {
    fn process(&mut self) -> Status {
        if self.waypoints.is_empty() {
            return Status::Failure;
        }
        if (self.step)(&self.waypoints[self.current]) {
            self.current = (self.current + 1) % self.waypoints.len();
            Status::Success
        } else {
            Status::Running
        }
    }

    fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn advances_and_wraps_on_arrival() {
        let position = Rc::new(RefCell::new(0i32));
        let inner = position.clone();
        let mut patrol = PatrolStrategy::new(vec![2i32, 4], move |target| {
            let mut position = inner.borrow_mut();
            *position += 1;
            *position == *target
        });
        // Two steps to the first waypoint.
        assert_eq!(patrol.process(), Status::Running);
        assert_eq!(patrol.process(), Status::Success);
        // Two more to the second, then wrap back to the first.
        assert_eq!(patrol.process(), Status::Running);
        assert_eq!(patrol.process(), Status::Success);
        assert_eq!(patrol.current, 0);
    }

    #[test]
    fn no_waypoints_is_a_failure() {
        let mut patrol = PatrolStrategy::new(Vec::<i32>::new(), |_| true);
        assert_eq!(patrol.process(), Status::Failure);
    }

    #[test]
    fn reset_returns_to_the_first_waypoint() {
        let mut patrol = PatrolStrategy::new(vec![1i32, 2], |_| true);
        assert_eq!(patrol.process(), Status::Success);
        assert_eq!(patrol.current, 1);
        patrol.reset();
        assert_eq!(patrol.current, 0);
    }
}
