use salix_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy that replays a fixed status sequence, then holds the final
/// entry for every tick after that. [`Strategy::reset`] rewinds to the
/// start.
///
/// An empty script always fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedStrategy {
    script: Vec<Status>,
    #[serde(skip)]
    cursor: usize,
}

impl ScriptedStrategy {
    pub fn new(script: impl Into<Vec<Status>>) -> Self {
        ScriptedStrategy {
            script: script.into(),
            cursor: 0,
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn process(&mut self) -> Status {
        let Some(&status) = self.script.get(self.cursor) else {
            return Status::Failure;
        };
        if self.cursor + 1 < self.script.len() {
            self.cursor += 1;
        }
        status
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salix_core::{AsAnyHelper, Behavior, Tree};

    #[test]
    fn replays_and_holds_the_last_status() {
        let mut scripted =
            ScriptedStrategy::new([Status::Running, Status::Success, Status::Failure]);
        assert_eq!(scripted.process(), Status::Running);
        assert_eq!(scripted.process(), Status::Success);
        assert_eq!(scripted.process(), Status::Failure);
        assert_eq!(scripted.process(), Status::Failure);
        scripted.reset();
        assert_eq!(scripted.process(), Status::Running);
    }

    #[test]
    fn empty_script_fails() {
        let mut scripted = ScriptedStrategy::new([]);
        assert_eq!(scripted.process(), Status::Failure);
    }

    #[test]
    fn reachable_behind_a_leaf_by_downcast() -> Result<(), NodeError> {
        let mut tree = Tree::with_seed(0);
        let leaf = tree.add_node(
            "scripted",
            Behavior::leaf(ScriptedStrategy::new([Status::Failure])),
        );
        tree.set_root(leaf)?;
        tree.initialize()?;
        assert_eq!(tree.tick()?, Status::Failure);
        // The host can reach back in and swap the script out.
        {
            let mut strategy = tree.strategy_mut(leaf)?;
            let scripted = (**strategy)
                .downcast_mut::<ScriptedStrategy>()
                .ok_or("not a scripted strategy")?;
            *scripted = ScriptedStrategy::new([Status::Success]);
        }
        assert_eq!(tree.tick()?, Status::Success);
        Ok(())
    }
}
