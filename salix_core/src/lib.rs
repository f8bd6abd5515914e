/*
    All tree execution is single threaded and cooperative. The host ticks
    the tree once per simulation step and reacts to the status that comes
    back; Running is the only continuation mechanism, a node that returns
    it resumes from its own stored state on the next tick. Resetting a
    subtree is the cancellation primitive.

    Nodes live in a flat registry keyed by stable ids, with children held
    as id lists. The call stack descends through interior mutability; the
    same node showing up twice on one descent means the graph is not a
    tree, and the tick fails on the spot instead of corrupting state.
*/

pub mod node;
pub mod tree;

pub mod prelude {
    pub use crate::{Behavior, NodeError, NodeId, Status, Strategy, Tree};
}

mod as_any;
pub use as_any::{AsAny, AsAnyHelper};

pub use node::{Behavior, Node, NodeKind};
pub use tree::{Tree, TreeState};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The result states returned by a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
    Running,
}

/// The error type.
///
/// An `Err` halts tree execution on the spot; ordinary behaviour failure is
/// propagated as [`Status::Failure`] in the `Ok` value instead.
pub type NodeError = Box<dyn std::error::Error + Send + Sync>;

/// The capability a leaf delegates to.
///
/// Implementations are supplied by the host (conditions, actions, whatever
/// the agent can do); the engine only ever calls these two operations and
/// makes no assumption about the internals.
pub trait Strategy: std::fmt::Debug + AsAny {
    /// Advance the behaviour by one tick.
    fn process(&mut self) -> Status;

    /// Clear internal progress, e.g. invalidate a cached path.
    fn reset(&mut self) {}
}

/// Stable node handle.
///
/// UUIDs rather than indices so that handles stay valid no matter what the
/// authoring tooling does to the rest of the graph; internally the tree is
/// free to organize storage however it wants.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Debug, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}
