use serde::{Deserialize, Serialize};

use crate::{NodeId, Strategy};

/// Stateless fingerprint of a [`Behavior`] variant.
///
/// Used for logging and by authoring tooling that needs to tag nodes
/// without touching their runtime state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Leaf,
    Sequence,
    Selector,
    PrioritySelector,
    RandomSelector,
    RandomRateSelector,
    Inverter,
    UntilFail,
    SequenceDepend,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Sequence => "sequence",
            NodeKind::Selector => "selector",
            NodeKind::PrioritySelector => "priority_selector",
            NodeKind::RandomSelector => "random_selector",
            NodeKind::RandomRateSelector => "random_rate_selector",
            NodeKind::Inverter => "inverter",
            NodeKind::UntilFail => "until_fail",
            NodeKind::SequenceDepend => "sequence_depend",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a node does when ticked, together with the state that behaviour
/// needs between ticks.
///
/// One variant per composite kind, dispatched by a single match in
/// [`Tree::run`](crate::Tree::run). Keeping the per-variant state here
/// rather than in subtypes means a variant can only ever touch the fields
/// it declares.
#[derive(Debug)]
pub enum Behavior {
    /// Childless node delegating to a [`Strategy`].
    Leaf { strategy: Box<dyn Strategy> },
    /// Runs children in order, one advancing per tick; fails as soon as one
    /// child fails. The cursor persists across ticks.
    Sequence { cursor: usize },
    /// Tries children in order until one succeeds; advancing past a failed
    /// child costs a tick. The cursor persists across ticks.
    Selector { cursor: usize },
    /// Walks children by descending priority from the top on every tick.
    /// `sorted` is the lazily built ordering, cleared on reset.
    PrioritySelector { sorted: Option<Vec<NodeId>> },
    /// Commits to one random permutation per run. `order` is `None` until
    /// the run's shuffle has happened.
    RandomSelector {
        order: Option<Vec<NodeId>>,
        cursor: usize,
    },
    /// Picks one child per tick, proportionally to priority. `weighted`
    /// holds each child id once per weight point.
    RandomRateSelector { weighted: Vec<NodeId> },
    /// Single child; swaps Success and Failure.
    Inverter,
    /// Single child; reruns it until it fails, never reporting Success.
    UntilFail,
    /// A Sequence gated by `depend`: if the gate fails, the whole node
    /// fails without touching the children this tick.
    SequenceDepend { depend: NodeId, cursor: usize },
}

impl Behavior {
    pub fn leaf(strategy: impl Strategy + 'static) -> Self {
        Behavior::Leaf {
            strategy: Box::new(strategy),
        }
    }

    pub fn sequence() -> Self {
        Behavior::Sequence { cursor: 0 }
    }

    pub fn selector() -> Self {
        Behavior::Selector { cursor: 0 }
    }

    pub fn priority_selector() -> Self {
        Behavior::PrioritySelector { sorted: None }
    }

    pub fn random_selector() -> Self {
        Behavior::RandomSelector {
            order: None,
            cursor: 0,
        }
    }

    pub fn random_rate_selector() -> Self {
        Behavior::RandomRateSelector {
            weighted: Vec::new(),
        }
    }

    pub fn inverter() -> Self {
        Behavior::Inverter
    }

    pub fn until_fail() -> Self {
        Behavior::UntilFail
    }

    /// `depend` is usually a leaf, but any node in the same tree works.
    pub fn sequence_depend(depend: NodeId) -> Self {
        Behavior::SequenceDepend { depend, cursor: 0 }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Behavior::Leaf { .. } => NodeKind::Leaf,
            Behavior::Sequence { .. } => NodeKind::Sequence,
            Behavior::Selector { .. } => NodeKind::Selector,
            Behavior::PrioritySelector { .. } => NodeKind::PrioritySelector,
            Behavior::RandomSelector { .. } => NodeKind::RandomSelector,
            Behavior::RandomRateSelector { .. } => NodeKind::RandomRateSelector,
            Behavior::Inverter => NodeKind::Inverter,
            Behavior::UntilFail => NodeKind::UntilFail,
            Behavior::SequenceDepend { .. } => NodeKind::SequenceDepend,
        }
    }
}

/// One node of the tree.
///
/// Owned by the [`Tree`](crate::Tree) registry; `parent` is a weak
/// back-edge for tooling and never drives execution.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) order: i32,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) behavior: Behavior,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, behavior: Behavior) -> Self {
        Node {
            name: name.into(),
            priority: 0,
            order: -1,
            children: Vec::new(),
            parent: None,
            behavior,
        }
    }

    /// Display identity, not unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Pre-order visit index assigned by initialization, `-1` before that
    /// (and for nodes not reachable from the root).
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Children in authoring order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        self.behavior.kind()
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }
}
