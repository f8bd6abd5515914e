/// The tree container and the tick algorithms of every composite.
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::{debug, trace};

use crate::node::{Behavior, Node, NodeKind};
use crate::{NodeError, NodeId, Status, Strategy};

/// Container lifecycle. Ticking is only allowed once the order assignment
/// pass has run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeState {
    Uninitialized,
    Ready,
}

/// Owns the flat registry of nodes and drives their execution.
///
/// Structural mutation (`add_node`, `add_child`, `set_priority`) is an
/// authoring-time affair; once [`Tree::initialize`] has run, the host calls
/// [`Tree::tick`] once per simulation step and reacts to the returned
/// [`Status`]. Nothing here is designed for access from multiple threads.
#[derive(Debug)]
pub struct Tree {
    nodes: HashMap<NodeId, RefCell<Node>>,
    ids: Vec<NodeId>,
    root: Option<NodeId>,
    state: TreeState,
    rng: RefCell<SmallRng>,
}

impl Tree {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Seeded construction, for deterministic replay of shuffles and
    /// weighted picks.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Tree {
            nodes: HashMap::new(),
            ids: Vec::new(),
            root: None,
            state: TreeState::Uninitialized,
            rng: RefCell::new(rng),
        }
    }

    /// Register a node with a freshly generated id.
    pub fn add_node(&mut self, name: &str, behavior: Behavior) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, RefCell::new(Node::new(name, behavior)));
        self.ids.push(id);
        id
    }

    /// Register a node under a caller-supplied stable id.
    pub fn try_add_node(
        &mut self,
        id: NodeId,
        name: &str,
        behavior: Behavior,
    ) -> Result<NodeId, NodeError> {
        if self.nodes.contains_key(&id) {
            return Err(format!("node {id:?} is already present").into());
        }
        self.nodes.insert(id, RefCell::new(Node::new(name, behavior)));
        self.ids.push(id);
        Ok(id)
    }

    pub fn set_root(&mut self, id: NodeId) -> Result<(), NodeError> {
        self.cell(id)?;
        self.root = Some(id);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    /// All registered ids, in registration order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.ids.clone()
    }

    fn cell(&self, id: NodeId) -> Result<&RefCell<Node>, NodeError> {
        self.nodes
            .get(&id)
            .ok_or_else(|| format!("unknown node {id:?}").into())
    }

    /// Append `child` to `parent`, in authoring order.
    ///
    /// The child picks up its weak parent edge here; a random-rate parent
    /// also gets the child's weighted entries appended, computed from the
    /// priorities as they stand right now.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.cell(child)?;
        {
            let p = self.cell(parent)?.borrow();
            if matches!(p.behavior, Behavior::Leaf { .. }) {
                return Err(format!("leaf '{}' cannot have children", p.name).into());
            }
        }
        // Walk the parent chain; attaching an ancestor below one of its
        // descendants would close a loop.
        let mut up = Some(parent);
        while let Some(a) = up {
            if a == child {
                return Err("adding this child would make the graph cyclic".into());
            }
            up = self.cell(a)?.borrow().parent;
        }
        {
            let mut c = self.cell(child)?.borrow_mut();
            if c.parent.is_some() {
                return Err(format!("node '{}' already has a parent", c.name).into());
            }
            c.parent = Some(parent);
        }
        let mut p = self.cell(parent)?.borrow_mut();
        p.children.push(child);
        if matches!(p.behavior, Behavior::RandomRateSelector { .. }) {
            let entries = self.weight_entries(&p.children, child)?;
            if let Behavior::RandomRateSelector { weighted } = &mut p.behavior {
                weighted.extend(entries);
            }
        }
        Ok(())
    }

    /// Assign a node's priority.
    ///
    /// Dependent caches are maintained synchronously before this returns:
    /// a random-rate parent has the node's old weighted entries dropped and
    /// fresh ones appended. Entries of siblings are deliberately left as
    /// they are until the next reset, matching the incremental upkeep of
    /// the weighted list.
    pub fn set_priority(&mut self, id: NodeId, priority: i32) -> Result<(), NodeError> {
        let parent = {
            let mut n = self.cell(id)?.borrow_mut();
            n.priority = priority;
            n.parent
        };
        let Some(parent) = parent else {
            return Ok(());
        };
        let mut p = self.cell(parent)?.borrow_mut();
        if matches!(p.behavior, Behavior::RandomRateSelector { .. }) {
            let fresh = self.weight_entries(&p.children, id)?;
            if let Behavior::RandomRateSelector { weighted } = &mut p.behavior {
                weighted.retain(|&w| w != id);
                weighted.extend(fresh);
            }
        }
        Ok(())
    }

    /// Weighted entries for one child: `round(100 * priority / total)`
    /// copies of its id, the total taken over all the given children.
    fn weight_entries(
        &self,
        children: &[NodeId],
        child: NodeId,
    ) -> Result<Vec<NodeId>, NodeError> {
        let mut total = 0.0f32;
        for &c in children {
            total += self.cell(c)?.try_borrow()?.priority as f32;
        }
        let priority = self.cell(child)?.try_borrow()?.priority as f32;
        let weight = if total > 0.0 { priority / total } else { 0.0 };
        let count = (weight * 100.0).round() as usize;
        Ok(vec![child; count])
    }

    fn rebuild_weights(&self, children: &[NodeId]) -> Result<Vec<NodeId>, NodeError> {
        let mut weighted = Vec::new();
        for &c in children {
            weighted.extend(self.weight_entries(children, c)?);
        }
        Ok(weighted)
    }

    /// Assign traversal orders and mark the tree ready for ticking.
    ///
    /// Without a root this does nothing. Otherwise every registered node is
    /// reset to order `-1`, after which nodes reachable from the root get
    /// their pre-order visit index: the root is visited first and receives
    /// order 0. Unreachable nodes keep `-1`. Safe to call again after
    /// further authoring.
    pub fn initialize(&mut self) -> Result<(), NodeError> {
        let Some(root) = self.root else {
            return Ok(());
        };
        for id in &self.ids {
            self.cell(*id)?.borrow_mut().order = -1;
        }
        let mut order = 0;
        self.assign_order(root, &mut order)?;
        self.state = TreeState::Ready;
        debug!(nodes = self.ids.len(), reachable = order, "tree initialized");
        Ok(())
    }

    fn assign_order(&self, id: NodeId, order: &mut i32) -> Result<(), NodeError> {
        let mut n = self
            .cell(id)?
            .try_borrow_mut()
            .map_err(|_| format!("node {id:?} is its own ancestor, graph is not a tree"))?;
        if n.order != -1 {
            return Err(format!("node '{}' is reachable twice, graph is not a tree", n.name).into());
        }
        n.order = *order;
        *order += 1;
        let children = n.children.clone();
        drop(n);
        for c in children {
            self.assign_order(c, order)?;
        }
        Ok(())
    }

    /// The host-facing entry point: tick the root once and hand back its
    /// status verbatim. What to do about a finished cycle is the host's
    /// call, the tree performs no top-level reset of its own.
    pub fn tick(&mut self) -> Result<Status, NodeError> {
        if self.state != TreeState::Ready {
            return Err("tree has not been initialized".into());
        }
        let root = self.root.ok_or("tree has no root")?;
        self.run(root)
    }

    /// Tick an arbitrary subtree.
    pub fn run(&self, id: NodeId) -> Result<Status, NodeError> {
        let mut guard = self
            .cell(id)?
            .try_borrow_mut()
            .map_err(|_| format!("node {id:?} is already on the tick path, graph is not a tree"))?;
        let node = &mut *guard;
        let status = match &mut node.behavior {
            Behavior::Leaf { strategy } => strategy.process(),
            Behavior::Sequence { cursor } => self.tick_sequence(&node.children, cursor)?,
            Behavior::Selector { cursor } => self.tick_selector(&node.children, cursor)?,
            Behavior::PrioritySelector { sorted } => {
                self.tick_priority_selector(&node.children, sorted)?
            }
            Behavior::RandomSelector { order, cursor } => {
                self.tick_random_selector(&node.children, order, cursor)?
            }
            Behavior::RandomRateSelector { weighted } => {
                self.tick_random_rate_selector(&node.children, weighted)?
            }
            Behavior::Inverter => {
                if node.children.len() != 1 {
                    return Err(
                        format!("inverter '{}' must have exactly one child", node.name).into()
                    );
                }
                match self.run(node.children[0])? {
                    Status::Running => Status::Running,
                    Status::Failure => Status::Success,
                    Status::Success => Status::Failure,
                }
            }
            Behavior::UntilFail => {
                if node.children.len() != 1 {
                    return Err(
                        format!("until-fail '{}' must have exactly one child", node.name).into()
                    );
                }
                if self.run(node.children[0])? == Status::Failure {
                    self.reset(node.children[0])?;
                    Status::Failure
                } else {
                    Status::Running
                }
            }
            Behavior::SequenceDepend { depend, cursor } => {
                let depend = *depend;
                if self.run(depend)? == Status::Failure {
                    *cursor = 0;
                    self.reset_children(&node.children)?;
                    Status::Failure
                } else {
                    self.tick_sequence(&node.children, cursor)?
                }
            }
        };
        trace!(name = %node.name, kind = %node.behavior.kind(), ?status, "tick");
        Ok(status)
    }

    fn tick_sequence(&self, children: &[NodeId], cursor: &mut usize) -> Result<Status, NodeError> {
        if *cursor == children.len() {
            *cursor = 0;
            self.reset_children(children)?;
            return Ok(Status::Success);
        }
        match self.run(children[*cursor])? {
            Status::Running => Ok(Status::Running),
            Status::Failure => {
                // Restart from the first child on the next tick; the
                // children keep whatever state they have until then.
                *cursor = 0;
                Ok(Status::Failure)
            }
            Status::Success => {
                *cursor += 1;
                if *cursor == children.len() {
                    Ok(Status::Success)
                } else {
                    Ok(Status::Running)
                }
            }
        }
    }

    fn tick_selector(&self, children: &[NodeId], cursor: &mut usize) -> Result<Status, NodeError> {
        if *cursor < children.len() {
            match self.run(children[*cursor])? {
                Status::Running => Ok(Status::Running),
                Status::Success => {
                    *cursor = 0;
                    self.reset_children(children)?;
                    Ok(Status::Success)
                }
                Status::Failure => {
                    // Advancing past a failed child costs a tick, so the
                    // failure of the final child only surfaces on the tick
                    // after it.
                    *cursor += 1;
                    Ok(Status::Running)
                }
            }
        } else {
            *cursor = 0;
            self.reset_children(children)?;
            Ok(Status::Failure)
        }
    }

    fn tick_priority_selector(
        &self,
        children: &[NodeId],
        sorted: &mut Option<Vec<NodeId>>,
    ) -> Result<Status, NodeError> {
        let order = match sorted {
            Some(order) => order.clone(),
            None => {
                let order = self.sorted_children(children)?;
                *sorted = Some(order.clone());
                order
            }
        };
        // Every tick walks from the highest priority down, so a child that
        // starts succeeding again preempts a lower one that was Running.
        for c in order {
            match self.run(c)? {
                Status::Running => return Ok(Status::Running),
                Status::Success => {
                    *sorted = None;
                    self.reset_children(children)?;
                    return Ok(Status::Success);
                }
                Status::Failure => continue,
            }
        }
        *sorted = None;
        self.reset_children(children)?;
        Ok(Status::Failure)
    }

    /// Descending priority; the sort is stable, ties keep authoring order.
    fn sorted_children(&self, children: &[NodeId]) -> Result<Vec<NodeId>, NodeError> {
        let mut keyed = Vec::with_capacity(children.len());
        for &c in children {
            keyed.push((c, self.cell(c)?.try_borrow()?.priority));
        }
        keyed.sort_by_key(|&(_, priority)| std::cmp::Reverse(priority));
        Ok(keyed.into_iter().map(|(c, _)| c).collect())
    }

    fn tick_random_selector(
        &self,
        children: &[NodeId],
        order: &mut Option<Vec<NodeId>>,
        cursor: &mut usize,
    ) -> Result<Status, NodeError> {
        let order_now = match order {
            Some(o) => o.clone(),
            None => {
                let mut o = children.to_vec();
                o.shuffle(&mut *self.rng.borrow_mut());
                *cursor = 0;
                debug!(children = o.len(), "random selector shuffled");
                *order = Some(o.clone());
                o
            }
        };
        if *cursor < order_now.len() {
            match self.run(order_now[*cursor])? {
                Status::Running => Ok(Status::Running),
                // Success and the first failure both end the run; the next
                // invocation starts from a fresh shuffle.
                status => {
                    *order = None;
                    *cursor = 0;
                    self.reset_children(children)?;
                    Ok(status)
                }
            }
        } else {
            *order = None;
            *cursor = 0;
            self.reset_children(children)?;
            Ok(Status::Failure)
        }
    }

    fn tick_random_rate_selector(
        &self,
        children: &[NodeId],
        weighted: &mut Vec<NodeId>,
    ) -> Result<Status, NodeError> {
        if weighted.is_empty() {
            // No children, or every priority is zero. Not an error.
            return Ok(Status::Failure);
        }
        let pick = weighted[self.rng.borrow_mut().gen_range(0..weighted.len())];
        match self.run(pick)? {
            Status::Running => Ok(Status::Running),
            status => {
                self.reset_children(children)?;
                *weighted = self.rebuild_weights(children)?;
                Ok(status)
            }
        }
    }

    /// Recursively reset a subtree: cursors back to the start, cached
    /// orderings dropped, weighted lists rebuilt from the current
    /// priorities, leaf strategies told to clear their progress.
    ///
    /// This is also the cancellation primitive: a Running subtree that
    /// should be abandoned is reset.
    pub fn reset(&self, id: NodeId) -> Result<(), NodeError> {
        let mut guard = self
            .cell(id)?
            .try_borrow_mut()
            .map_err(|_| format!("node {id:?} is already being reset, graph is not a tree"))?;
        let node = &mut *guard;
        match &mut node.behavior {
            Behavior::Leaf { strategy } => {
                strategy.reset();
                return Ok(());
            }
            Behavior::Sequence { cursor }
            | Behavior::Selector { cursor }
            | Behavior::SequenceDepend { cursor, .. } => *cursor = 0,
            Behavior::PrioritySelector { sorted } => *sorted = None,
            Behavior::RandomSelector { order, cursor } => {
                *order = None;
                *cursor = 0;
            }
            // Rebuilt below, once the children are settled.
            Behavior::RandomRateSelector { .. } => {}
            Behavior::Inverter | Behavior::UntilFail => {}
        }
        for i in 0..node.children.len() {
            self.reset(node.children[i])?;
        }
        if matches!(node.behavior, Behavior::RandomRateSelector { .. }) {
            let weighted = self.rebuild_weights(&node.children)?;
            if let Behavior::RandomRateSelector { weighted: w } = &mut node.behavior {
                *w = weighted;
            }
        }
        Ok(())
    }

    fn reset_children(&self, children: &[NodeId]) -> Result<(), NodeError> {
        for &c in children {
            self.reset(c)?;
        }
        Ok(())
    }

    /// Pre-order visit of the subtree under `id`.
    pub fn traverse(
        &self,
        id: NodeId,
        visit: &mut dyn FnMut(NodeId, &Node),
    ) -> Result<(), NodeError> {
        let node = self.cell(id)?.try_borrow()?;
        visit(id, &node);
        let children = node.children.clone();
        drop(node);
        for c in children {
            self.traverse(c, visit)?;
        }
        Ok(())
    }

    pub fn name(&self, id: NodeId) -> Result<String, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.name.clone())
    }

    pub fn priority(&self, id: NodeId) -> Result<i32, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.priority)
    }

    pub fn order(&self, id: NodeId) -> Result<i32, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.order)
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.children.clone())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.parent)
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, NodeError> {
        Ok(self.cell(id)?.try_borrow()?.behavior.kind())
    }

    /// Mutable access to a leaf's strategy, e.g. for wiring host data into
    /// it or downcasting to the concrete type.
    pub fn strategy_mut(&self, id: NodeId) -> Result<RefMut<'_, Box<dyn Strategy>>, NodeError> {
        let node = self.cell(id)?.try_borrow_mut()?;
        RefMut::filter_map(node, |n| match &mut n.behavior {
            Behavior::Leaf { strategy } => Some(strategy),
            _ => None,
        })
        .map_err(|_| format!("node {id:?} is not a leaf").into())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
