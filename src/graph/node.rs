use crate::backend::{Float, TensorData};
use crate::graph::Context;
use crate::ops::Function;
use std::sync::atomic::{AtomicUsize, Ordering};

/// ATOMIC auto incrementing id for every graph created in the process.
static GRAPH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Identity of one [`Graph`](crate::graph::Graph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(usize);

impl GraphId {
    pub fn new() -> Self {
        Self(GRAPH_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a node: the owning graph plus the node's slot in its arena.
/// Parents always sit at smaller indices than their children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    graph: GraphId,
    index: usize,
}

impl NodeId {
    pub(crate) fn new(graph: GraphId, index: usize) -> Self {
        Self { graph, index }
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({}:{})", self.graph.0, self.index)
    }
}

/// How a node was produced.
#[derive(Debug)]
pub enum History<T>
where
    T: Float,
{
    /// User supplied value.
    Leaf,

    /// Output of `op` applied to `parents`, in argument order.
    Derived {
        op: Box<dyn Function<T>>,
        ctx: Context<T>,
        parents: Vec<NodeId>,
    },
}

impl<T> Clone for History<T>
where
    T: Float,
{
    fn clone(&self) -> Self {
        match self {
            History::Leaf => History::Leaf,
            History::Derived { op, ctx, parents } => History::Derived {
                op: op.clone_op(),
                ctx: ctx.clone(),
                parents: parents.clone(),
            },
        }
    }
}

impl<T> History<T>
where
    T: Float,
{
    pub fn parents(&self) -> &[NodeId] {
        match self {
            History::Leaf => &[],
            History::Derived { parents, .. } => parents,
        }
    }
}

/// Computational graph node: a value, its accumulated gradient and its history.
#[derive(Debug, Clone)]
pub struct Node<T>
where
    T: Float,
{
    pub id: NodeId,
    data: TensorData<T>,
    grad: TensorData<T>,
    history: History<T>,
}

impl<T> Node<T>
where
    T: Float,
{
    pub fn new_leaf(id: NodeId, data: TensorData<T>) -> Self {
        Self::new(id, data, History::Leaf)
    }

    pub fn new_derived(
        id: NodeId,
        data: TensorData<T>,
        op: Box<dyn Function<T>>,
        ctx: Context<T>,
        parents: Vec<NodeId>,
    ) -> Self {
        Self::new(id, data, History::Derived { op, ctx, parents })
    }

    fn new(id: NodeId, data: TensorData<T>, history: History<T>) -> Self {
        let grad = data.zeros_like();
        Self {
            id,
            data,
            grad,
            history,
        }
    }

    pub fn data(&self) -> &TensorData<T> {
        &self.data
    }

    pub fn grad(&self) -> &TensorData<T> {
        &self.grad
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }

    pub fn parents(&self) -> &[NodeId] {
        self.history.parents()
    }

    pub fn is_leaf(&self) -> bool {
        self.parents().is_empty()
    }

    pub fn op_name(&self) -> Option<String> {
        match &self.history {
            History::Leaf => None,
            History::Derived { op, .. } => Some(op.name()),
        }
    }

    pub(crate) fn set_grad(&mut self, grad: TensorData<T>) {
        self.grad = grad;
    }

    pub(crate) fn release_context(&mut self) {
        if let History::Derived { ctx, .. } = &mut self.history {
            ctx.release();
        }
    }
}
