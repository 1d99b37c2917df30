use crate::backend::{Backend, CpuBackend, Float, TensorData, TensorDataInfo};
use crate::error::{Error, Result};
use crate::graph::{Context, GraphConfig, GraphId, History, Node, NodeId};
use crate::ops::{self, Function};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, trace};

/// Main computational graph engine.
///
/// The graph is an arena: it owns every node created through it and nodes
/// refer to their parents by [`NodeId`]. Nodes are never removed, so a parent
/// link stays valid for as long as the graph lives. Dropping the graph tears
/// the whole computation down.
#[derive(Debug)]
pub struct Graph<T>
where
    T: Float,
{
    id: GraphId,
    nodes: Vec<Node<T>>,
    backend: Box<dyn Backend<T>>,
    config: GraphConfig,
}

impl<T> Default for Graph<T>
where
    T: Float,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T>
where
    T: Float,
{
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self::with_backend(CpuBackend::new(), config)
    }

    pub fn with_backend<B>(backend: B, config: GraphConfig) -> Self
    where
        B: Backend<T> + 'static,
    {
        Self {
            id: GraphId::new(),
            nodes: Vec::new(),
            backend: Box::new(backend),
            config,
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend<T> {
        self.backend.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node<T>> {
        if id.graph() != self.id {
            return Err(Error::ForeignNode(id.to_string()));
        }
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::ForeignNode(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<T>> {
        if id.graph() != self.id {
            return Err(Error::ForeignNode(id.to_string()));
        }
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::ForeignNode(id.to_string()))
    }

    fn next_id(&self) -> NodeId {
        NodeId::new(self.id, self.nodes.len())
    }

    // LEAF CREATION

    /// Creates a new leaf node in the computational graph
    pub fn create_tensor(&mut self, data: TensorData<T>) -> NodeId {
        let id = self.next_id();
        self.nodes.push(Node::new_leaf(id, data));
        id
    }

    pub fn tensor(&mut self, values: Vec<T>, shape: &[usize]) -> Result<NodeId> {
        let data = TensorData::from_vec(values, shape)?;
        Ok(self.create_tensor(data))
    }

    pub fn scalar(&mut self, value: T) -> NodeId {
        self.create_tensor(TensorData::scalar(value))
    }

    pub fn zeros(&mut self, shape: &[usize]) -> NodeId {
        self.create_tensor(TensorData::zeros(shape))
    }

    pub fn zeros_like(&mut self, id: NodeId) -> Result<NodeId> {
        let data = self.node(id)?.data().zeros_like();
        Ok(self.create_tensor(data))
    }

    // FUNCTION APPLICATION

    /// Runs `op` forward on `inputs` and records the result as a new node.
    #[instrument(level = "debug", skip(self, op), fields(function = %op.name()))]
    pub fn apply(&mut self, op: Box<dyn Function<T>>, inputs: &[NodeId]) -> Result<NodeId> {
        let expected = op.arity().len();
        if inputs.len() != expected {
            return Err(Error::ArityMismatch {
                op: op.name(),
                expected,
                got: inputs.len(),
            });
        }

        let mut ctx = Context::new();
        let output = {
            let input_data = inputs
                .iter()
                .map(|&input| self.node(input).map(Node::data))
                .collect::<Result<Vec<_>>>()?;
            op.forward(self.backend.as_ref(), &mut ctx, &input_data)?
        };

        let id = self.next_id();
        debug!(node = %id, shape = ?output.shape(), "recorded function output");
        self.nodes
            .push(Node::new_derived(id, output, op, ctx, inputs.to_vec()));
        Ok(id)
    }

    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Add), &[a, b])
    }

    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Mul), &[a, b])
    }

    pub fn neg(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Neg), &[a])
    }

    pub fn inv(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Inv), &[a])
    }

    pub fn relu(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Relu), &[a])
    }

    pub fn sigmoid(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Sigmoid), &[a])
    }

    pub fn log(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Log), &[a])
    }

    pub fn exp(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Exp), &[a])
    }

    pub fn lt(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Lt), &[a, b])
    }

    pub fn eq(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Eq), &[a, b])
    }

    pub fn is_close(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let op = ops::IsClose::new(self.config.is_close_tolerance);
        self.apply(Box::new(op), &[a, b])
    }

    pub fn copy(&mut self, a: NodeId) -> Result<NodeId> {
        self.apply(Box::new(ops::Copy), &[a])
    }

    // NODE ACCESS

    pub fn data(&self, id: NodeId) -> Result<&TensorData<T>> {
        Ok(self.node(id)?.data())
    }

    pub fn grad(&self, id: NodeId) -> Result<&TensorData<T>> {
        Ok(self.node(id)?.grad())
    }

    pub fn shape(&self, id: NodeId) -> Result<&[usize]> {
        Ok(self.node(id)?.shape())
    }

    pub fn info(&self, id: NodeId) -> Result<TensorDataInfo> {
        Ok(self.node(id)?.data().info())
    }

    pub fn parents(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.parents())
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    pub fn op_name(&self, id: NodeId) -> Result<Option<String>> {
        Ok(self.node(id)?.op_name())
    }

    /// GRAPH STATISTICS
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    // GRADIENTS

    /// Adds `delta` into the gradient slot of `id`. Repeated calls sum.
    pub fn accumulate_grad(&mut self, id: NodeId, delta: &TensorData<T>) -> Result<()> {
        let accumulated = self.backend.add(self.node(id)?.grad(), delta)?;
        self.node_mut(id)?.set_grad(accumulated);
        Ok(())
    }

    /// Resets every gradient slot to zero.
    pub fn zero_grad(&mut self) {
        for node in &mut self.nodes {
            let zeros = node.data().zeros_like();
            node.set_grad(zeros);
        }
    }

    /// Seeds a gradient of ones at `root` and propagates it to every ancestor.
    ///
    /// `root` must hold exactly one element. Gradients are summed into the
    /// existing slots, so call [`Graph::zero_grad`] between independent passes.
    /// A pass that fails leaves every slot and saved context as it was.
    #[instrument(level = "debug", skip(self))]
    pub fn backward(&mut self, root: NodeId) -> Result<()> {
        let root_node = self.node(root)?;
        if !root_node.data().is_scalar() {
            return Err(Error::NonScalarBackward {
                shape: root_node.shape().to_vec(),
            });
        }
        let seed = TensorData::ones(root_node.shape());
        self.propagate(root, seed)
    }

    /// Like [`Graph::backward`] but with a caller supplied seed shaped like `root`.
    #[instrument(level = "debug", skip(self, seed))]
    pub fn backward_with_grad(&mut self, root: NodeId, seed: TensorData<T>) -> Result<()> {
        let root_shape = self.node(root)?.shape();
        if root_shape != seed.shape() {
            return Err(Error::ShapeMismatch {
                op: "backward",
                left: root_shape.to_vec(),
                right: seed.shape().to_vec(),
            });
        }
        self.propagate(root, seed)
    }

    /// Reverse topological order of the subgraph reachable from `root`.
    ///
    /// The root comes first and every node appears after all of its
    /// consumers within the reachable set.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.node(root)?;

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        // (node, parents already scheduled)
        let mut stack = vec![(root, false)];

        while let Some((node_id, expanded)) = stack.pop() {
            if expanded {
                order.push(node_id);
                continue;
            }
            if !visited.insert(node_id) {
                continue;
            }
            stack.push((node_id, true));
            for &parent in self.node(node_id)?.parents().iter().rev() {
                if !visited.contains(&parent) {
                    stack.push((parent, false));
                }
            }
        }

        order.reverse();
        Ok(order)
    }

    fn propagate(&mut self, root: NodeId, seed: TensorData<T>) -> Result<()> {
        let order = self.topological_order(root)?;

        // Refuse before touching any gradient slot.
        for &node_id in &order {
            if let History::Derived { op, .. } = self.node(node_id)?.history() {
                if !op.is_differentiable() {
                    return Err(Error::NotDifferentiable(format!(
                        "{} at {}",
                        op.name(),
                        node_id
                    )));
                }
            }
        }

        debug!(nodes = order.len(), "starting backward pass");
        let mut pending: HashMap<NodeId, TensorData<T>> = HashMap::new();
        pending.insert(root, seed);
        // Final gradient per reached node, committed only once every backward ran.
        let mut reached: Vec<(NodeId, TensorData<T>)> = Vec::with_capacity(order.len());

        for &node_id in &order {
            // All consumers were processed earlier, so this sum is final.
            let grad_output = match pending.remove(&node_id) {
                Some(grad) => grad,
                None => continue,
            };

            if let History::Derived { op, ctx, parents } = self.node(node_id)?.history() {
                let grads = op.backward(self.backend.as_ref(), ctx, &grad_output)?;
                if grads.arity() != op.arity() || parents.len() != grads.arity().len() {
                    return Err(Error::ArityMismatch {
                        op: op.name(),
                        expected: parents.len(),
                        got: grads.arity().len(),
                    });
                }
                trace!(node = %node_id, op = %op.name(), "propagated gradient");

                for (&parent, grad) in parents.iter().zip(grads.into_vec()) {
                    self.accumulate_pending(&mut pending, parent, grad)?;
                }
            } else {
                trace!(node = %node_id, "reached leaf");
            }
            reached.push((node_id, grad_output));
        }

        self.commit(reached)?;
        debug!("backward pass finished");
        Ok(())
    }

    /// Sums the gradients of a finished pass into their slots, then releases
    /// the contexts that pass consumed. Nothing is written if a sum fails.
    fn commit(&mut self, reached: Vec<(NodeId, TensorData<T>)>) -> Result<()> {
        let updated = reached
            .into_iter()
            .map(|(node_id, delta)| {
                let grad = self.backend.add(self.node(node_id)?.grad(), &delta)?;
                Ok::<_, Error>((node_id, grad))
            })
            .collect::<Result<Vec<_>>>()?;

        let release = !self.config.retain_graph;
        for (node_id, grad) in updated {
            let node = self.node_mut(node_id)?;
            node.set_grad(grad);
            if release {
                node.release_context();
            }
        }
        Ok(())
    }

    fn accumulate_pending(
        &self,
        pending: &mut HashMap<NodeId, TensorData<T>>,
        node_id: NodeId,
        grad: TensorData<T>,
    ) -> Result<()> {
        let parent_shape = self.node(node_id)?.shape();
        if parent_shape != grad.shape() {
            return Err(Error::ShapeMismatch {
                op: "backward",
                left: parent_shape.to_vec(),
                right: grad.shape().to_vec(),
            });
        }

        match pending.remove(&node_id) {
            Some(existing) => {
                let accumulated = self.backend.add(&existing, &grad)?;
                pending.insert(node_id, accumulated);
            }
            None => {
                pending.insert(node_id, grad);
            }
        }
        Ok(())
    }
}
