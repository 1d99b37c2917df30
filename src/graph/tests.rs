#[cfg(test)]
mod tests {

    use crate::backend::{CpuBackend, TensorData};
    use crate::error::Error;
    use crate::graph::{Graph, GraphConfig, NodeId};
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;

    fn grad_of(graph: &Graph<f64>, id: NodeId) -> Vec<f64> {
        graph.grad(id).unwrap().to_vec()
    }

    #[test]
    fn test_square_gradient() {
        let mut graph = Graph::new();
        let x = graph.tensor(vec![2.0], &[1]).unwrap();
        let y = graph.mul(x, x).unwrap();

        graph.backward(y).unwrap();

        // d/dx(x^2) at x = 2
        assert_eq!(grad_of(&graph, x), vec![4.0]);
    }

    #[test]
    fn test_add_gradient() {
        let mut graph = Graph::new();
        let a = graph.tensor(vec![1.0], &[1]).unwrap();
        let b = graph.tensor(vec![3.0], &[1]).unwrap();
        let c = graph.add(a, b).unwrap();

        graph.backward(c).unwrap();

        assert_eq!(graph.data(c).unwrap().to_vec(), vec![4.0]);
        assert_eq!(grad_of(&graph, a), vec![1.0]);
        assert_eq!(grad_of(&graph, b), vec![1.0]);
    }

    #[test]
    fn test_backward_pass_simple() {
        let mut graph = Graph::new();

        // Simple case: z = x * y
        let x = graph.scalar(3.0);
        let y = graph.scalar(4.0);
        let z = graph.mul(x, y).unwrap();

        graph.backward(z).unwrap();

        assert_eq!(grad_of(&graph, x), vec![4.0]);
        assert_eq!(grad_of(&graph, y), vec![3.0]);
        // Interior slots are populated too.
        assert_eq!(grad_of(&graph, z), vec![1.0]);
    }

    #[test]
    fn test_relu_gradient_by_sign() {
        let mut graph = Graph::new();
        let neg = graph.scalar(-2.0);
        let pos = graph.scalar(3.0);
        let relu_neg = graph.relu(neg).unwrap();
        let relu_pos = graph.relu(pos).unwrap();

        graph.backward(relu_neg).unwrap();
        graph.backward(relu_pos).unwrap();

        assert_eq!(grad_of(&graph, neg), vec![0.0]);
        assert_eq!(grad_of(&graph, pos), vec![1.0]);
    }

    #[test]
    fn test_diamond_accumulation() {
        // y = exp(x) + x * x with a shared leaf x
        let mut graph = Graph::new();
        let x = graph.scalar(1.5);
        let f = graph.exp(x).unwrap();
        let g = graph.mul(x, x).unwrap();
        let y = graph.add(f, g).unwrap();
        graph.backward(y).unwrap();

        // Each branch on its own
        let mut f_graph = Graph::new();
        let fx = f_graph.scalar(1.5);
        let f_only = f_graph.exp(fx).unwrap();
        f_graph.backward(f_only).unwrap();

        let mut g_graph = Graph::new();
        let gx = g_graph.scalar(1.5);
        let g_only = g_graph.mul(gx, gx).unwrap();
        g_graph.backward(g_only).unwrap();

        let expected = grad_of(&f_graph, fx)[0] + grad_of(&g_graph, gx)[0];
        assert_abs_diff_eq!(grad_of(&graph, x)[0], expected, epsilon = 1e-12);
        assert_abs_diff_eq!(expected, 1.5f64.exp() + 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shared_interior_node_runs_backward_once() {
        // c is consumed twice; its backward must see the summed gradient.
        let mut graph = Graph::new();
        let a = graph.scalar(2.0);
        let b = graph.scalar(5.0);
        let c = graph.mul(a, b).unwrap();
        let d = graph.neg(c).unwrap();
        let e = graph.copy(c).unwrap();
        let y = graph.add(d, e).unwrap();
        let z = graph.add(y, c).unwrap();

        graph.backward(z).unwrap();

        // dz/dc = -1 + 1 + 1
        assert_eq!(grad_of(&graph, c), vec![1.0]);
        assert_eq!(grad_of(&graph, a), vec![5.0]);
        assert_eq!(grad_of(&graph, b), vec![2.0]);
    }

    #[test]
    fn test_leaf_identity() {
        let mut graph = Graph::<f64>::new();
        let a = graph.tensor(vec![1.0, 2.0], &[2]).unwrap();
        let z = graph.zeros(&[2, 2]);
        let c = graph.neg(a).unwrap();

        for leaf in [a, z] {
            assert!(graph.is_leaf(leaf).unwrap());
            assert!(graph.parents(leaf).unwrap().is_empty());
            assert_eq!(graph.op_name(leaf).unwrap(), None);
        }
        assert!(!graph.is_leaf(c).unwrap());
        assert_eq!(graph.parents(c).unwrap(), &[a]);
        assert_eq!(graph.op_name(c).unwrap().as_deref(), Some("Neg"));
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_leaves(), 2);
    }

    #[test]
    fn test_zeros_and_zeros_like() {
        let mut graph = Graph::<f64>::new();
        let z = graph.zeros(&[2, 3]);
        assert_eq!(graph.shape(z).unwrap(), &[2, 3]);
        assert!(graph.data(z).unwrap().data().iter().all(|&v| v == 0.0));

        let a = graph.tensor(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let like = graph.zeros_like(a).unwrap();
        assert_eq!(graph.shape(like).unwrap(), &[3]);
        assert_eq!(graph.data(like).unwrap().to_vec(), vec![0.0; 3]);
        // Gradient slots start at zero.
        assert_eq!(grad_of(&graph, a), vec![0.0; 3]);
    }

    #[test]
    fn test_leaf_root() {
        let mut graph = Graph::new();
        let x = graph.scalar(7.0);

        graph.backward(x).unwrap();
        assert_eq!(grad_of(&graph, x), vec![1.0]);

        graph.backward(x).unwrap();
        assert_eq!(grad_of(&graph, x), vec![2.0]);
    }

    #[test]
    fn test_non_scalar_backward_fails_fast() {
        let mut graph = Graph::new();
        let x = graph.tensor(vec![1.0, 2.0], &[2]).unwrap();
        let y = graph.exp(x).unwrap();

        let err = graph.backward(y).unwrap_err();
        assert_eq!(err, Error::NonScalarBackward { shape: vec![2] });
        assert_eq!(grad_of(&graph, x), vec![0.0, 0.0]);
        assert_eq!(grad_of(&graph, y), vec![0.0, 0.0]);
    }

    #[test]
    fn test_single_element_roots_of_any_rank() {
        let mut graph = Graph::new();
        let x = graph.tensor(vec![3.0], &[1, 1]).unwrap();
        let y = graph.mul(x, x).unwrap();

        graph.backward(y).unwrap();
        assert_eq!(graph.grad(x).unwrap().shape(), &[1, 1]);
        assert_eq!(grad_of(&graph, x), vec![6.0]);
    }

    #[test]
    fn test_backward_with_explicit_seed() {
        let mut graph = Graph::new();
        let x = graph.tensor(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let y = graph.mul(x, x).unwrap();

        let seed = TensorData::from_vec(vec![1.0, 0.5, 0.0], &[3]).unwrap();
        graph.backward_with_grad(y, seed).unwrap();
        assert_eq!(grad_of(&graph, x), vec![2.0, 2.0, 0.0]);

        let wrong = TensorData::ones(&[2]);
        assert!(matches!(
            graph.backward_with_grad(y, wrong),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_accumulate_grad_sums() {
        let mut graph = Graph::new();
        let x = graph.tensor(vec![1.0, 1.0], &[2]).unwrap();
        let delta = TensorData::from_vec(vec![0.5, -1.0], &[2]).unwrap();

        graph.accumulate_grad(x, &delta).unwrap();
        graph.accumulate_grad(x, &delta).unwrap();
        assert_eq!(grad_of(&graph, x), vec![1.0, -2.0]);

        let bad = TensorData::ones(&[3]);
        assert!(matches!(
            graph.accumulate_grad(x, &bad),
            Err(Error::ShapeMismatch { .. })
        ));

        graph.zero_grad();
        assert_eq!(grad_of(&graph, x), vec![0.0, 0.0]);
    }

    #[test]
    fn test_comparison_gradients_are_zero() {
        let mut graph = Graph::new();
        let a = graph.tensor(vec![1.0, 5.0], &[2]).unwrap();
        let b = graph.tensor(vec![2.0, 5.0], &[2]).unwrap();
        let lt = graph.lt(a, b).unwrap();
        let eq = graph.eq(a, b).unwrap();
        let both = graph.add(lt, eq).unwrap();

        assert_eq!(graph.data(both).unwrap().to_vec(), vec![1.0, 1.0]);

        let seed = TensorData::from_vec(vec![3.0, -3.0], &[2]).unwrap();
        graph.backward_with_grad(both, seed).unwrap();
        assert_eq!(grad_of(&graph, a), vec![0.0, 0.0]);
        assert_eq!(grad_of(&graph, b), vec![0.0, 0.0]);
        assert_eq!(grad_of(&graph, lt), vec![3.0, -3.0]);
    }

    #[test]
    fn test_is_close_is_terminal() {
        let mut graph = Graph::with_config(GraphConfig::new().with_is_close_tolerance(0.5));
        let a = graph.scalar(1.0);
        let b = graph.scalar(1.25);
        let close = graph.is_close(a, b).unwrap();
        assert_eq!(graph.data(close).unwrap().to_vec(), vec![1.0]);

        let err = graph.backward(close).unwrap_err();
        assert!(matches!(err, Error::NotDifferentiable(_)));
        // Nothing was touched.
        assert_eq!(grad_of(&graph, close), vec![0.0]);
        assert_eq!(grad_of(&graph, a), vec![0.0]);
    }

    #[test]
    fn test_apply_rejects_wrong_arity() {
        let mut graph = Graph::<f64>::new();
        let a = graph.scalar(1.0);

        let err = graph.apply(Box::new(crate::ops::Mul), &[a]).unwrap_err();
        assert_eq!(
            err,
            Error::ArityMismatch {
                op: "Mul".to_string(),
                expected: 2,
                got: 1,
            }
        );
        assert_eq!(graph.num_nodes(), 1);
    }

    #[test]
    fn test_shape_mismatch_propagates_from_forward() {
        let mut graph = Graph::new();
        let a = graph.tensor(vec![1.0, 2.0], &[2]).unwrap();
        let b = graph.tensor(vec![1.0, 2.0, 3.0], &[3]).unwrap();

        assert!(matches!(
            graph.add(a, b),
            Err(Error::ShapeMismatch { op: "add", .. })
        ));
        assert_eq!(graph.num_nodes(), 2);
    }

    #[test]
    fn test_foreign_node_is_rejected() {
        let mut first = Graph::<f64>::new();
        let mut second = Graph::<f64>::new();
        let a = first.scalar(1.0);
        let _ = second.scalar(2.0);

        assert!(matches!(second.neg(a), Err(Error::ForeignNode(_))));
        assert!(matches!(second.backward(a), Err(Error::ForeignNode(_))));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_contexts_released_after_backward() {
        let mut graph = Graph::new();
        let x = graph.scalar(2.0);
        let y = graph.mul(x, x).unwrap();

        graph.backward(y).unwrap();
        assert_eq!(graph.backward(y).unwrap_err(), Error::ContextReleased);
    }

    #[test]
    fn test_failed_backward_leaves_gradients_untouched() {
        let mut graph = Graph::new();
        let x = graph.scalar(2.0);
        let y = graph.mul(x, x).unwrap();
        graph.backward(y).unwrap();
        assert_eq!(grad_of(&graph, y), vec![1.0]);
        assert_eq!(grad_of(&graph, x), vec![4.0]);

        assert_eq!(graph.backward(y).unwrap_err(), Error::ContextReleased);
        assert_eq!(grad_of(&graph, y), vec![1.0]);
        assert_eq!(grad_of(&graph, x), vec![4.0]);

        // w and z come before y in the order, so their sums exist when y fails.
        let z = graph.scalar(5.0);
        let w = graph.add(y, z).unwrap();
        assert_eq!(graph.backward(w).unwrap_err(), Error::ContextReleased);
        assert_eq!(grad_of(&graph, x), vec![4.0]);
        assert_eq!(grad_of(&graph, y), vec![1.0]);
        assert_eq!(grad_of(&graph, z), vec![0.0]);
        assert_eq!(grad_of(&graph, w), vec![0.0]);
    }

    #[test]
    fn test_failed_backward_keeps_contexts() {
        let mut graph = Graph::new();
        let x = graph.scalar(2.0);
        let y = graph.exp(x).unwrap();
        let released = graph.scalar(3.0);
        let r = graph.mul(released, released).unwrap();
        graph.backward(r).unwrap();

        let s = graph.mul(y, r).unwrap();
        assert_eq!(graph.backward(s).unwrap_err(), Error::ContextReleased);

        // y and s still hold their saved inputs, so a pass rooted at y works.
        graph.backward(y).unwrap();
        assert_abs_diff_eq!(grad_of(&graph, x)[0], 2.0f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_retain_graph_allows_second_pass() {
        let mut graph = Graph::with_config(GraphConfig::new().with_retain_graph(true));
        let x = graph.scalar(2.0);
        let y = graph.mul(x, x).unwrap();

        graph.backward(y).unwrap();
        graph.backward(y).unwrap();
        assert_eq!(grad_of(&graph, x), vec![8.0]);
    }

    #[test]
    fn test_topological_order_visits_consumers_first() {
        let mut graph = Graph::new();
        let a = graph.scalar(1.0);
        let b = graph.scalar(2.0);
        let unused = graph.scalar(3.0);
        let c = graph.add(a, b).unwrap();
        let d = graph.mul(c, a).unwrap();
        let e = graph.exp(d).unwrap();
        let f = graph.add(e, c).unwrap();

        let order = graph.topological_order(f).unwrap();
        assert_eq!(order.first(), Some(&f));
        assert_eq!(order.len(), 6);
        assert!(!order.contains(&unused));

        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        for &node in &order {
            for parent in graph.parents(node).unwrap() {
                assert!(position[&node] < position[parent]);
            }
        }
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut graph = Graph::new();
        let x = graph.scalar(1.0);
        let mut current = x;
        for _ in 0..20_000 {
            current = graph.copy(current).unwrap();
        }

        graph.backward(current).unwrap();
        assert_eq!(grad_of(&graph, x), vec![1.0]);
    }

    #[test]
    fn test_info_and_backend() {
        let mut graph = Graph::with_backend(CpuBackend::new(), GraphConfig::default());
        let x = graph.tensor(vec![1.0f32, 3.0], &[2]).unwrap();

        let info = graph.info(x).unwrap();
        assert_eq!(info.shape, vec![2]);
        assert_eq!(info.dtype, "f32");
        assert_eq!(info.summary.unwrap().mean, 2.0);
        assert_eq!(graph.backend().name(), "cpu");
        assert!(!graph.config().retain_graph);
    }
}
