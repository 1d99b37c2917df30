// Differentiable functions.
// Each function pairs a forward kernel with its backward rule. A function saves the
// forward inputs its backward needs in the Context it receives; functions whose
// backward does not depend on the inputs save nothing.
pub mod basic;
pub mod comparison;
pub mod unary;


pub use basic::{Add, Copy, Inv, Mul, Neg};
pub use comparison::{Eq, IsClose, Lt};
pub use unary::{Exp, Log, Relu, Sigmoid};

use crate::backend::{Backend, Float, TensorData};
use crate::error::{Error, Result};
use crate::graph::Context;
use std::any::type_name;

/// Number of inputs a function consumes, and therefore the number of
/// gradients its backward produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

impl Arity {
    pub fn len(self) -> usize {
        match self {
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }
}

/// Gradients returned by a backward rule, one per forward input.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradients<T>
where
    T: Float,
{
    Unary(TensorData<T>),
    Binary(TensorData<T>, TensorData<T>),
}

impl<T> Gradients<T>
where
    T: Float,
{
    pub fn arity(&self) -> Arity {
        match self {
            Gradients::Unary(_) => Arity::Unary,
            Gradients::Binary(..) => Arity::Binary,
        }
    }

    pub fn into_vec(self) -> Vec<TensorData<T>> {
        match self {
            Gradients::Unary(g) => vec![g],
            Gradients::Binary(a, b) => vec![a, b],
        }
    }
}

// All functions in the computational graph implement this trait.
pub trait Function<T>: std::fmt::Debug
where
    T: Float,
{
    // Computes the output and stores in `ctx` whatever backward will need.
    fn forward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &mut Context<T>,
        inputs: &[&TensorData<T>],
    ) -> Result<TensorData<T>>;

    // Maps the upstream gradient onto one gradient per input.
    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>>;

    fn arity(&self) -> Arity;

    // Functions without a backward rule may only terminate a graph.
    fn is_differentiable(&self) -> bool {
        true
    }

    fn name(&self) -> String {
        let full_name = type_name::<Self>();
        full_name
            .rsplit("::")
            .next()
            .unwrap_or(full_name)
            .to_string()
    }

    fn clone_op(&self) -> Box<dyn Function<T>>;
}

/// Fails with `ArityMismatch` unless `inputs` has exactly `arity` entries.
pub fn check_inputs<T, F>(op: &F, inputs: &[&TensorData<T>]) -> Result<()>
where
    T: Float,
    F: Function<T> + ?Sized,
{
    let expected = op.arity().len();
    if inputs.len() != expected {
        return Err(Error::ArityMismatch {
            op: op.name(),
            expected,
            got: inputs.len(),
        });
    }
    Ok(())
}
