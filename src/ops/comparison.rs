// comparison.rs
// Comparison functions return 1.0 for true and 0.0 for false.
// They are step functions, so Lt and Eq send zero gradients to both inputs and
// IsClose has no backward at all.

use crate::backend::{Backend, Float, TensorData};
use crate::error::{Error, Result};
use crate::graph::Context;
use crate::ops::{Arity, Function, Gradients, check_inputs};

fn zero_gradients<T: Float>(d_out: &TensorData<T>) -> Gradients<T> {
    Gradients::Binary(d_out.zeros_like(), d_out.zeros_like())
}

/// Element-wise less than: output = input1 < input2
#[derive(Debug, Clone, Default)]
pub struct Lt;

impl<T> Function<T> for Lt
where
    T: Float,
{
    fn forward(
        &self,
        backend: &dyn Backend<T>,
        _ctx: &mut Context<T>,
        inputs: &[&TensorData<T>],
    ) -> Result<TensorData<T>> {
        check_inputs(self, inputs)?;
        backend.lt(inputs[0], inputs[1])
    }

    fn backward(
        &self,
        _backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        Ok(zero_gradients(d_out))
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise equality: output = input1 == input2
#[derive(Debug, Clone, Default)]
pub struct Eq;

impl<T> Function<T> for Eq
where
    T: Float,
{
    fn forward(
        &self,
        backend: &dyn Backend<T>,
        _ctx: &mut Context<T>,
        inputs: &[&TensorData<T>],
    ) -> Result<TensorData<T>> {
        check_inputs(self, inputs)?;
        backend.eq(inputs[0], inputs[1])
    }

    fn backward(
        &self,
        _backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        Ok(zero_gradients(d_out))
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise approximate equality: output = |input1 - input2| < tolerance
#[derive(Debug, Clone)]
pub struct IsClose {
    tolerance: f64,
}

impl Default for IsClose {
    fn default() -> Self {
        Self::new(1e-2)
    }
}

impl IsClose {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl<T> Function<T> for IsClose
where
    T: Float,
{
    fn forward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &mut Context<T>,
        inputs: &[&TensorData<T>],
    ) -> Result<TensorData<T>> {
        check_inputs(self, inputs)?;
        ctx.save_for_backwards(&[inputs[0], inputs[1]])?;
        backend.is_close(inputs[0], inputs[1], self.tolerance)
    }

    fn backward(
        &self,
        _backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        _d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        Err(Error::NotDifferentiable(Function::<T>::name(self)))
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn is_differentiable(&self) -> bool {
        false
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}
