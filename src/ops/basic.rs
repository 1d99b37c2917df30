// basic.rs
// Arithmetic functions for the computational graph: addition, multiplication,
// negation, reciprocal and copy.

use crate::backend::{Backend, Float, TensorData};
use crate::error::Result;
use crate::graph::Context;
use crate::ops::{Arity, Function, Gradients, check_inputs};

/// Element-wise addition: output = input1 + input2
#[derive(Debug, Clone, Default)]
pub struct Add;

impl<T> Function<T> for Add
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
        backend.add(inputs[0], inputs[1])
    }

    fn backward(
        &self,
        _backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        // d/dx(x + y) = 1, d/dy(x + y) = 1
        Ok(Gradients::Binary(d_out.clone(), d_out.clone()))
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise multiplication: output = input1 * input2
#[derive(Debug, Clone, Default)]
pub struct Mul;

impl<T> Function<T> for Mul
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
        backend.mul(inputs[0], inputs[1])
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        let lhs = ctx.saved(0)?;
        let rhs = ctx.saved(1)?;

        // d/dx(x * y) = y, d/dy(x * y) = x
        Ok(Gradients::Binary(
            backend.mul(rhs, d_out)?,
            backend.mul(lhs, d_out)?,
        ))
    }

    fn arity(&self) -> Arity {
        Arity::Binary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise negation: output = -input
#[derive(Debug, Clone, Default)]
pub struct Neg;

impl<T> Function<T> for Neg
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
        ctx.save_for_backwards(&[inputs[0]])?;
        Ok(backend.neg(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        Ok(Gradients::Unary(backend.neg(d_out)))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise reciprocal: output = 1 / input
#[derive(Debug, Clone, Default)]
pub struct Inv;

impl<T> Function<T> for Inv
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
        ctx.save_for_backwards(&[inputs[0]])?;
        Ok(backend.inv(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        let input = ctx.saved(0)?;
        Ok(Gradients::Unary(backend.inv_backward(input, d_out)?))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Identity: output = input. The gradient passes through untouched.
#[derive(Debug, Clone, Default)]
pub struct Copy;

impl<T> Function<T> for Copy
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
        Ok(backend.identity(inputs[0]))
    }

    fn backward(
        &self,
        _backend: &dyn Backend<T>,
        _ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        Ok(Gradients::Unary(d_out.clone()))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}
