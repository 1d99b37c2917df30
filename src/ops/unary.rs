// unary.rs
// Unary activation and transcendental functions. All of them save their input,
// the backward rules are evaluated at the saved forward input.

use crate::backend::{Backend, Float, TensorData};
use crate::error::Result;
use crate::graph::Context;
use crate::ops::{Arity, Function, Gradients, check_inputs};

/// Element-wise rectified linear unit: output = max(0, input)
#[derive(Debug, Clone, Default)]
pub struct Relu;

impl<T> Function<T> for Relu
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
        Ok(backend.relu(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        // Gradient is masked by the sign of the input.
        let input = ctx.saved(0)?;
        Ok(Gradients::Unary(backend.relu_backward(input, d_out)?))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise logistic function: output = 1 / (1 + exp(-input))
#[derive(Debug, Clone, Default)]
pub struct Sigmoid;

impl<T> Function<T> for Sigmoid
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
        Ok(backend.sigmoid(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        // d/dx sigmoid(x) = exp(-x) * sigmoid(x)^2
        let input = ctx.saved(0)?;
        let sigmoid = backend.sigmoid(input);
        let sigmoid_sq = backend.mul(&sigmoid, &sigmoid)?;
        let exp_neg = backend.exp(&backend.neg(input));
        let local = backend.mul(&exp_neg, &sigmoid_sq)?;
        Ok(Gradients::Unary(backend.mul(d_out, &local)?))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise natural logarithm: output = log(input)
#[derive(Debug, Clone, Default)]
pub struct Log;

impl<T> Function<T> for Log
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
        Ok(backend.log(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        // For log: d/dx(log(x)) = 1/x
        let input = ctx.saved(0)?;
        Ok(Gradients::Unary(backend.log_backward(input, d_out)?))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}

/// Element-wise exponential: output = exp(input)
#[derive(Debug, Clone, Default)]
pub struct Exp;

impl<T> Function<T> for Exp
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
        Ok(backend.exp(inputs[0]))
    }

    fn backward(
        &self,
        backend: &dyn Backend<T>,
        ctx: &Context<T>,
        d_out: &TensorData<T>,
    ) -> Result<Gradients<T>> {
        // For exp: d/dx(exp(x)) = exp(x)
        let input = ctx.saved(0)?;
        Ok(Gradients::Unary(backend.mul(d_out, &backend.exp(input))?))
    }

    fn arity(&self) -> Arity {
        Arity::Unary
    }

    fn clone_op(&self) -> Box<dyn Function<T>> {
        Box::new(self.clone())
    }
}
