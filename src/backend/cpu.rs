// CPU kernels over ndarray.
// Every binary kernel requires both operands to have the same shape. Broadcasting
// would need reductions in the backward pass, which this engine does not model.

use crate::backend::{Backend, Float, TensorData};
use crate::error::{Error, Result};
use ndarray::Zip;

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }

    fn map<T, F>(&self, a: &TensorData<T>, f: F) -> TensorData<T>
    where
        T: Float,
        F: Fn(T) -> T,
    {
        TensorData::new(a.data().mapv(f))
    }

    fn zip<T, F>(
        &self,
        op: &'static str,
        a: &TensorData<T>,
        b: &TensorData<T>,
        f: F,
    ) -> Result<TensorData<T>>
    where
        T: Float,
        F: Fn(T, T) -> T,
    {
        if a.shape() != b.shape() {
            return Err(Error::ShapeMismatch {
                op,
                left: a.shape().to_vec(),
                right: b.shape().to_vec(),
            });
        }
        let out = Zip::from(a.data())
            .and(b.data())
            .map_collect(|&x, &y| f(x, y));
        Ok(TensorData::new(out))
    }
}

fn indicator<T: Float>(condition: bool) -> T {
    if condition { T::one() } else { T::zero() }
}

fn sigmoid<T: Float>(x: T) -> T {
    // Euler's sigmoid function: 1 / (1 + exp(-x))
    T::one() / (T::one() + (-x).exp())
}

impl<T> Backend<T> for CpuBackend
where
    T: Float,
{
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn add(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("add", a, b, |x, y| x + y)
    }

    fn mul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("mul", a, b, |x, y| x * y)
    }

    fn neg(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, |x| -x)
    }

    fn inv(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, |x| T::one() / x)
    }

    fn inv_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>> {
        // d/dx(1/x) = -1/x^2
        self.zip("inv_backward", a, d_out, |x, d| -d / (x * x))
    }

    fn relu(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, |x| if x > T::zero() { x } else { T::zero() })
    }

    fn relu_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("relu_backward", a, d_out, |x, d| {
            if x > T::zero() { d } else { T::zero() }
        })
    }

    fn sigmoid(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, sigmoid)
    }

    fn log(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, |x| x.ln())
    }

    fn log_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("log_backward", a, d_out, |x, d| d / x)
    }

    fn exp(&self, a: &TensorData<T>) -> TensorData<T> {
        self.map(a, |x| x.exp())
    }

    fn lt(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("lt", a, b, |x, y| indicator(x < y))
    }

    fn eq(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>> {
        self.zip("eq", a, b, |x, y| indicator(x == y))
    }

    fn is_close(
        &self,
        a: &TensorData<T>,
        b: &TensorData<T>,
        tolerance: f64,
    ) -> Result<TensorData<T>> {
        self.zip("is_close", a, b, |x, y| {
            indicator((x - y).abs().to_f64() < tolerance)
        })
    }

    fn identity(&self, a: &TensorData<T>) -> TensorData<T> {
        a.clone()
    }
}
