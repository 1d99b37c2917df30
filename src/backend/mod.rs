pub mod cpu;
pub mod data;
pub mod numeric;


pub use cpu::CpuBackend;
pub use data::{TensorData, TensorDataInfo, ValueSummary};
pub use numeric::{Float, Numeric};

use crate::error::Result;

/// Elementwise kernels the graph consumes.
///
/// Unary kernels cannot fail. Binary kernels fail with
/// [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) when the operand
/// shapes differ. The `*_backward` kernels take the saved forward input first
/// and the upstream gradient second.
pub trait Backend<T>: std::fmt::Debug
where
    T: Float,
{
    fn name(&self) -> &'static str;

    fn add(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    fn mul(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    fn neg(&self, a: &TensorData<T>) -> TensorData<T>;

    fn inv(&self, a: &TensorData<T>) -> TensorData<T>;

    fn inv_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>>;

    fn relu(&self, a: &TensorData<T>) -> TensorData<T>;

    fn relu_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>>;

    fn sigmoid(&self, a: &TensorData<T>) -> TensorData<T>;

    fn log(&self, a: &TensorData<T>) -> TensorData<T>;

    fn log_backward(&self, a: &TensorData<T>, d_out: &TensorData<T>) -> Result<TensorData<T>>;

    fn exp(&self, a: &TensorData<T>) -> TensorData<T>;

    /// 1 where `a < b`, 0 elsewhere.
    fn lt(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    /// 1 where `a == b`, 0 elsewhere.
    fn eq(&self, a: &TensorData<T>, b: &TensorData<T>) -> Result<TensorData<T>>;

    /// 1 where `|a - b| < tolerance`, 0 elsewhere.
    fn is_close(
        &self,
        a: &TensorData<T>,
        b: &TensorData<T>,
        tolerance: f64,
    ) -> Result<TensorData<T>>;

    fn identity(&self, a: &TensorData<T>) -> TensorData<T>;
}
