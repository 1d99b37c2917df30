use crate::backend::numeric::Numeric;
use crate::error::{Error, Result};
use ndarray::{Array, ArrayD, IxDyn};
use rand::Rng;
use rand_distr::Uniform;
use std::fmt;

/// Owned, shaped numeric buffer.
///
/// This is the storage a graph node holds for its value and for its gradient.
/// The shape is fixed when the buffer is built; every kernel returns a fresh
/// buffer instead of resizing an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData<T>
where
    T: Numeric,
{
    data: ArrayD<T>,
}

impl<T> TensorData<T>
where
    T: Numeric,
{
    pub fn new(data: ArrayD<T>) -> Self {
        Self { data }
    }

    // Creates a buffer from a flat vector laid out in row-major order.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let total_elements: usize = shape.iter().product();
        if data.len() != total_elements {
            return Err(Error::InvalidData(format!(
                "data length {} doesn't match shape {:?} (expected {})",
                data.len(),
                shape,
                total_elements
            )));
        }

        Array::from_shape_vec(IxDyn(shape), data)
            .map(Self::new)
            .map_err(|e| Error::InvalidData(format!("failed to create tensor: {e}")))
    }

    /// Single-element buffer of shape `[1]`.
    pub fn scalar(value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(&[1]), value))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::new(ArrayD::ones(IxDyn(shape)))
    }

    pub fn full(shape: &[usize], value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Same-shaped buffer filled with the additive identity.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape())
    }

    /// Samples every element uniformly from `[low, high)`.
    pub fn rand_uniform(shape: &[usize], low: f64, high: f64) -> Result<Self> {
        let dist = Uniform::new(low, high)
            .map_err(|e| Error::InvalidData(format!("invalid sampling range: {e}")))?;
        let mut rng = rand::rng();
        let total_elements: usize = shape.iter().product();
        let values = (0..total_elements)
            .map(|_| {
                let sample = rng.sample(&dist);
                T::from_f64(sample).ok_or_else(|| {
                    Error::InvalidData(format!("{sample} is not representable"))
                })
            })
            .collect::<Result<Vec<T>>>()?;
        Self::from_vec(values, shape)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer holds exactly one element, whatever its rank.
    pub fn is_scalar(&self) -> bool {
        self.size() == 1
    }

    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().copied().collect()
    }

    pub fn info(&self) -> TensorDataInfo {
        let values = self.data.iter().map(|v| v.to_f64());
        let (min, max, sum) = values.fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), v| (min.min(v), max.max(v), sum + v),
        );
        let summary = (self.size() > 0).then(|| ValueSummary {
            min,
            max,
            mean: sum / self.size() as f64,
        });

        TensorDataInfo {
            shape: self.shape().to_vec(),
            ndim: self.ndim(),
            strides: self.data.strides().to_vec(),
            size: self.size(),
            contiguous: self.data.is_standard_layout(),
            dtype: std::any::type_name::<T>(),
            summary,
        }
    }
}

/// Read-only description of a buffer, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorDataInfo {
    pub shape: Vec<usize>,
    pub ndim: usize,
    pub strides: Vec<isize>,
    pub size: usize,
    pub contiguous: bool,
    pub dtype: &'static str,
    /// `None` for empty buffers.
    pub summary: Option<ValueSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl fmt::Display for TensorDataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TensorData<{}> shape={:?} ndim={} strides={:?} size={}",
            self.dtype, self.shape, self.ndim, self.strides, self.size
        )?;
        if !self.contiguous {
            write!(f, " (non-contiguous)")?;
        }
        if let Some(s) = &self.summary {
            write!(f, " min={} max={} mean={}", s.min, s.max, s.mean)?;
        }
        Ok(())
    }
}
