use num_traits::{One, Zero};
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Trait that defines the basic operations and properties for the element
/// types a [`TensorData`](crate::backend::TensorData) can hold.
/// The additive and multiplicative identities come from `num_traits`, which is
/// also what `ndarray` needs to build zero and one filled arrays.
pub trait Numeric:
    // Basic arithmetic operations
    Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self> +
    AddAssign +
    // Negation
    Neg<Output = Self> +
    // Comparisons
    PartialOrd + PartialEq +
    // Essential traits
    Clone + Copy + Debug + Display +
    Zero + One +
    // Known size at compile time
    Sized + 'static
{
    /// Absolute value
    fn abs(self) -> Self;

    /// Converts to f64 for diagnostics and tolerance checks
    fn to_f64(self) -> f64;

    /// Converts from f64 (fails if the value is not representable)
    fn from_f64(value: f64) -> Option<Self>;
}

/// Floating-point element types. Every differentiable function needs these.
pub trait Float: Numeric {
    /// Exponential function (e^x)
    fn exp(self) -> Self;

    /// Natural logarithm
    fn ln(self) -> Self;
}

impl Numeric for f64 {
    fn abs(self) -> Self {
        self.abs()
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Option<Self> {
        Some(value)
    }
}

impl Float for f64 {
    fn exp(self) -> Self {
        self.exp()
    }
    fn ln(self) -> Self {
        self.ln()
    }
}

impl Numeric for f32 {
    fn abs(self) -> Self {
        self.abs()
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value >= f32::MIN as f64 && value <= f32::MAX as f64 {
            Some(value as f32)
        } else {
            None
        }
    }
}

impl Float for f32 {
    fn exp(self) -> Self {
        self.exp()
    }
    fn ln(self) -> Self {
        self.ln()
    }
}
