//! Error types for babygrad

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("{op} expects {expected} inputs, got {got}")]
    ArityMismatch {
        op: String,
        expected: usize,
        got: usize,
    },

    #[error("Saved value {index} was never stored (context holds {saved})")]
    UnsavedContext { index: usize, saved: usize },

    #[error("Context already holds saved values")]
    ContextAlreadySaved,

    #[error("Saved values were released after a previous backward pass")]
    ContextReleased,

    #[error("backward() needs a single-element root, got shape {shape:?}")]
    NonScalarBackward { shape: Vec<usize> },

    #[error("{0} has no backward")]
    NotDifferentiable(String),

    #[error("{0} does not belong to this graph")]
    ForeignNode(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
