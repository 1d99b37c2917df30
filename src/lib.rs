//! # babygrad
//!
//! babygrad is a minimal reverse-mode automatic differentiation engine written
//! in Rust, over `ndarray` buffers.
//!
//! ## Features
//!
//! - Dynamic computation graph recorded as elementwise functions run
//! - Reverse-mode differentiation of a scalar output
//! - Gradient accumulation over shared (diamond shaped) subgraphs
//! - Pluggable elementwise backend, CPU implementation included
//! - Written 100% in safe Rust
//!
//! ```
//! use babygrad::Graph;
//!
//! let mut graph = Graph::<f64>::new();
//! let x = graph.tensor(vec![2.0], &[1]).unwrap();
//! let y = graph.mul(x, x).unwrap();
//! graph.backward(y).unwrap();
//!
//! assert_eq!(graph.grad(x).unwrap().to_vec(), vec![4.0]);
//! ```
pub mod backend;
pub mod error;
pub mod graph;
pub mod ops;

// Re-export commonly used types for convenience
pub use backend::{Backend, CpuBackend, Float, Numeric, TensorData, TensorDataInfo};
pub use error::{Error, Result};
pub use graph::{Context, Graph, GraphConfig, NodeId};
pub use ops::{Arity, Function, Gradients};
