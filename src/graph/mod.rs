pub mod config;
pub mod context;
pub mod engine;
pub mod node;
mod tests;

pub use config::GraphConfig;
pub use context::Context;
pub use engine::Graph;
pub use node::{GraphId, History, Node, NodeId};
