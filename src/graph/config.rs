/// Configuration for a [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Keep saved forward values after backward so the graph can be
    /// differentiated again.
    pub retain_graph: bool,
    /// Absolute tolerance used by `IsClose`.
    pub is_close_tolerance: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            retain_graph: false,
            is_close_tolerance: 1e-2,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retain_graph(mut self, retain_graph: bool) -> Self {
        self.retain_graph = retain_graph;
        self
    }

    pub fn with_is_close_tolerance(mut self, tolerance: f64) -> Self {
        self.is_close_tolerance = tolerance;
        self
    }
}
