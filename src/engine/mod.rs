//! Graph engine: the graph itself, the merger and the orchestration loop.

pub mod builder;
pub mod graph;
pub mod initializer;
pub mod merger;

pub use builder::GraphBuilder;
pub use graph::{Edge, EdgeTopology, Graph, IndexStorage, Vertex, VertexKind, VertexValue};
pub use initializer::{GraphInitializer, PriorPoseSpec};
pub use merger::GraphMerger;
