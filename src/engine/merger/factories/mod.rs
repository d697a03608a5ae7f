//! Edge factories: turn a handler's measurements into graph edges.

mod gnss;
mod imu_odometry;
mod pose_odometry;
mod prior;

pub use gnss::GnssPositionFactory;
pub use imu_odometry::ImuOdometryFactory;
pub use pose_odometry::PoseOdometryFactory;
pub use prior::PriorPoseFactory;

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::NoiseModel;
use crate::core::error::{Error, Result};
use crate::engine::graph::{Edge, Graph, VertexKind};
use crate::frontend::Measurement;

/// The per-state vertex batch handed to a factory.
///
/// One vertex per declared kind, resolved by temporal association before
/// edge creation so every edge of the factory shares the same instances.
#[derive(Debug, Default)]
pub struct VertexBatch {
    map: HashMap<VertexKind, u64>,
}

impl VertexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: VertexKind, index: u64) {
        self.map.insert(kind, index);
    }

    /// Index of the batched vertex of `kind`; absence is a merger bug.
    pub fn get(&self, kind: VertexKind) -> Result<u64> {
        self.map.get(&kind).copied().ok_or_else(|| {
            Error::TypeMismatch(format!("no {} vertex in the batch for this factory", kind))
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Builds edges (and their opaque factors) from one handler's share of a
/// candidate state.
pub trait EdgeFactory {
    /// Registered name.
    fn name(&self) -> &str;

    /// Vertex kinds the factory needs batched for the current state.
    fn vertex_kinds(&self) -> &[VertexKind];

    /// Time tolerance for vertex association, nanoseconds.
    fn time_margin(&self) -> i64;

    /// Noise model derived from a measurement's covariance.
    fn noise_model(&self, covariance: &[f64]) -> Result<NoiseModel>;

    /// Create one or more edges. The factory may search the graph for
    /// earlier vertices (e.g. the window-start pose of an odometry pair)
    /// and allocate them through the storage's association primitive.
    fn create(
        &self,
        graph: &mut Graph,
        vertices: &VertexBatch,
        measurements: &[Arc<Measurement>],
    ) -> Result<Vec<Edge>>;
}

/// Explicit name-to-factory registry, constructed once at startup.
#[derive(Default)]
pub struct EdgeFactoryRegistry {
    factories: HashMap<String, Box<dyn EdgeFactory>>,
}

impl EdgeFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn EdgeFactory>) -> Result<()> {
        let name = factory.name().to_string();
        if self.factories.contains_key(&name) {
            return Err(Error::InvalidArgument(format!(
                "edge factory '{}' registered twice",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&dyn EdgeFactory> {
        self.factories
            .get(name)
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| Error::not_found(format!("edge factory '{}'", name)))
    }
}

/// Fetch a batched vertex and check it has the kind the factory expects.
pub(crate) fn expect_vertex_kind(
    graph: &Graph,
    index: u64,
    expected: VertexKind,
) -> Result<()> {
    let vertex = graph
        .vertex_storage()
        .get(index)
        .ok_or_else(|| Error::not_found(format!("vertex {}", index)))?;
    if vertex.kind() != expected {
        return Err(Error::TypeMismatch(format!(
            "vertex {} is a {}, factory expected {}",
            index,
            vertex.kind(),
            expected
        )));
    }
    Ok(())
}
