//! Unary position edges from GNSS fixes.

use std::sync::Arc;

use crate::backend::{Factor, NoiseModel};
use crate::core::error::{Error, Result};
use crate::core::types::MeasurementValue;
use crate::engine::graph::{Edge, EdgeTopology, Graph, VertexKind};
use crate::frontend::Measurement;

use super::{expect_vertex_kind, EdgeFactory, VertexBatch};

/// Creates one unary edge per position fix on the batched pose vertex.
/// Sharing that pose with odometry edges at the same keyframe is what the
/// merger's temporal association provides.
pub struct GnssPositionFactory {
    name: String,
    time_margin: i64,
    kinds: [VertexKind; 1],
}

impl GnssPositionFactory {
    pub fn new(name: impl Into<String>, time_margin: i64) -> Self {
        Self {
            name: name.into(),
            time_margin,
            kinds: [VertexKind::Pose],
        }
    }
}

impl EdgeFactory for GnssPositionFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn vertex_kinds(&self) -> &[VertexKind] {
        &self.kinds
    }

    fn time_margin(&self) -> i64 {
        self.time_margin
    }

    fn noise_model(&self, covariance: &[f64]) -> Result<NoiseModel> {
        if covariance.len() != 3 {
            return Err(Error::InvalidArgument(format!(
                "gnss position expects 3 noise variances, got {}",
                covariance.len()
            )));
        }
        NoiseModel::diagonal_variances(covariance)
    }

    fn create(
        &self,
        graph: &mut Graph,
        vertices: &VertexBatch,
        measurements: &[Arc<Measurement>],
    ) -> Result<Vec<Edge>> {
        let pose = vertices.get(VertexKind::Pose)?;
        expect_vertex_kind(graph, pose, VertexKind::Pose)?;

        let mut edges = Vec::with_capacity(measurements.len());
        for measurement in measurements {
            let position = match measurement.values() {
                MeasurementValue::Position(position) => *position,
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "factory '{}' expects position measurements, got {}",
                        self.name,
                        other.label()
                    )))
                }
            };

            let noise = self.noise_model(measurement.noise_covariance())?;
            let factor = Factor::gnss_position(pose, position, noise.clone());
            edges.push(Edge::new(
                EdgeTopology::Unary { vertex: pose },
                vec![Arc::clone(measurement)],
                factor,
                noise,
            ));
        }
        Ok(edges)
    }
}
