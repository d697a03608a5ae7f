//! Unary pose priors, used to anchor a fresh graph.

use std::sync::Arc;

use crate::backend::{Factor, NoiseModel};
use crate::core::error::{Error, Result};
use crate::core::types::MeasurementValue;
use crate::engine::graph::{Edge, EdgeTopology, Graph, VertexKind};
use crate::frontend::Measurement;

use super::{expect_vertex_kind, EdgeFactory, VertexBatch};

/// Creates one prior edge per prior-pose measurement.
pub struct PriorPoseFactory {
    name: String,
    time_margin: i64,
    kinds: [VertexKind; 1],
}

impl PriorPoseFactory {
    pub fn new(name: impl Into<String>, time_margin: i64) -> Self {
        Self {
            name: name.into(),
            time_margin,
            kinds: [VertexKind::Pose],
        }
    }
}

impl EdgeFactory for PriorPoseFactory {
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
        if covariance.len() != 6 {
            return Err(Error::InvalidArgument(format!(
                "pose prior expects 6 noise sigmas, got {}",
                covariance.len()
            )));
        }
        NoiseModel::diagonal_sigmas(covariance)
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
            let prior = match measurement.values() {
                MeasurementValue::PriorPose(prior) => *prior,
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "factory '{}' expects prior_pose measurements, got {}",
                        self.name,
                        other.label()
                    )))
                }
            };

            let noise = self.noise_model(measurement.noise_covariance())?;
            let factor = Factor::prior_pose(pose, prior, noise.clone());
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
