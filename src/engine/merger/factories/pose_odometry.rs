//! Binary pose-odometry edges from relative-transform measurements.

use std::sync::Arc;

use crate::backend::{Factor, NoiseModel};
use crate::core::error::{Error, Result};
use crate::engine::graph::{Edge, EdgeTopology, Graph, VertexKind};
use crate::frontend::Measurement;
use crate::core::types::MeasurementValue;

use super::{expect_vertex_kind, EdgeFactory, VertexBatch};

/// Creates a between-pose edge per odometry measurement, connecting the
/// pose at the window start to the batched current pose. The window-start
/// pose is found (or allocated) by temporal association, which is how a
/// pose created by an earlier merge gets reused.
pub struct PoseOdometryFactory {
    name: String,
    time_margin: i64,
    kinds: [VertexKind; 1],
}

impl PoseOdometryFactory {
    pub fn new(name: impl Into<String>, time_margin: i64) -> Self {
        Self {
            name: name.into(),
            time_margin,
            kinds: [VertexKind::Pose],
        }
    }
}

impl EdgeFactory for PoseOdometryFactory {
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
                "pose odometry expects 6 noise sigmas, got {}",
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
        let current = vertices.get(VertexKind::Pose)?;
        expect_vertex_kind(graph, current, VertexKind::Pose)?;

        let mut edges = Vec::with_capacity(measurements.len());
        for measurement in measurements {
            let delta = match measurement.values() {
                MeasurementValue::RelativePose(delta) => *delta,
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "factory '{}' expects relative_pose measurements, got {}",
                        self.name,
                        other.label()
                    )))
                }
            };

            let previous = graph.vertex_storage_mut().get_or_create(
                VertexKind::Pose,
                measurement.time_range().start(),
                self.time_margin,
            );

            let noise = self.noise_model(measurement.noise_covariance())?;
            let factor = Factor::between_pose(previous, current, delta, noise.clone());
            edges.push(Edge::new(
                EdgeTopology::Binary {
                    first: previous,
                    second: current,
                },
                vec![Arc::clone(measurement)],
                factor,
                noise,
            ));
        }
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TimeRange;
    use nalgebra::Isometry3;

    fn odometry_measurement(start: i64, stop: i64) -> Arc<Measurement> {
        Arc::new(Measurement::new(
            TimeRange::new(start, stop).unwrap(),
            MeasurementValue::RelativePose(Isometry3::identity()),
            "scan_matcher",
            Vec::new(),
            vec![0.05; 6],
        ))
    }

    #[test]
    fn test_creates_binary_edge_with_window_start_vertex() {
        let factory = PoseOdometryFactory::new("lidar_odometry", 2);
        let mut graph = Graph::new();

        let current = graph.vertex_storage_mut().get_or_create(VertexKind::Pose, 20, 2);
        let mut batch = VertexBatch::new();
        batch.insert(VertexKind::Pose, current);

        let edges = factory
            .create(&mut graph, &batch, &[odometry_measurement(10, 20)])
            .unwrap();

        assert_eq!(edges.len(), 1);
        let vertices = edges[0].vertices();
        assert_eq!(vertices.len(), 2);
        // A new vertex was allocated at the window start.
        assert_eq!(graph.vertex_storage().len(), 2);
        let previous = vertices[0];
        assert_eq!(graph.vertex_storage().get(previous).unwrap().timestamp(), 10);
    }

    #[test]
    fn test_rejects_wrong_payload() {
        let factory = PoseOdometryFactory::new("lidar_odometry", 2);
        let mut graph = Graph::new();
        let current = graph.vertex_storage_mut().get_or_create(VertexKind::Pose, 20, 2);
        let mut batch = VertexBatch::new();
        batch.insert(VertexKind::Pose, current);

        let wrong = Arc::new(Measurement::new(
            TimeRange::new(10, 20).unwrap(),
            MeasurementValue::Position(nalgebra::Vector3::zeros()),
            "scan_matcher",
            Vec::new(),
            vec![0.05; 6],
        ));
        assert!(factory.create(&mut graph, &batch, &[wrong]).is_err());
    }
}
