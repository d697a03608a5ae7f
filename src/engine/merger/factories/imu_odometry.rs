//! Preintegrated inertial odometry edges.
//!
//! Integrates a time-ordered window of IMU measurements into a single
//! relative-motion factor between two (pose, velocity, bias) triples.

use std::sync::Arc;

use log::warn;
use nalgebra::{DMatrix, UnitQuaternion};

use crate::backend::{Factor, ImuPreintegration, NoiseModel};
use crate::core::error::{Error, Result};
use crate::core::types::{MeasurementValue, NANOSECONDS_PER_SECOND};
use crate::engine::graph::{Edge, EdgeTopology, Graph, VertexKind};
use crate::frontend::Measurement;

use super::{expect_vertex_kind, EdgeFactory, VertexBatch};

/// Creates one multi-edge per state over the accumulated IMU window.
pub struct ImuOdometryFactory {
    name: String,
    time_margin: i64,
    kinds: [VertexKind; 3],
}

impl ImuOdometryFactory {
    pub fn new(name: impl Into<String>, time_margin: i64) -> Self {
        Self {
            name: name.into(),
            time_margin,
            kinds: [VertexKind::Pose, VertexKind::Velocity, VertexKind::ImuBias],
        }
    }

    /// Integrate the window up to `stop_timestamp`.
    ///
    /// A non-positive step means the stream violated monotonicity for one
    /// sample; integration stops early and the partial delta is returned
    /// with a warning instead of failing the whole merge.
    fn integrate(
        &self,
        measurements: &[Arc<Measurement>],
        stop_timestamp: i64,
    ) -> Result<ImuPreintegration> {
        let mut delta = ImuPreintegration::identity();

        for (position, measurement) in measurements.iter().enumerate() {
            let sample = match measurement.values() {
                MeasurementValue::Imu(sample) => *sample,
                other => {
                    return Err(Error::TypeMismatch(format!(
                        "factory '{}' expects imu measurements, got {}",
                        self.name,
                        other.label()
                    )))
                }
            };

            let start = measurement.time_range().start();
            let stop = match measurements.get(position + 1) {
                Some(next) => next.time_range().start(),
                None => stop_timestamp,
            };
            let dt_ns = stop - start;
            if dt_ns <= 0 {
                warn!(
                    "factory '{}': non-positive step {} ns at sample {}, \
                     stopping integration early",
                    self.name, dt_ns, position
                );
                break;
            }
            let dt = dt_ns as f64 / NANOSECONDS_PER_SECOND as f64;

            let rotation_step = UnitQuaternion::from_scaled_axis(sample.angular_velocity * dt);
            let acceleration = delta.delta_rotation * sample.acceleration;
            delta.delta_position +=
                delta.delta_velocity * dt + 0.5 * acceleration * dt * dt;
            delta.delta_velocity += acceleration * dt;
            delta.delta_rotation *= rotation_step;
            delta.duration += dt;
        }

        Ok(delta)
    }

    /// 9x9 covariance of the integrated motion, grown from the sensor's
    /// per-sample diagonals over the window duration.
    fn integrated_covariance(covariance: &[f64], duration: f64) -> Result<DMatrix<f64>> {
        if covariance.len() < 6 {
            return Err(Error::InvalidArgument(format!(
                "imu noise covariance has {} values, expected at least 6",
                covariance.len()
            )));
        }
        let scale = duration.max(f64::EPSILON);
        let mut matrix = DMatrix::zeros(9, 9);
        for axis in 0..3 {
            // rotation block from the gyro diagonal, velocity/position
            // blocks from the accelerometer diagonal.
            matrix[(axis, axis)] = covariance[3 + axis] * scale;
            matrix[(3 + axis, 3 + axis)] = covariance[axis] * scale;
            matrix[(6 + axis, 6 + axis)] = covariance[axis] * scale * scale;
        }
        Ok(matrix)
    }
}

impl EdgeFactory for ImuOdometryFactory {
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
        let matrix = Self::integrated_covariance(covariance, 1.0)?;
        NoiseModel::covariance(matrix)
    }

    fn create(
        &self,
        graph: &mut Graph,
        vertices: &VertexBatch,
        measurements: &[Arc<Measurement>],
    ) -> Result<Vec<Edge>> {
        let first = measurements.first().ok_or(Error::EmptyStorage(
            "imu odometry factory received no measurements",
        ))?;

        let current_pose = vertices.get(VertexKind::Pose)?;
        let current_velocity = vertices.get(VertexKind::Velocity)?;
        let current_bias = vertices.get(VertexKind::ImuBias)?;
        expect_vertex_kind(graph, current_pose, VertexKind::Pose)?;
        expect_vertex_kind(graph, current_velocity, VertexKind::Velocity)?;
        expect_vertex_kind(graph, current_bias, VertexKind::ImuBias)?;

        let window_start = first.time_range().start();
        let storage = graph.vertex_storage_mut();
        let previous_pose =
            storage.get_or_create(VertexKind::Pose, window_start, self.time_margin);
        let previous_velocity =
            storage.get_or_create(VertexKind::Velocity, window_start, self.time_margin);
        let previous_bias =
            storage.get_or_create(VertexKind::ImuBias, window_start, self.time_margin);

        let stop_timestamp = graph
            .vertex_storage()
            .get(current_pose)
            .map(|vertex| vertex.timestamp())
            .unwrap_or_else(|| first.time_range().stop());
        let delta = self.integrate(measurements, stop_timestamp)?;

        let covariance = Self::integrated_covariance(
            first.noise_covariance(),
            delta.duration.max(f64::EPSILON),
        )?;
        let noise = NoiseModel::covariance(covariance)?;

        let keys_from = [previous_pose, previous_velocity, previous_bias];
        let keys_to = [current_pose, current_velocity, current_bias];
        let factor = Factor::preintegrated_imu(keys_from, keys_to, delta, noise.clone());

        let edge = Edge::new(
            EdgeTopology::Multi {
                set1: keys_from.to_vec(),
                set2: keys_to.to_vec(),
            },
            measurements.to_vec(),
            factor,
            noise,
        );
        Ok(vec![edge])
    }
}
