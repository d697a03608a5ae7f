//! Normalized measurement payloads produced by handlers.

use nalgebra::{Isometry3, Vector3};

/// One inertial sample in the sensor frame.
#[derive(Debug, Clone, Copy)]
pub struct ImuSample {
    /// Linear acceleration, m/s^2.
    pub acceleration: Vector3<f64>,
    /// Angular velocity, rad/s.
    pub angular_velocity: Vector3<f64>,
}

/// Payload of a [`Measurement`](crate::frontend::Measurement).
///
/// Storage and candidate formation never inspect the payload; only the
/// edge factory registered for the producing handler does.
#[derive(Debug, Clone)]
pub enum MeasurementValue {
    /// A single inertial sample.
    Imu(ImuSample),
    /// Relative transform between two consecutive sensor poses.
    RelativePose(Isometry3<f64>),
    /// Absolute position fix.
    Position(Vector3<f64>),
    /// Absolute pose prior.
    PriorPose(Isometry3<f64>),
}

impl MeasurementValue {
    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementValue::Imu(_) => "imu",
            MeasurementValue::RelativePose(_) => "relative_pose",
            MeasurementValue::Position(_) => "position",
            MeasurementValue::PriorPose(_) => "prior_pose",
        }
    }
}
