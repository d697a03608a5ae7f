//! Inertial element preprocessing.
//!
//! Payload layout of an IMU element: `[gyro_x, gyro_y, gyro_z,
//! acc_x, acc_y, acc_z]` in rad/s and m/s^2. Each element becomes one
//! instantaneous measurement; the noise covariance carries the configured
//! accelerometer, gyroscope and bias diagonals (12 values) for the
//! preintegration edge factory.

use nalgebra::Vector3;
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::types::{Element, ImuSample, MeasurementValue, SensorKind, TimeRange};
use crate::frontend::Measurement;

use super::{expect_sensor_kind, Handler};

/// Noise parameters of the inertial sensor, diagonal form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImuHandlerConfig {
    /// Accelerometer noise density diagonal, (m/s^2)^2.
    pub accelerometer_noise: [f64; 3],
    /// Gyroscope noise density diagonal, (rad/s)^2.
    pub gyroscope_noise: [f64; 3],
    /// Accelerometer bias random-walk diagonal.
    pub accelerometer_bias_noise: [f64; 3],
    /// Gyroscope bias random-walk diagonal.
    pub gyroscope_bias_noise: [f64; 3],
}

impl Default for ImuHandlerConfig {
    fn default() -> Self {
        Self {
            accelerometer_noise: [1e-3; 3],
            gyroscope_noise: [1e-4; 3],
            accelerometer_bias_noise: [1e-5; 3],
            gyroscope_bias_noise: [1e-6; 3],
        }
    }
}

/// Converts raw inertial elements into per-sample measurements.
pub struct ImuHandler {
    name: String,
    config: ImuHandlerConfig,
}

impl ImuHandler {
    pub fn new(name: impl Into<String>, config: ImuHandlerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn covariance(&self) -> Vec<f64> {
        let mut covariance = Vec::with_capacity(12);
        covariance.extend_from_slice(&self.config.accelerometer_noise);
        covariance.extend_from_slice(&self.config.gyroscope_noise);
        covariance.extend_from_slice(&self.config.accelerometer_bias_noise);
        covariance.extend_from_slice(&self.config.gyroscope_bias_noise);
        covariance
    }
}

impl Handler for ImuHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, element: &Element) -> Result<Option<Measurement>> {
        expect_sensor_kind(element, SensorKind::Imu, &self.name)?;
        if element.payload.len() < 6 {
            return Err(Error::InvalidArgument(format!(
                "imu element at {} has {} payload values, expected 6",
                element.timestamp,
                element.payload.len()
            )));
        }

        let angular_velocity =
            Vector3::new(element.payload[0], element.payload[1], element.payload[2]);
        let acceleration =
            Vector3::new(element.payload[3], element.payload[4], element.payload[5]);

        let measurement = Measurement::new(
            TimeRange::instant(element.timestamp),
            MeasurementValue::Imu(ImuSample {
                acceleration,
                angular_velocity,
            }),
            self.name.clone(),
            vec![element.clone()],
            self.covariance(),
        );
        Ok(Some(measurement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Sensor, SourceLocation};

    fn imu_element(timestamp: i64) -> Element {
        Element::new(
            timestamp,
            Sensor::new("xsens", SensorKind::Imu),
            vec![0.01, 0.02, 0.03, 0.1, 0.2, 9.81],
            SourceLocation::new("imu.csv", 0),
        )
    }

    #[test]
    fn test_produces_instantaneous_measurement() {
        let mut handler = ImuHandler::new("imu_preprocessor", ImuHandlerConfig::default());
        let measurement = handler.process(&imu_element(1_000)).unwrap().unwrap();

        assert_eq!(measurement.time_range(), TimeRange::instant(1_000));
        assert_eq!(measurement.handler(), "imu_preprocessor");
        assert_eq!(measurement.noise_covariance().len(), 12);
        match measurement.values() {
            MeasurementValue::Imu(sample) => {
                assert_eq!(sample.acceleration.z, 9.81);
                assert_eq!(sample.angular_velocity.x, 0.01);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_wrong_sensor_kind() {
        let mut handler = ImuHandler::new("imu_preprocessor", ImuHandlerConfig::default());
        let element = Element::new(
            0,
            Sensor::new("velodyne", SensorKind::Lidar),
            vec![0.0; 6],
            SourceLocation::new("lidar.bin", 0),
        );
        assert!(handler.process(&element).is_err());
    }

    #[test]
    fn test_rejects_short_payload() {
        let mut handler = ImuHandler::new("imu_preprocessor", ImuHandlerConfig::default());
        let mut element = imu_element(0);
        element.payload.truncate(4);
        assert!(handler.process(&element).is_err());
    }
}
