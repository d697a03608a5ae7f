//! Pairwise point-cloud odometry handler.
//!
//! Wraps an external scan-registration stage: each lidar element's payload
//! carries the registered relative transform to the previous scan as
//! `[tx, ty, tz, roll, pitch, yaw]`. The handler keeps a sliding window of
//! the last two elements and emits a measurement spanning both timestamps.
//! The very first element of the stream produces nothing.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::types::{Element, MeasurementValue, SensorKind, TimeRange};
use crate::frontend::Measurement;

use super::{expect_sensor_kind, Handler};

/// Fixed odometry noise, diagonal sigmas `[x, y, z, roll, pitch, yaw]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoseOdometryHandlerConfig {
    pub translation_sigma: f64,
    pub rotation_sigma: f64,
}

impl Default for PoseOdometryHandlerConfig {
    fn default() -> Self {
        Self {
            translation_sigma: 0.05,
            rotation_sigma: 0.01,
        }
    }
}

/// Stateful handler producing relative-pose measurements from consecutive
/// registered scans.
pub struct PoseOdometryHandler {
    name: String,
    config: PoseOdometryHandlerConfig,
    previous: Option<Element>,
}

impl PoseOdometryHandler {
    pub fn new(name: impl Into<String>, config: PoseOdometryHandlerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            previous: None,
        }
    }

    fn transform_from_payload(&self, element: &Element) -> Result<Isometry3<f64>> {
        if element.payload.len() < 6 {
            return Err(Error::InvalidArgument(format!(
                "odometry element at {} has {} payload values, expected 6",
                element.timestamp,
                element.payload.len()
            )));
        }
        let translation =
            Translation3::new(element.payload[0], element.payload[1], element.payload[2]);
        let rotation = UnitQuaternion::from_euler_angles(
            element.payload[3],
            element.payload[4],
            element.payload[5],
        );
        Ok(Isometry3::from_parts(translation, rotation))
    }

    fn covariance(&self) -> Vec<f64> {
        let t = self.config.translation_sigma;
        let r = self.config.rotation_sigma;
        vec![t, t, t, r, r, r]
    }
}

impl Handler for PoseOdometryHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, element: &Element) -> Result<Option<Measurement>> {
        expect_sensor_kind(element, SensorKind::Lidar, &self.name)?;

        let previous = match self.previous.replace(element.clone()) {
            Some(previous) => previous,
            // First scan of the stream: nothing to register against.
            None => return Ok(None),
        };

        let delta = self.transform_from_payload(element)?;
        let time_range = TimeRange::new(previous.timestamp, element.timestamp)?;

        let measurement = Measurement::new(
            time_range,
            MeasurementValue::RelativePose(delta),
            self.name.clone(),
            vec![previous, element.clone()],
            self.covariance(),
        );
        Ok(Some(measurement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Sensor, SourceLocation};

    fn scan_element(timestamp: i64, position: u64) -> Element {
        Element::new(
            timestamp,
            Sensor::new("velodyne", SensorKind::Lidar),
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            SourceLocation::new("lidar.bin", position),
        )
    }

    #[test]
    fn test_first_element_yields_nothing() {
        let mut handler =
            PoseOdometryHandler::new("scan_matcher", PoseOdometryHandlerConfig::default());
        assert!(handler.process(&scan_element(10, 0)).unwrap().is_none());
    }

    #[test]
    fn test_second_element_spans_both_timestamps() {
        let mut handler =
            PoseOdometryHandler::new("scan_matcher", PoseOdometryHandlerConfig::default());
        handler.process(&scan_element(10, 0)).unwrap();
        let measurement = handler.process(&scan_element(20, 1)).unwrap().unwrap();

        assert_eq!(measurement.time_range(), TimeRange::new(10, 20).unwrap());
        assert_eq!(measurement.elements().len(), 2);
        match measurement.values() {
            MeasurementValue::RelativePose(delta) => {
                assert_eq!(delta.translation.x, 1.0);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_window_slides_forward() {
        let mut handler =
            PoseOdometryHandler::new("scan_matcher", PoseOdometryHandlerConfig::default());
        handler.process(&scan_element(10, 0)).unwrap();
        handler.process(&scan_element(20, 1)).unwrap();
        let third = handler.process(&scan_element(30, 2)).unwrap().unwrap();

        assert_eq!(third.time_range(), TimeRange::new(20, 30).unwrap());
    }
}
