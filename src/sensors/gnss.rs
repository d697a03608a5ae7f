//! GNSS position handler.
//!
//! Payload layout of a GNSS element: `[x, y, z, var_x, var_y, var_z]`,
//! a position fix in the local navigation frame together with its
//! per-axis variance, as delivered by the receiver.

use nalgebra::Vector3;
use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::types::{Element, MeasurementValue, SensorKind, TimeRange};
use crate::frontend::Measurement;

use super::{expect_sensor_kind, Handler};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GnssHandlerConfig {
    /// Extra variance added to each axis, e.g. for a known antenna offset.
    pub variance_inflation: f64,
}

/// Converts GNSS fixes into single-element position measurements.
pub struct GnssHandler {
    name: String,
    config: GnssHandlerConfig,
}

impl GnssHandler {
    pub fn new(name: impl Into<String>, config: GnssHandlerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

impl Handler for GnssHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, element: &Element) -> Result<Option<Measurement>> {
        expect_sensor_kind(element, SensorKind::Gnss, &self.name)?;
        if element.payload.len() < 6 {
            return Err(Error::InvalidArgument(format!(
                "gnss element at {} has {} payload values, expected 6",
                element.timestamp,
                element.payload.len()
            )));
        }

        let position = Vector3::new(element.payload[0], element.payload[1], element.payload[2]);
        let covariance = vec![
            element.payload[3] + self.config.variance_inflation,
            element.payload[4] + self.config.variance_inflation,
            element.payload[5] + self.config.variance_inflation,
        ];

        let measurement = Measurement::new(
            TimeRange::instant(element.timestamp),
            MeasurementValue::Position(position),
            self.name.clone(),
            vec![element.clone()],
            covariance,
        );
        Ok(Some(measurement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Sensor, SourceLocation};

    #[test]
    fn test_fix_becomes_position_measurement() {
        let mut handler = GnssHandler::new("gnss_preprocessor", GnssHandlerConfig::default());
        let element = Element::new(
            500,
            Sensor::new("vrs", SensorKind::Gnss),
            vec![1.0, 2.0, 3.0, 0.1, 0.1, 0.4],
            SourceLocation::new("gps.csv", 3),
        );

        let measurement = handler.process(&element).unwrap().unwrap();
        assert_eq!(measurement.noise_covariance(), &[0.1, 0.1, 0.4]);
        match measurement.values() {
            MeasurementValue::Position(p) => assert_eq!(p.y, 2.0),
            other => panic!("unexpected payload: {:?}", other),
        }
    }
}
