//! Sensor handlers: per-sensor processors converting raw elements into
//! normalized measurements.

mod gnss;
mod imu;
mod pose_odometry;

pub use gnss::{GnssHandler, GnssHandlerConfig};
pub use imu::{ImuHandler, ImuHandlerConfig};
pub use pose_odometry::{PoseOdometryHandler, PoseOdometryHandlerConfig};

use std::collections::HashMap;

use crate::core::error::{Error, Result};
use crate::core::types::Element;
use crate::frontend::Measurement;

/// A per-sensor-type processor.
///
/// Handlers may be stateful (e.g. hold a sliding window of past elements)
/// and may legitimately return `None` for elements that cannot yet produce
/// a measurement, such as the first sample of a pairwise sensor.
pub trait Handler {
    /// Registered name; measurements carry it as their origin tag.
    fn name(&self) -> &str;

    /// Process one raw element into at most one measurement.
    fn process(&mut self, element: &Element) -> Result<Option<Measurement>>;
}

/// Explicit name-to-handler registry, constructed once at startup.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name.
    pub fn register(&mut self, handler: Box<dyn Handler>) -> Result<()> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(Error::InvalidArgument(format!(
                "handler '{}' registered twice",
                name
            )));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn Handler + 'static)> {
        self.handlers
            .get_mut(name)
            .map(|boxed| boxed.as_mut())
            .ok_or_else(|| Error::not_found(format!("handler '{}'", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Fail with a `TypeMismatch` unless the element's sensor kind matches.
pub(crate) fn expect_sensor_kind(
    element: &Element,
    expected: crate::core::types::SensorKind,
    handler: &str,
) -> Result<()> {
    if element.sensor.kind != expected {
        return Err(Error::TypeMismatch(format!(
            "handler '{}' expects {:?} elements, got {:?} from sensor '{}'",
            handler, expected, element.sensor.kind, element.sensor.name
        )));
    }
    Ok(())
}
