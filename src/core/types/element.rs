//! Raw sensor elements as produced by the external data source.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Category of a sensor, used by handlers to validate their input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Imu,
    Lidar,
    Gnss,
}

/// Identity of the sensor that produced an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sensor {
    /// Configured sensor name, the routing key of the distributor.
    pub name: String,
    pub kind: SensorKind,
}

impl Sensor {
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Where in the external dataset an element came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Name of the source (file, topic, stream).
    pub source: String,
    /// Ordinal position within the source.
    pub position: u64,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, position: u64) -> Self {
        Self {
            source: source.into(),
            position,
        }
    }
}

/// One timestamped raw reading from the external data source.
///
/// Elements are immutable; the reader yields them in non-decreasing
/// timestamp order. The payload layout is sensor-specific and only
/// interpreted by the handler registered for the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Timestamp in nanoseconds.
    pub timestamp: i64,
    pub sensor: Sensor,
    /// Opaque raw payload; layout depends on the sensor kind.
    pub payload: Vec<f64>,
    pub location: SourceLocation,
}

impl Element {
    pub fn new(
        timestamp: i64,
        sensor: Sensor,
        payload: Vec<f64>,
        location: SourceLocation,
    ) -> Self {
        Self {
            timestamp,
            sensor,
            payload,
            location,
        }
    }
}

impl Eq for Element {}

// Payload floats are hashed bitwise; elements never hold NaN-producing
// arithmetic results, only values read from the dataset.
impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.timestamp.hash(state);
        self.sensor.hash(state);
        self.location.hash(state);
        for value in &self.payload {
            value.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_elements_deduplicate_in_sets() {
        let sensor = Sensor::new("imu0", SensorKind::Imu);
        let a = Element::new(
            100,
            sensor.clone(),
            vec![1.0, 2.0],
            SourceLocation::new("imu.csv", 0),
        );
        let b = a.clone();

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }
}
