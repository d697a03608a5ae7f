//! Normalized measurements produced by handlers.

use std::hash::{Hash, Hasher};

use crate::core::types::{Element, MeasurementValue, TimeRange};

/// A measurement formed from one or more processed elements.
///
/// Equality and hashing ignore `values`: payloads (point clouds, images,
/// sample arrays) are not guaranteed comparable. Identity is defined by
/// the time range, the producing handler, the source elements and the
/// noise covariance. Immutable once constructed; shared through
/// `Arc<Measurement>` between storage, states and edges.
#[derive(Debug, Clone)]
pub struct Measurement {
    time_range: TimeRange,
    values: MeasurementValue,
    handler: String,
    elements: Vec<Element>,
    noise_covariance: Vec<f64>,
}

impl Measurement {
    pub fn new(
        time_range: TimeRange,
        values: MeasurementValue,
        handler: impl Into<String>,
        elements: Vec<Element>,
        noise_covariance: Vec<f64>,
    ) -> Self {
        Self {
            time_range,
            values,
            handler: handler.into(),
            elements,
            noise_covariance,
        }
    }

    #[inline]
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    #[inline]
    pub fn values(&self) -> &MeasurementValue {
        &self.values
    }

    /// Name of the handler that produced this measurement.
    #[inline]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Source elements, in acquisition order.
    #[inline]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    pub fn noise_covariance(&self) -> &[f64] {
        &self.noise_covariance
    }
}

impl PartialEq for Measurement {
    fn eq(&self, other: &Self) -> bool {
        self.time_range == other.time_range
            && self.handler == other.handler
            && self.elements == other.elements
            && self.noise_covariance.len() == other.noise_covariance.len()
            && self
                .noise_covariance
                .iter()
                .zip(&other.noise_covariance)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for Measurement {}

impl Hash for Measurement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.time_range.hash(state);
        self.handler.hash(state);
        self.elements.hash(state);
        for value in &self.noise_covariance {
            value.to_bits().hash(state);
        }
    }
}
