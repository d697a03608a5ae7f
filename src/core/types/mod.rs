//! Core data types shared across the pipeline.

mod element;
mod time;
mod values;

pub use element::{Element, Sensor, SensorKind, SourceLocation};
pub use time::{TimeRange, NANOSECONDS_PER_SECOND};
pub use values::{ImuSample, MeasurementValue};
