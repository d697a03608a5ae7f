//! Routes raw elements to the handlers registered for their sensor.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::core::error::{Error, Result};
use crate::core::types::Element;
use crate::frontend::measurement::Measurement;
use crate::frontend::storage::MeasurementStorage;
use crate::sensors::HandlerRegistry;

/// Distributes elements to per-sensor handlers and collects the resulting
/// measurements into the shared storage.
pub struct ElementDistributor {
    storage: MeasurementStorage,
    handlers: HandlerRegistry,
    /// Static sensor-name -> handler-names table, built from configuration.
    table: HashMap<String, Vec<String>>,
}

impl ElementDistributor {
    /// Build a distributor over the given registry and wiring table.
    ///
    /// Every handler name in the table must be registered; a missing name
    /// is a configuration error surfaced at startup.
    pub fn new(handlers: HandlerRegistry, table: HashMap<String, Vec<String>>) -> Result<Self> {
        for (sensor, names) in &table {
            for name in names {
                if !handlers.contains(name) {
                    return Err(Error::not_found(format!(
                        "handler '{}' wired to sensor '{}'",
                        name, sensor
                    )));
                }
            }
        }
        Ok(Self {
            storage: MeasurementStorage::new(),
            handlers,
            table,
        })
    }

    /// Process one element with every handler of its sensor, storing any
    /// produced measurements.
    ///
    /// An element whose sensor has no table entry is a wiring defect and
    /// fails immediately with `NotFound`.
    pub fn distribute(&mut self, element: &Element) -> Result<()> {
        let names = self.table.get(&element.sensor.name).ok_or_else(|| {
            Error::not_found(format!(
                "no handlers registered for sensor '{}'",
                element.sensor.name
            ))
        })?;

        for name in names {
            let handler = self.handlers.get_mut(name)?;
            if let Some(measurement) = handler.process(element)? {
                debug!(
                    "handler '{}' produced {} measurement [{}..{}]",
                    name,
                    measurement.values().label(),
                    measurement.time_range().start(),
                    measurement.time_range().stop()
                );
                self.storage.add_one(Arc::new(measurement));
            }
        }
        Ok(())
    }

    /// Release measurements consumed by a merge.
    pub fn clear_storage<'a, I>(&mut self, measurements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        self.storage.remove_many(measurements)
    }

    pub fn storage(&self) -> &MeasurementStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut MeasurementStorage {
        &mut self.storage
    }

    /// Sensor-name -> handler-names wiring.
    pub fn table(&self) -> &HashMap<String, Vec<String>> {
        &self.table
    }
}
