//! Per-handler measurement storage with incremental recency bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::ordered_set::OrderedSet;
use crate::core::types::TimeRange;
use crate::frontend::measurement::Measurement;

/// Storage of pending measurements, grouped by producing handler.
///
/// Tracks two aggregates incrementally on insert:
/// - the global time range covering every stored measurement,
/// - the recent measurement (largest `stop` timestamp seen).
///
/// Removal marks the aggregates dirty; the next aggregate read rescans
/// once and re-caches. Inserts stay O(1) while the cache is clean.
#[derive(Debug, Default)]
pub struct MeasurementStorage {
    data: HashMap<String, OrderedSet<Arc<Measurement>>>,
    /// Handler names in first-insertion order.
    order: Vec<String>,
    time_range: Option<TimeRange>,
    recent: Option<Arc<Measurement>>,
    dirty: bool,
}

impl MeasurementStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single measurement to its handler's set.
    pub fn add_one(&mut self, measurement: Arc<Measurement>) {
        let handler = measurement.handler().to_string();
        let set = self.data.entry(handler.clone()).or_insert_with(|| {
            self.order.push(handler);
            OrderedSet::new()
        });
        if !set.insert(Arc::clone(&measurement)) {
            return;
        }

        if self.dirty {
            // A rescan is pending anyway; it will pick this one up.
            return;
        }

        let range = measurement.time_range();
        self.time_range = Some(match self.time_range {
            Some(current) => current.union(&range),
            None => range,
        });
        let newer = match &self.recent {
            Some(recent) => range.stop() > recent.time_range().stop(),
            None => true,
        };
        if newer {
            self.recent = Some(measurement);
        }
    }

    /// Add every measurement of an iterator.
    pub fn add_many<I>(&mut self, measurements: I)
    where
        I: IntoIterator<Item = Arc<Measurement>>,
    {
        for measurement in measurements {
            self.add_one(measurement);
        }
    }

    /// Remove a measurement from its handler's set. The handler entry is
    /// dropped when its set becomes empty.
    pub fn remove_one(&mut self, measurement: &Measurement) -> Result<()> {
        let handler = measurement.handler();
        let set = self
            .data
            .get_mut(handler)
            .ok_or_else(|| Error::not_found(format!("handler '{}' in storage", handler)))?;

        // Arc<Measurement> hashes through the inner measurement, so a
        // borrowed key needs a transient Arc.
        let key = Arc::new(measurement.clone());
        if !set.remove(&key) {
            return Err(Error::not_found(format!(
                "measurement [{}..{}] of handler '{}'",
                measurement.time_range().start(),
                measurement.time_range().stop(),
                handler
            )));
        }

        if set.is_empty() {
            self.data.remove(handler);
            self.order.retain(|name| name != handler);
        }
        self.dirty = true;
        Ok(())
    }

    /// Remove every measurement of an iterator.
    pub fn remove_many<'a, I>(&mut self, measurements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Measurement>,
    {
        for measurement in measurements {
            self.remove_one(measurement)?;
        }
        Ok(())
    }

    /// The measurement with the largest `stop` timestamp.
    pub fn recent_measurement(&mut self) -> Result<Arc<Measurement>> {
        self.refresh_if_dirty();
        self.recent
            .clone()
            .ok_or(Error::EmptyStorage("no recent measurement"))
    }

    /// Smallest range covering every stored measurement.
    pub fn time_range(&mut self) -> Result<TimeRange> {
        self.refresh_if_dirty();
        self.time_range.ok_or(Error::EmptyStorage("no time range"))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of stored measurements across all handlers.
    pub fn len(&self) -> usize {
        self.data.values().map(OrderedSet::len).sum()
    }

    /// Measurements of one handler, if any.
    pub fn get(&self, handler: &str) -> Option<&OrderedSet<Arc<Measurement>>> {
        self.data.get(handler)
    }

    /// (handler, measurements) pairs in handler first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrderedSet<Arc<Measurement>>)> {
        self.order
            .iter()
            .filter_map(|name| self.data.get(name).map(|set| (name.as_str(), set)))
    }

    /// Handler names in first-insertion order.
    pub fn handlers(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.order.clear();
        self.time_range = None;
        self.recent = None;
        self.dirty = false;
    }

    fn refresh_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        self.time_range = None;
        self.recent = None;
        for set in self.data.values() {
            for measurement in set {
                let range = measurement.time_range();
                self.time_range = Some(match self.time_range {
                    Some(current) => current.union(&range),
                    None => range,
                });
                let newer = match &self.recent {
                    Some(recent) => range.stop() > recent.time_range().stop(),
                    None => true,
                };
                if newer {
                    self.recent = Some(Arc::clone(measurement));
                }
            }
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MeasurementValue;
    use nalgebra::Vector3;

    fn measurement(handler: &str, start: i64, stop: i64) -> Arc<Measurement> {
        Arc::new(Measurement::new(
            TimeRange::new(start, stop).unwrap(),
            MeasurementValue::Position(Vector3::zeros()),
            handler,
            Vec::new(),
            vec![1.0, 1.0, 1.0],
        ))
    }

    #[test]
    fn test_empty_storage_queries_fail() {
        let mut storage = MeasurementStorage::new();
        assert!(storage.recent_measurement().is_err());
        assert!(storage.time_range().is_err());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_recency_tracks_largest_stop() {
        let mut storage = MeasurementStorage::new();
        // Insertion order deliberately differs from time order.
        storage.add_one(measurement("a", 20, 30));
        storage.add_one(measurement("b", 0, 50));
        storage.add_one(measurement("a", 35, 40));

        let recent = storage.recent_measurement().unwrap();
        assert_eq!(recent.time_range().stop(), 50);
    }

    #[test]
    fn test_aggregate_range_spans_all_handlers() {
        let mut storage = MeasurementStorage::new();
        storage.add_one(measurement("a", 20, 30));
        storage.add_one(measurement("b", 5, 25));
        storage.add_one(measurement("c", 22, 60));

        let range = storage.time_range().unwrap();
        assert_eq!(range.start(), 5);
        assert_eq!(range.stop(), 60);
    }

    #[test]
    fn test_remove_all_leaves_empty_storage() {
        let mut storage = MeasurementStorage::new();
        let first = measurement("a", 0, 10);
        let second = measurement("a", 10, 20);
        storage.add_one(Arc::clone(&first));
        storage.add_one(Arc::clone(&second));

        storage.remove_one(&first).unwrap();
        storage.remove_one(&second).unwrap();

        assert!(storage.is_empty());
        assert!(storage.recent_measurement().is_err());
    }

    #[test]
    fn test_aggregates_recomputed_after_removal() {
        let mut storage = MeasurementStorage::new();
        let oldest = measurement("a", 0, 10);
        let newest = measurement("a", 20, 30);
        storage.add_one(Arc::clone(&oldest));
        storage.add_one(Arc::clone(&newest));

        storage.remove_one(&newest).unwrap();

        let recent = storage.recent_measurement().unwrap();
        assert_eq!(recent.time_range().stop(), 10);
        let range = storage.time_range().unwrap();
        assert_eq!(range.start(), 0);
        assert_eq!(range.stop(), 10);
    }

    #[test]
    fn test_handler_entry_dropped_when_empty() {
        let mut storage = MeasurementStorage::new();
        let only = measurement("solo", 0, 5);
        storage.add_one(Arc::clone(&only));
        storage.remove_one(&only).unwrap();

        assert!(storage.get("solo").is_none());
        assert_eq!(storage.handlers().count(), 0);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let mut storage = MeasurementStorage::new();
        let m = measurement("a", 0, 5);
        storage.add_one(Arc::clone(&m));
        storage.add_one(Arc::clone(&m));
        assert_eq!(storage.len(), 1);
    }
}
