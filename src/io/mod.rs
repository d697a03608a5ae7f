//! Seam to the external data source.
//!
//! The source yields elements in non-decreasing timestamp order; the core
//! never seeks or reorders the stream. `DataBatch` is the FIFO the
//! builder drains; `ElementSource` abstracts where elements come from.

use std::collections::VecDeque;

use crate::core::error::Result;
use crate::core::types::Element;

/// A FIFO of elements awaiting distribution.
#[derive(Debug, Default)]
pub struct DataBatch {
    elements: VecDeque<Element>,
}

impl DataBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push_back(element);
    }

    /// Oldest element without removing it.
    pub fn first(&self) -> Option<&Element> {
        self.elements.front()
    }

    pub fn remove_first(&mut self) -> Option<Element> {
        self.elements.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl FromIterator<Element> for DataBatch {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

/// "Has more / next element" semantics of the external reader.
pub trait ElementSource {
    /// Next element of the stream, `None` at end of stream.
    fn next_element(&mut self) -> Result<Option<Element>>;
}

/// In-memory source over a pre-built element sequence; test and demo use.
#[derive(Debug, Default)]
pub struct SequenceSource {
    elements: VecDeque<Element>,
}

impl SequenceSource {
    pub fn new(elements: impl IntoIterator<Item = Element>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }
}

impl ElementSource for SequenceSource {
    fn next_element(&mut self) -> Result<Option<Element>> {
        Ok(self.elements.pop_front())
    }
}

/// Drain a source into a batch.
pub fn fill_batch(source: &mut dyn ElementSource, batch: &mut DataBatch) -> Result<usize> {
    let mut count = 0;
    while let Some(element) = source.next_element()? {
        batch.push(element);
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Sensor, SensorKind, SourceLocation};

    fn element(timestamp: i64) -> Element {
        Element::new(
            timestamp,
            Sensor::new("imu0", SensorKind::Imu),
            vec![0.0; 6],
            SourceLocation::new("imu.csv", timestamp as u64),
        )
    }

    #[test]
    fn test_batch_is_fifo() {
        let mut batch = DataBatch::new();
        batch.push(element(1));
        batch.push(element(2));

        assert_eq!(batch.first().unwrap().timestamp, 1);
        assert_eq!(batch.remove_first().unwrap().timestamp, 1);
        assert_eq!(batch.remove_first().unwrap().timestamp, 2);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_fill_batch_drains_source() {
        let mut source = SequenceSource::new([element(1), element(2), element(3)]);
        let mut batch = DataBatch::new();

        let count = fill_batch(&mut source, &mut batch).unwrap();
        assert_eq!(count, 3);
        assert_eq!(batch.len(), 3);
        assert!(source.next_element().unwrap().is_none());
    }
}
