//! Vertex storage with type-indexed buckets and temporal association.

use std::collections::HashMap;

use crate::core::error::{Error, Result};

use super::index_storage::IndexStorage;
use super::vertices::{Vertex, VertexKind, VertexValue};

/// Stores the graph's vertices.
///
/// Maintains kind-indexed buckets, the optimizable/non-optimizable
/// partition and the global index storage. Vertex indices are unique and
/// stable for the lifetime of the graph; deletion is out of scope.
#[derive(Debug, Default)]
pub struct VertexStorage {
    vertices: HashMap<u64, Vertex>,
    /// Indices in insertion order.
    order: Vec<u64>,
    kind_buckets: HashMap<VertexKind, Vec<u64>>,
    optimizable: Vec<u64>,
    non_optimizable: Vec<u64>,
    index_storage: IndexStorage,
}

impl VertexStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex. Its index must be unused.
    pub fn add(&mut self, vertex: Vertex) -> Result<()> {
        let index = vertex.index();
        if self.vertices.contains_key(&index) {
            return Err(Error::InvalidArgument(format!(
                "vertex index {} already registered",
                index
            )));
        }
        self.index_storage.add(index);
        self.order.push(index);
        self.kind_buckets
            .entry(vertex.kind())
            .or_default()
            .push(index);
        if vertex.is_optimizable() {
            self.optimizable.push(index);
        } else {
            self.non_optimizable.push(index);
        }
        self.vertices.insert(index, vertex);
        Ok(())
    }

    pub fn get(&self, index: u64) -> Option<&Vertex> {
        self.vertices.get(&index)
    }

    pub fn get_mut(&mut self, index: u64) -> Option<&mut Vertex> {
        self.vertices.get_mut(&index)
    }

    pub fn contains(&self, index: u64) -> bool {
        self.vertices.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.order.iter().filter_map(|index| self.vertices.get(index))
    }

    /// Indices of all vertices of one kind, oldest first.
    pub fn of_kind(&self, kind: VertexKind) -> &[u64] {
        self.kind_buckets
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recently added vertex of a kind.
    pub fn last_of_kind(&self, kind: VertexKind) -> Option<&Vertex> {
        self.of_kind(kind)
            .last()
            .and_then(|index| self.vertices.get(index))
    }

    pub fn optimizable_indices(&self) -> &[u64] {
        &self.optimizable
    }

    pub fn non_optimizable_indices(&self) -> &[u64] {
        &self.non_optimizable
    }

    pub fn index_storage(&self) -> &IndexStorage {
        &self.index_storage
    }

    pub fn index_storage_mut(&mut self) -> &mut IndexStorage {
        &mut self.index_storage
    }

    /// Find the vertex of `kind` closest to `timestamp` within
    /// `[timestamp - margin, timestamp + margin]`.
    ///
    /// Ties on |distance| are broken toward the smaller index, so repeated
    /// queries are deterministic and prefer the oldest vertex.
    pub fn find_closest(&self, kind: VertexKind, timestamp: i64, margin: i64) -> Option<u64> {
        let mut best: Option<(i64, u64)> = None;
        for &index in self.of_kind(kind) {
            let vertex = &self.vertices[&index];
            let distance = (vertex.timestamp() - timestamp).abs();
            if distance > margin {
                continue;
            }
            let closer = match best {
                Some((best_distance, best_index)) => {
                    distance < best_distance
                        || (distance == best_distance && index < best_index)
                }
                None => true,
            };
            if closer {
                best = Some((distance, index));
            }
        }
        best.map(|(_, index)| index)
    }

    /// Temporal association primitive: reuse the closest vertex of `kind`
    /// within the margin window, or allocate a new one at `timestamp`
    /// with the next free index and a neutral estimate.
    pub fn get_or_create(&mut self, kind: VertexKind, timestamp: i64, margin: i64) -> u64 {
        if let Some(index) = self.find_closest(kind, timestamp, margin) {
            return index;
        }
        let index = self.index_storage.generate_index();
        let vertex = Vertex::new(index, timestamp, VertexValue::default_for(kind));
        // The index came from the storage's own generator; add cannot fail.
        let _ = self.add(vertex);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(index: u64, timestamp: i64) -> Vertex {
        Vertex::new(index, timestamp, VertexValue::default_for(VertexKind::Pose))
    }

    #[test]
    fn test_association_prefers_closest() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 100)).unwrap();
        storage.add(pose(1, 200)).unwrap();
        storage.add(pose(2, 300)).unwrap();

        assert_eq!(storage.find_closest(VertexKind::Pose, 205, 20), Some(1));
        assert_eq!(storage.find_closest(VertexKind::Pose, 500, 20), None);
    }

    #[test]
    fn test_association_tie_breaks_to_smaller_index() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 90)).unwrap();
        storage.add(pose(1, 110)).unwrap();

        // 100 is equidistant from both; the older vertex wins.
        assert_eq!(storage.find_closest(VertexKind::Pose, 100, 20), Some(0));
    }

    #[test]
    fn test_association_respects_kind() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 100)).unwrap();
        storage
            .add(Vertex::new(
                1,
                100,
                VertexValue::default_for(VertexKind::Velocity),
            ))
            .unwrap();

        assert_eq!(storage.find_closest(VertexKind::Velocity, 100, 5), Some(1));
        assert_eq!(storage.find_closest(VertexKind::ImuBias, 100, 5), None);
    }

    #[test]
    fn test_get_or_create_allocates_past_existing_indices() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 100)).unwrap();
        storage.add(pose(1, 200)).unwrap();
        storage.add(pose(2, 300)).unwrap();

        let reused = storage.get_or_create(VertexKind::Pose, 205, 20);
        assert_eq!(reused, 1);
        assert_eq!(storage.len(), 3);

        let fresh = storage.get_or_create(VertexKind::Pose, 500, 20);
        assert_eq!(fresh, 3);
        assert_eq!(storage.get(fresh).unwrap().timestamp(), 500);
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 100)).unwrap();
        assert!(storage.add(pose(0, 200)).is_err());
    }

    #[test]
    fn test_partition_tracks_optimizability() {
        let mut storage = VertexStorage::new();
        storage.add(pose(0, 100)).unwrap();
        storage
            .add(Vertex::new(1, 100, VertexValue::Feature(vec![1.0])))
            .unwrap();

        assert_eq!(storage.optimizable_indices(), &[0]);
        assert_eq!(storage.non_optimizable_indices(), &[1]);
    }
}
