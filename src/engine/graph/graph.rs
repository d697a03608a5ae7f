//! The canonical mutable graph.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::backend::{FactorCollection, Values};
use crate::core::error::{Error, Result};

use super::edge_storage::EdgeStorage;
use super::edges::Edge;
use super::vertex_storage::VertexStorage;

/// Canonical store of vertices, edges and their opaque factors.
///
/// Only the merger writes to the graph within this core; the external
/// optimizer reads the factor collection and its result comes back
/// through [`Graph::update`].
#[derive(Debug, Default)]
pub struct Graph {
    vertex_storage: VertexStorage,
    edge_storage: EdgeStorage,
    factors: FactorCollection,
    /// vertex index -> indices of incident edges.
    connections: HashMap<u64, HashSet<u64>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one edge: validate its vertices, store it, record the
    /// vertex connections and append its factor to the backend collection.
    ///
    /// Vertices are inserted into the storage at association time, so a
    /// dangling index here is a wiring bug and fails fast.
    pub fn add_edge(&mut self, edge: Edge) -> Result<u64> {
        for index in edge.vertices() {
            if !self.vertex_storage.contains(index) {
                return Err(Error::not_found(format!(
                    "vertex {} referenced by edge is not in the graph",
                    index
                )));
            }
        }

        let factor_index = self.factors.add(edge.factor().clone());
        let edge_index = self.edge_storage.add(edge);
        debug_assert_eq!(factor_index, edge_index);

        let edge_ref = self
            .edge_storage
            .get(edge_index)
            .expect("edge was just stored");
        for vertex in edge_ref.vertices() {
            self.connections.entry(vertex).or_default().insert(edge_index);
        }
        debug!(
            "added edge {} over vertices {:?}",
            edge_index,
            edge_ref.vertices()
        );
        Ok(edge_index)
    }

    /// Add several edges in order.
    pub fn add_edges(&mut self, edges: Vec<Edge>) -> Result<()> {
        for edge in edges {
            self.add_edge(edge)?;
        }
        Ok(())
    }

    /// Push optimized values into every optimizable vertex. Returns the
    /// number of vertices that received a new estimate.
    pub fn update(&mut self, values: &Values) -> Result<usize> {
        let mut updated = 0;
        let indices: Vec<u64> = self.vertex_storage.optimizable_indices().to_vec();
        for index in indices {
            let vertex = self
                .vertex_storage
                .get_mut(index)
                .ok_or_else(|| Error::not_found(format!("optimizable vertex {}", index)))?;
            if vertex.update(values)? {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Edges incident to a vertex.
    pub fn connected_edges(&self, vertex: u64) -> impl Iterator<Item = u64> + '_ {
        self.connections
            .get(&vertex)
            .into_iter()
            .flat_map(|edges| edges.iter().copied())
    }

    pub fn vertex_storage(&self) -> &VertexStorage {
        &self.vertex_storage
    }

    pub fn vertex_storage_mut(&mut self) -> &mut VertexStorage {
        &mut self.vertex_storage
    }

    pub fn edge_storage(&self) -> &EdgeStorage {
        &self.edge_storage
    }

    pub fn factors(&self) -> &FactorCollection {
        &self.factors
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_storage.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_storage.len()
    }
}
