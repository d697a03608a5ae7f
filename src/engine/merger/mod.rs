//! Merges candidate states into the main graph.

pub mod factories;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use crate::core::error::{Error, Result};
use crate::engine::graph::Graph;
use crate::frontend::{Measurement, State};

use factories::{EdgeFactoryRegistry, VertexBatch};

/// Turns one candidate state into concrete graph mutations.
///
/// For each handler present in the state, the registered edge factory's
/// vertex kinds are resolved once by temporal association (so every edge
/// of that factory shares the same vertex instances), then the factory
/// builds its edges and the whole batch is committed to the graph.
pub struct GraphMerger {
    factories: EdgeFactoryRegistry,
    /// handler name -> edge factory name.
    table: HashMap<String, String>,
}

impl GraphMerger {
    /// Build a merger over the registry and wiring table. Every factory
    /// name in the table must be registered.
    pub fn new(factories: EdgeFactoryRegistry, table: HashMap<String, String>) -> Result<Self> {
        for (handler, factory) in &table {
            if !factories.contains(factory) {
                return Err(Error::not_found(format!(
                    "edge factory '{}' wired to handler '{}'",
                    factory, handler
                )));
            }
        }
        Ok(Self { factories, table })
    }

    /// Merge one state into the graph.
    ///
    /// Returns the measurements consumed by the created edges so the
    /// caller can release them from the measurement storage. A handler
    /// without a registered factory is a configuration error and fails
    /// the merge immediately.
    pub fn merge(&self, state: &State, graph: &mut Graph) -> Result<Vec<Arc<Measurement>>> {
        let timestamp = state.timestamp()?;
        let mut edges = Vec::new();
        let mut consumed = Vec::new();

        for (handler, measurements) in state.data() {
            let factory_name = self.table.get(handler).ok_or_else(|| {
                Error::not_found(format!(
                    "edge factory wired to handler '{}' in state",
                    handler
                ))
            })?;
            let factory = self.factories.get(factory_name)?;

            let mut batch = VertexBatch::new();
            for &kind in factory.vertex_kinds() {
                let index = graph.vertex_storage_mut().get_or_create(
                    kind,
                    timestamp,
                    factory.time_margin(),
                );
                batch.insert(kind, index);
            }

            let new_edges = factory.create(graph, &batch, measurements)?;
            debug!(
                "factory '{}' built {} edge(s) for handler '{}'",
                factory_name,
                new_edges.len(),
                handler
            );
            edges.extend(new_edges);
            consumed.extend(measurements.iter().cloned());
        }

        let num_edges = edges.len();
        graph.add_edges(edges)?;
        info!(
            "merged state at {} into graph: {} edge(s), {} vertices total",
            timestamp,
            num_edges,
            graph.num_vertices()
        );
        Ok(consumed)
    }

    /// handler-name -> factory-name wiring.
    pub fn table(&self) -> &HashMap<String, String> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MeasurementValue, TimeRange};
    use crate::engine::merger::factories::{GnssPositionFactory, PoseOdometryFactory};
    use nalgebra::{Isometry3, Vector3};

    fn merger() -> GraphMerger {
        let mut registry = EdgeFactoryRegistry::new();
        registry
            .register(Box::new(PoseOdometryFactory::new("lidar_odometry", 2)))
            .unwrap();
        registry
            .register(Box::new(GnssPositionFactory::new("gnss_position", 5)))
            .unwrap();
        let mut table = HashMap::new();
        table.insert("scan_matcher".to_string(), "lidar_odometry".to_string());
        table.insert("gnss_preprocessor".to_string(), "gnss_position".to_string());
        GraphMerger::new(registry, table).unwrap()
    }

    fn odometry_state(start: i64, stop: i64) -> State {
        let mut state = State::new();
        state.add(Arc::new(Measurement::new(
            TimeRange::new(start, stop).unwrap(),
            MeasurementValue::RelativePose(Isometry3::identity()),
            "scan_matcher",
            Vec::new(),
            vec![0.05; 6],
        )));
        state
    }

    #[test]
    fn test_sequential_merges_share_the_middle_vertex() {
        let merger = merger();
        let mut graph = Graph::new();

        merger.merge(&odometry_state(10, 20), &mut graph).unwrap();
        assert_eq!(graph.num_vertices(), 2);
        assert_eq!(graph.num_edges(), 1);

        merger.merge(&odometry_state(20, 30), &mut graph).unwrap();
        // The t=20 vertex is reused: 3 vertices, not 4.
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(graph.num_edges(), 2);
    }

    #[test]
    fn test_unwired_handler_fails_fast() {
        let merger = merger();
        let mut graph = Graph::new();

        let mut state = State::new();
        state.add(Arc::new(Measurement::new(
            TimeRange::instant(5),
            MeasurementValue::Position(Vector3::zeros()),
            "mystery_handler",
            Vec::new(),
            vec![0.1; 3],
        )));

        let err = merger.merge(&state, &mut graph).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(graph.num_edges(), 0);
    }

    #[test]
    fn test_odometry_and_gnss_share_the_keyframe_pose() {
        let merger = merger();
        let mut graph = Graph::new();

        let mut state = odometry_state(10, 20);
        state.add(Arc::new(Measurement::new(
            TimeRange::instant(21),
            MeasurementValue::Position(Vector3::new(1.0, 0.0, 0.0)),
            "gnss_preprocessor",
            Vec::new(),
            vec![0.1; 3],
        )));

        merger.merge(&state, &mut graph).unwrap();

        // One shared keyframe pose + the odometry window-start pose.
        assert_eq!(graph.num_vertices(), 2);
        assert_eq!(graph.num_edges(), 2);
    }
}
