//! Seeds a fresh graph with configured pose priors.
//!
//! A prior is expressed as an ordinary single-measurement state routed
//! through the merger, so the anchor vertex it creates is found by later
//! merges through the same temporal association as any other vertex.

use std::sync::Arc;

use log::info;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::Deserialize;

use crate::core::error::Result;
use crate::core::types::{MeasurementValue, TimeRange};
use crate::engine::graph::Graph;
use crate::engine::merger::GraphMerger;
use crate::frontend::{Measurement, State};

/// One configured pose prior.
#[derive(Debug, Clone, Deserialize)]
pub struct PriorPoseSpec {
    /// Handler name the merger maps to a prior-pose edge factory.
    pub handler: String,
    /// Anchor timestamp in nanoseconds.
    pub timestamp: i64,
    pub translation: [f64; 3],
    /// Roll, pitch, yaw in radians.
    pub rotation_rpy: [f64; 3],
    /// Diagonal sigmas `[x, y, z, roll, pitch, yaw]`.
    pub noise_sigmas: [f64; 6],
}

impl PriorPoseSpec {
    fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.translation[0], self.translation[1], self.translation[2]),
            UnitQuaternion::from_euler_angles(
                self.rotation_rpy[0],
                self.rotation_rpy[1],
                self.rotation_rpy[2],
            ),
        )
    }

    fn measurement(&self) -> Measurement {
        Measurement::new(
            TimeRange::instant(self.timestamp),
            MeasurementValue::PriorPose(self.pose()),
            self.handler.clone(),
            Vec::new(),
            self.noise_sigmas.to_vec(),
        )
    }
}

/// Applies configured priors to a graph before the stream starts.
#[derive(Debug, Default)]
pub struct GraphInitializer {
    priors: Vec<PriorPoseSpec>,
}

impl GraphInitializer {
    pub fn new(priors: Vec<PriorPoseSpec>) -> Self {
        Self { priors }
    }

    /// Merge every configured prior into the graph.
    pub fn initialize(&self, merger: &GraphMerger, graph: &mut Graph) -> Result<()> {
        for prior in &self.priors {
            let mut state = State::new();
            state.add(Arc::new(prior.measurement()));
            // Prior measurements never lived in the measurement storage,
            // so the consumed list is dropped.
            merger.merge(&state, graph)?;
        }
        if !self.priors.is_empty() {
            info!("seeded graph with {} prior(s)", self.priors.len());
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}
