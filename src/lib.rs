//! SetuSLAM - Measurement-to-graph assembly for sensor-fusion state estimation
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Element source seam
//! │              (batch, sequence source)               │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Graph + merge
//! │        (graph, merger, edge factories, builder)     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   frontend/                         │  ← Candidate formation
//! │   (measurements, storage, distributor, analyzers)   │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Handlers
//! │              (imu, odometry, gnss)                  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │             (types, errors, collections)            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Data flow
//!
//! Raw element → `ElementDistributor` → `Handler::process` → `Measurement`
//! → `MeasurementStorage` → `StateAnalyzer::evaluate` → `State` →
//! `GraphCandidate` → `GraphMerger::merge` → `Graph::add_edge` →
//! (external optimizer) → `Graph::update`.
//!
//! The pipeline is single-threaded and synchronous: each element is fully
//! distributed, analyzed and, when a candidate becomes ready, merged
//! before the next element is touched. Elements must arrive in
//! non-decreasing timestamp order; that ordering is the external source's
//! contract, not enforced here.
//!
//! The `backend` module is the adapter to the external nonlinear
//! optimization engine: factors and noise models are opaque tokens the
//! core passes through unchanged.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Sensor handlers (depends on core, frontend measurement type)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Frontend (measurements, storage, candidate formation)
// ============================================================================
pub mod frontend;

// ============================================================================
// Layer 4: Graph engine and backend adapter
// ============================================================================
pub mod backend;
pub mod engine;

// ============================================================================
// Layer 5: I/O seam and configuration
// ============================================================================
pub mod config;
pub mod io;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::error::{Error, Result};
pub use crate::core::ordered_set::OrderedSet;
pub use crate::core::types::{
    Element, ImuSample, MeasurementValue, Sensor, SensorKind, SourceLocation, TimeRange,
    NANOSECONDS_PER_SECOND,
};

// Sensors
pub use crate::sensors::{
    GnssHandler, GnssHandlerConfig, Handler, HandlerRegistry, ImuHandler, ImuHandlerConfig,
    PoseOdometryHandler, PoseOdometryHandlerConfig,
};

// Frontend
pub use crate::frontend::{
    AnalyzerRegistry, CandidateAnalyzer, CandidateFactory, ElementDistributor, GraphCandidate,
    HandlerGroupAnalyzer, IntegrationWindowAnalyzer, Measurement, MeasurementStorage,
    SingleShotAnalyzer, SingleStateAnalyzer, State, StateAnalyzer,
};

// Engine
pub use crate::engine::graph::{
    Edge, EdgeStorage, EdgeTopology, Graph, IndexStorage, Vertex, VertexKind, VertexStorage,
    VertexValue,
};
pub use crate::engine::merger::factories::{
    EdgeFactory, EdgeFactoryRegistry, GnssPositionFactory, ImuOdometryFactory,
    PoseOdometryFactory, PriorPoseFactory, VertexBatch,
};
pub use crate::engine::{GraphBuilder, GraphInitializer, GraphMerger, PriorPoseSpec};

// Backend adapter
pub use crate::backend::{Factor, FactorCollection, ImuPreintegration, NoiseModel, Values};

// I/O
pub use crate::io::{fill_batch, DataBatch, ElementSource, SequenceSource};

// Configuration
pub use crate::config::{build_pipeline, from_toml_str, PipelineConfig};
