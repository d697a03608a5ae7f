//! Declarative pipeline configuration and startup wiring.
//!
//! The configuration file declares the sensors, handlers, analyzers and
//! edge factories by name, plus the three wiring tables connecting them.
//! [`build_pipeline`] resolves every name once at startup through explicit
//! registry objects; a dangling name aborts there, not mid-stream.

use std::collections::HashMap;

use serde::Deserialize;

use crate::core::error::{Error, Result};
use crate::core::types::SensorKind;
use crate::engine::builder::GraphBuilder;
use crate::engine::merger::factories::{
    EdgeFactoryRegistry, GnssPositionFactory, ImuOdometryFactory, PoseOdometryFactory,
    PriorPoseFactory,
};
use crate::engine::merger::GraphMerger;
use crate::frontend::{
    AnalyzerRegistry, CandidateFactory, ElementDistributor, HandlerGroupAnalyzer,
    IntegrationWindowAnalyzer, SingleShotAnalyzer, SingleStateAnalyzer,
};
use crate::sensors::{
    GnssHandler, GnssHandlerConfig, HandlerRegistry, ImuHandler, ImuHandlerConfig,
    PoseOdometryHandler, PoseOdometryHandlerConfig,
};

/// Full pipeline configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub sensors: Vec<SensorConfig>,
    pub handlers: Vec<HandlerConfig>,
    pub analyzers: Vec<AnalyzerConfig>,
    pub edge_factories: Vec<EdgeFactoryConfig>,
    pub tables: WiringTables,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    pub kind: SensorKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    pub name: String,
    pub params: HandlerParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerParams {
    Imu(ImuHandlerConfig),
    PoseOdometry(PoseOdometryHandlerConfig),
    Gnss(GnssHandlerConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    pub name: String,
    pub params: AnalyzerParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyzerParams {
    /// Count-based: every listed handler must contribute.
    HandlerGroup { handlers: Vec<String> },
    /// Duration-based: target window with a tolerance, nanoseconds.
    IntegrationWindow {
        target_ns: i64,
        #[serde(default = "default_window_tolerance")]
        tolerance_ns: i64,
    },
    /// Every measurement closes a state.
    SingleShot,
}

fn default_window_tolerance() -> i64 {
    10_000_000 // 10 ms
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeFactoryConfig {
    pub name: String,
    /// Vertex association tolerance, nanoseconds.
    #[serde(default = "default_time_margin")]
    pub time_margin_ns: i64,
    pub params: EdgeFactoryParams,
}

fn default_time_margin() -> i64 {
    100_000_000 // 100 ms
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeFactoryParams {
    PoseOdometry,
    ImuOdometry,
    GnssPosition,
    PriorPose,
}

/// The three name-based wiring tables.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WiringTables {
    /// sensor name -> handler names.
    pub sensor_handlers: HashMap<String, Vec<String>>,
    /// handler name -> state analyzer name.
    pub handler_analyzers: HashMap<String, String>,
    /// handler name -> edge factory name.
    pub handler_edge_factories: HashMap<String, String>,
}

/// Parse a configuration from TOML text.
pub fn from_toml_str(text: &str) -> Result<PipelineConfig> {
    toml::from_str(text)
        .map_err(|e| Error::InvalidArgument(format!("failed to parse pipeline config: {}", e)))
}

/// Resolve a configuration into a ready-to-run [`GraphBuilder`].
pub fn build_pipeline(config: &PipelineConfig) -> Result<GraphBuilder> {
    for sensor in config.tables.sensor_handlers.keys() {
        if !config.sensors.iter().any(|declared| declared.name == *sensor) {
            return Err(Error::not_found(format!(
                "sensor '{}' wired in tables but not declared",
                sensor
            )));
        }
    }

    let mut handlers = HandlerRegistry::new();
    for handler in &config.handlers {
        let boxed: Box<dyn crate::sensors::Handler> = match &handler.params {
            HandlerParams::Imu(params) => {
                Box::new(ImuHandler::new(handler.name.clone(), params.clone()))
            }
            HandlerParams::PoseOdometry(params) => {
                Box::new(PoseOdometryHandler::new(handler.name.clone(), params.clone()))
            }
            HandlerParams::Gnss(params) => {
                Box::new(GnssHandler::new(handler.name.clone(), params.clone()))
            }
        };
        handlers.register(boxed)?;
    }

    let mut analyzers = AnalyzerRegistry::new();
    for analyzer in &config.analyzers {
        let boxed: Box<dyn crate::frontend::StateAnalyzer> = match &analyzer.params {
            AnalyzerParams::HandlerGroup { handlers } => Box::new(HandlerGroupAnalyzer::new(
                analyzer.name.clone(),
                handlers.clone(),
            )),
            AnalyzerParams::IntegrationWindow {
                target_ns,
                tolerance_ns,
            } => Box::new(IntegrationWindowAnalyzer::new(
                analyzer.name.clone(),
                *target_ns,
                *tolerance_ns,
            )?),
            AnalyzerParams::SingleShot => Box::new(SingleShotAnalyzer::new(analyzer.name.clone())),
        };
        analyzers.register(boxed)?;
    }

    let mut factories = EdgeFactoryRegistry::new();
    for factory in &config.edge_factories {
        let boxed: Box<dyn crate::engine::merger::factories::EdgeFactory> = match factory.params {
            EdgeFactoryParams::PoseOdometry => Box::new(PoseOdometryFactory::new(
                factory.name.clone(),
                factory.time_margin_ns,
            )),
            EdgeFactoryParams::ImuOdometry => Box::new(ImuOdometryFactory::new(
                factory.name.clone(),
                factory.time_margin_ns,
            )),
            EdgeFactoryParams::GnssPosition => Box::new(GnssPositionFactory::new(
                factory.name.clone(),
                factory.time_margin_ns,
            )),
            EdgeFactoryParams::PriorPose => Box::new(PriorPoseFactory::new(
                factory.name.clone(),
                factory.time_margin_ns,
            )),
        };
        factories.register(boxed)?;
    }

    let distributor =
        ElementDistributor::new(handlers, config.tables.sensor_handlers.clone())?;
    let candidate_factory = CandidateFactory::new(
        analyzers,
        config.tables.handler_analyzers.clone(),
        Box::new(SingleStateAnalyzer),
    )?;
    let merger = GraphMerger::new(factories, config.tables.handler_edge_factories.clone())?;

    Ok(GraphBuilder::new(distributor, candidate_factory, merger))
}
