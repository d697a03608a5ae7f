//! Frontend layer: measurement normalization, storage, candidate formation.
//!
//! Raw elements flow through the [`ElementDistributor`] into the
//! [`MeasurementStorage`]; the [`CandidateFactory`] watches the storage and
//! stages completed [`State`]s on its [`GraphCandidate`] until the merger
//! consumes them.

pub mod analyzers;
pub mod candidate;
pub mod distributor;
pub mod measurement;
pub mod storage;

pub use analyzers::{
    AnalyzerRegistry, HandlerGroupAnalyzer, IntegrationWindowAnalyzer, SingleShotAnalyzer,
    StateAnalyzer,
};
pub use candidate::{
    CandidateAnalyzer, CandidateFactory, GraphCandidate, SingleStateAnalyzer, State,
};
pub use distributor::ElementDistributor;
pub use measurement::Measurement;
pub use storage::MeasurementStorage;
