//! Candidate states awaiting merge into the graph.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;

use crate::core::error::{Error, Result};
use crate::core::types::TimeRange;
use crate::frontend::analyzers::AnalyzerRegistry;
use crate::frontend::measurement::Measurement;
use crate::frontend::storage::MeasurementStorage;

/// A bundle of measurements destined to become one graph node.
///
/// Built up by a state analyzer, consumed by the merger. Measurements are
/// grouped by producing handler, in handler first-contribution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    data: Vec<(String, Vec<Arc<Measurement>>)>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a measurement to its handler's group.
    pub fn add(&mut self, measurement: Arc<Measurement>) {
        let handler = measurement.handler();
        if let Some((_, group)) = self.data.iter_mut().find(|(name, _)| name == handler) {
            if !group.iter().any(|existing| **existing == *measurement) {
                group.push(measurement);
            }
            return;
        }
        self.data
            .push((handler.to_string(), vec![measurement]));
    }

    /// (handler, measurements) groups in contribution order.
    pub fn data(&self) -> &[(String, Vec<Arc<Measurement>>)] {
        &self.data
    }

    /// Every measurement of the state, flat.
    pub fn measurements(&self) -> impl Iterator<Item = &Arc<Measurement>> {
        self.data.iter().flat_map(|(_, group)| group.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.iter().map(|(_, group)| group.len()).sum()
    }

    /// Smallest range covering every contained measurement.
    pub fn time_range(&self) -> Result<TimeRange> {
        let mut range: Option<TimeRange> = None;
        for measurement in self.measurements() {
            let current = measurement.time_range();
            range = Some(match range {
                Some(existing) => existing.union(&current),
                None => current,
            });
        }
        range.ok_or(Error::EmptyStorage("state holds no measurements"))
    }

    /// Key timestamp of the state: the latest `stop` of its measurements.
    pub fn timestamp(&self) -> Result<i64> {
        Ok(self.time_range()?.stop())
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

/// FIFO staging buffer of states not yet merged into the main graph.
#[derive(Debug, Default)]
pub struct GraphCandidate {
    states: VecDeque<State>,
}

impl GraphCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: State) {
        self.states.push_back(state);
    }

    /// Remove the first state equal to `state`. Returns false if absent.
    pub fn remove(&mut self, state: &State) -> bool {
        if let Some(position) = self.states.iter().position(|existing| existing == state) {
            self.states.remove(position);
            true
        } else {
            false
        }
    }

    pub fn remove_first(&mut self) -> Option<State> {
        self.states.pop_front()
    }

    pub fn remove_last(&mut self) -> Option<State> {
        self.states.pop_back()
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Aggregate range over all contained states, rescanned on each call.
    pub fn time_range(&self) -> Result<TimeRange> {
        let mut range: Option<TimeRange> = None;
        for state in &self.states {
            let current = state.time_range()?;
            range = Some(match range {
                Some(existing) => existing.union(&current),
                None => current,
            });
        }
        range.ok_or(Error::EmptyStorage("candidate holds no states"))
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Decides whether a candidate is complete enough to merge.
pub trait CandidateAnalyzer {
    fn is_ready(&self, candidate: &GraphCandidate) -> bool;
}

/// Ready as soon as exactly one state is staged; the single-keyframe
/// builder policy.
#[derive(Debug, Default)]
pub struct SingleStateAnalyzer;

impl CandidateAnalyzer for SingleStateAnalyzer {
    fn is_ready(&self, candidate: &GraphCandidate) -> bool {
        candidate.len() == 1
    }
}

/// Forms candidate states from the measurement storage.
///
/// Routes each new recent measurement to the state analyzer wired to its
/// handler; completed states are staged on the owned [`GraphCandidate`].
pub struct CandidateFactory {
    candidate: GraphCandidate,
    analyzers: AnalyzerRegistry,
    /// handler name -> analyzer name.
    table: std::collections::HashMap<String, String>,
    candidate_analyzer: Box<dyn CandidateAnalyzer>,
    /// Guard against re-evaluating the same recent measurement when the
    /// storage did not change between calls.
    previous: Option<Arc<Measurement>>,
}

impl CandidateFactory {
    pub fn new(
        analyzers: AnalyzerRegistry,
        table: std::collections::HashMap<String, String>,
        candidate_analyzer: Box<dyn CandidateAnalyzer>,
    ) -> Result<Self> {
        for (handler, analyzer) in &table {
            if !analyzers.contains(analyzer) {
                return Err(Error::not_found(format!(
                    "state analyzer '{}' wired to handler '{}'",
                    analyzer, handler
                )));
            }
        }
        Ok(Self {
            candidate: GraphCandidate::new(),
            analyzers,
            table,
            candidate_analyzer,
            previous: None,
        })
    }

    /// Feed the storage's recent measurement to its analyzer; stage any
    /// completed state.
    pub fn process_storage(&mut self, storage: &mut MeasurementStorage) -> Result<()> {
        if storage.is_empty() {
            return Ok(());
        }
        let recent = storage.recent_measurement()?;
        if self
            .previous
            .as_ref()
            .is_some_and(|previous| **previous == *recent)
        {
            return Ok(());
        }

        let analyzer_name = self.table.get(recent.handler()).ok_or_else(|| {
            Error::not_found(format!(
                "state analyzer wired to handler '{}'",
                recent.handler()
            ))
        })?;
        let analyzer = self.analyzers.get_mut(analyzer_name)?;
        if let Some(state) = analyzer.evaluate(&recent)? {
            debug!(
                "analyzer '{}' completed a state with {} measurements",
                analyzer_name,
                state.len()
            );
            self.candidate.add(state);
        }
        self.previous = Some(recent);
        Ok(())
    }

    /// Whether the staged candidate is ready to merge.
    pub fn is_ready(&self) -> bool {
        self.candidate_analyzer.is_ready(&self.candidate)
    }

    pub fn candidate(&self) -> &GraphCandidate {
        &self.candidate
    }

    pub fn candidate_mut(&mut self) -> &mut GraphCandidate {
        &mut self.candidate
    }

    pub fn clear(&mut self) {
        self.candidate.clear();
    }
}
