//! State analyzers: per-handler state machines deciding when accumulated
//! measurements form a complete graph-node-worth of data.
//!
//! Every analyzer follows the same cycle: accumulate, emit a state when
//! its completion criterion is met, then clear the accumulator on the
//! next call before accepting new data.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use crate::core::error::{Error, Result};
use crate::frontend::candidate::State;
use crate::frontend::measurement::Measurement;

/// Per-handler completion state machine.
pub trait StateAnalyzer {
    /// Registered name.
    fn name(&self) -> &str;

    /// Accumulate one measurement; return a completed state when the
    /// analyzer's criterion is met, `None` otherwise.
    fn evaluate(&mut self, measurement: &Arc<Measurement>) -> Result<Option<State>>;
}

/// Explicit name-to-analyzer registry, constructed once at startup.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Box<dyn StateAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, analyzer: Box<dyn StateAnalyzer>) -> Result<()> {
        let name = analyzer.name().to_string();
        if self.analyzers.contains_key(&name) {
            return Err(Error::InvalidArgument(format!(
                "state analyzer '{}' registered twice",
                name
            )));
        }
        self.analyzers.insert(name, analyzer);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.analyzers.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut (dyn StateAnalyzer + 'static)> {
        self.analyzers
            .get_mut(name)
            .map(|boxed| boxed.as_mut())
            .ok_or_else(|| Error::not_found(format!("state analyzer '{}'", name)))
    }
}

/// Count-based criterion: complete once every required handler has
/// contributed at least one measurement.
pub struct HandlerGroupAnalyzer {
    name: String,
    required: Vec<String>,
    accumulator: State,
    update_pending: bool,
}

impl HandlerGroupAnalyzer {
    pub fn new(name: impl Into<String>, required: Vec<String>) -> Self {
        Self {
            name: name.into(),
            required,
            accumulator: State::new(),
            update_pending: false,
        }
    }

    fn complete(&self) -> bool {
        self.required.iter().all(|required| {
            self.accumulator
                .data()
                .iter()
                .any(|(handler, group)| handler == required && !group.is_empty())
        })
    }
}

impl StateAnalyzer for HandlerGroupAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, measurement: &Arc<Measurement>) -> Result<Option<State>> {
        if self.update_pending {
            self.accumulator.clear();
            self.update_pending = false;
        }
        self.accumulator.add(Arc::clone(measurement));

        if self.complete() {
            self.update_pending = true;
            return Ok(Some(self.accumulator.clone()));
        }
        Ok(None)
    }
}

/// Duration-based criterion: complete once the accumulated span matches a
/// target integration window within a tolerance.
pub struct IntegrationWindowAnalyzer {
    name: String,
    /// Target window length in nanoseconds.
    target: i64,
    /// Acceptable deviation from the target, nanoseconds.
    tolerance: i64,
    accumulator: State,
    update_pending: bool,
}

impl IntegrationWindowAnalyzer {
    pub fn new(name: impl Into<String>, target: i64, tolerance: i64) -> Result<Self> {
        if target <= 0 || tolerance < 0 {
            return Err(Error::InvalidArgument(format!(
                "integration window target {} / tolerance {} must be positive",
                target, tolerance
            )));
        }
        Ok(Self {
            name: name.into(),
            target,
            tolerance,
            accumulator: State::new(),
            update_pending: false,
        })
    }
}

impl StateAnalyzer for IntegrationWindowAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, measurement: &Arc<Measurement>) -> Result<Option<State>> {
        if self.update_pending {
            self.accumulator.clear();
            self.update_pending = false;
        }
        self.accumulator.add(Arc::clone(measurement));

        let span = self.accumulator.time_range()?.duration();
        if span < self.target - self.tolerance {
            return Ok(None);
        }
        if span > self.target + self.tolerance {
            // A sparse stream can jump straight over the window; emitting
            // the overlong span keeps the pipeline moving.
            warn!(
                "analyzer '{}': accumulated span {} ns overshot window {} +/- {} ns",
                self.name, span, self.target, self.tolerance
            );
        }
        self.update_pending = true;
        Ok(Some(self.accumulator.clone()))
    }
}

/// Single-shot criterion: every measurement closes a one-measurement
/// state (GNSS fixes, priors).
pub struct SingleShotAnalyzer {
    name: String,
}

impl SingleShotAnalyzer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StateAnalyzer for SingleShotAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, measurement: &Arc<Measurement>) -> Result<Option<State>> {
        let mut state = State::new();
        state.add(Arc::clone(measurement));
        Ok(Some(state))
    }
}
