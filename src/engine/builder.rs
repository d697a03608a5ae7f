//! Pipeline orchestration: distribute, analyze, merge.

use log::info;

use crate::core::error::Result;
use crate::core::types::Element;
use crate::engine::graph::Graph;
use crate::engine::merger::GraphMerger;
use crate::frontend::{CandidateFactory, ElementDistributor};
use crate::io::DataBatch;

/// Drives one element at a time through the full assembly pipeline.
///
/// Each element is fully distributed, analyzed and (if a candidate became
/// ready) merged before the next one is processed: a plain synchronous
/// call chain with no queueing beyond the storage and candidate buffers.
pub struct GraphBuilder {
    distributor: ElementDistributor,
    candidate_factory: CandidateFactory,
    merger: GraphMerger,
}

impl GraphBuilder {
    pub fn new(
        distributor: ElementDistributor,
        candidate_factory: CandidateFactory,
        merger: GraphMerger,
    ) -> Self {
        Self {
            distributor,
            candidate_factory,
            merger,
        }
    }

    /// Process one element. Returns true when a candidate was merged.
    pub fn process_element(&mut self, element: &Element, graph: &mut Graph) -> Result<bool> {
        self.distributor.distribute(element)?;
        self.candidate_factory
            .process_storage(self.distributor.storage_mut())?;

        if !self.candidate_factory.is_ready() {
            return Ok(false);
        }
        self.merge_candidate(graph)?;
        Ok(true)
    }

    /// Drain elements from the batch until the candidate is ready or the
    /// batch is exhausted.
    pub fn create_candidate(&mut self, batch: &mut DataBatch) -> Result<()> {
        while !self.candidate_factory.is_ready() {
            let Some(element) = batch.remove_first() else {
                break;
            };
            self.distributor.distribute(&element)?;
            self.candidate_factory
                .process_storage(self.distributor.storage_mut())?;
        }
        Ok(())
    }

    /// Merge every staged state into the graph, release the consumed
    /// measurements and clear the candidate.
    ///
    /// A no-op on an empty candidate: vertex count, edge count and the
    /// factor collection are left untouched.
    pub fn merge_candidate(&mut self, graph: &mut Graph) -> Result<()> {
        if self.candidate_factory.candidate().is_empty() {
            info!("no candidate to merge");
            return Ok(());
        }

        while let Some(state) = self.candidate_factory.candidate_mut().remove_first() {
            let consumed = self.merger.merge(&state, graph)?;
            self.distributor
                .clear_storage(consumed.iter().map(|m| m.as_ref()))?;
        }
        self.candidate_factory.clear();
        Ok(())
    }

    pub fn distributor(&self) -> &ElementDistributor {
        &self.distributor
    }

    pub fn candidate_factory(&self) -> &CandidateFactory {
        &self.candidate_factory
    }

    pub fn merger(&self) -> &GraphMerger {
        &self.merger
    }
}
