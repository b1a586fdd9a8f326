use log::debug;
use tokenbank_common::rpc::Receipt;

use super::{PipelineError, PipelineStep, StepStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    pub step: PipelineStep,
    pub status: StepStatus,
}

/// Ordered steps and their statuses.
///
/// Statuses only move forward: `Pending -> Submitted -> Confirmed | Failed`,
/// or `Pending -> Failed` when the step never reached the network.
/// A step is only submitted once every step before it is `Confirmed`,
/// so after a failure at step k every later step stays `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    entries: Vec<RunEntry>,
}

impl PipelineRun {
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self {
            entries: steps
                .into_iter()
                .map(|step| RunEntry {
                    step,
                    status: StepStatus::Pending,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    pub fn step(&self, index: usize) -> Option<&PipelineStep> {
        self.entries.get(index).map(|entry| &entry.step)
    }

    pub fn status(&self, index: usize) -> Option<&StepStatus> {
        self.entries.get(index).map(|entry| &entry.status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &StepStatus> {
        self.entries.iter().map(|entry| &entry.status)
    }

    // Every step confirmed, trivially true for an empty run
    pub fn is_complete(&self) -> bool {
        self.statuses().all(StepStatus::is_confirmed)
    }

    pub fn is_failed(&self) -> bool {
        self.failure().is_some()
    }

    // Nothing left to do: complete or failed
    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_failed()
    }

    pub fn failure(&self) -> Option<(usize, &PipelineError)> {
        self.statuses()
            .enumerate()
            .find_map(|(index, status)| match status {
                StepStatus::Failed(error) => Some((index, error)),
                _ => None,
            })
    }

    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.statuses().filter_map(|status| match status {
            StepStatus::Confirmed(receipt) => Some(receipt),
            _ => None,
        })
    }

    pub fn last_receipt(&self) -> Option<&Receipt> {
        self.receipts().last()
    }

    // Index of the first step that is not confirmed yet
    pub(crate) fn current(&self) -> Option<usize> {
        self.statuses().position(|status| !status.is_confirmed())
    }

    pub(crate) fn set_status(&mut self, index: usize, status: StepStatus) {
        if let Some(entry) = self.entries.get_mut(index) {
            debug!(
                "Step #{} {}: {} -> {}",
                index,
                entry.step.label(),
                entry.status.name(),
                status.name()
            );
            entry.status = status;
        }
    }
}
