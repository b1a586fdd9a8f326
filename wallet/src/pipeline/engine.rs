use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokenbank_common::{
    config::{
        DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_MAX_POLL_ERRORS, DEFAULT_POLL_INTERVAL_MILLIS,
    },
    crypto::Hash,
    rpc::{LedgerClient, Receipt, ReceiptStatus},
};
use tokio::time::{sleep, timeout};

use super::{PipelineError, PipelineRun, PipelineStep, StepStatus};
use crate::signer::Signer;

/// How the pipeline waits for a submitted transaction to be included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    // Delay between two receipt queries
    pub poll_interval: Duration,
    // Deadline for a single step, measured from its submission
    pub timeout: Duration,
    // Consecutive failed receipt queries tolerated before failing the step
    pub max_poll_errors: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MILLIS),
            timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
        }
    }
}

/// Executes the steps of a run one at a time, each confirmed before the next.
///
/// The engine never retries a state-changing step: a failed run is terminal,
/// retrying means building a new run.
#[derive(Debug, Clone, Default)]
pub struct TransactionPipeline {
    config: ConfirmationConfig,
}

impl TransactionPipeline {
    pub fn new(config: ConfirmationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    /// Build a run from `steps` and execute it to a terminal state.
    pub async fn run<C, S>(&self, client: &C, signer: &S, steps: Vec<PipelineStep>) -> PipelineRun
    where
        C: LedgerClient + ?Sized,
        S: Signer + ?Sized,
    {
        let mut run = PipelineRun::new(steps);
        self.execute(client, signer, &mut run).await;
        run
    }

    /// Drive `run` forward from where it stands.
    ///
    /// A step left `Submitted` (e.g. the previous wait was abandoned) is only
    /// polled again, never resubmitted. A failed run is left untouched.
    pub async fn execute<C, S>(&self, client: &C, signer: &S, run: &mut PipelineRun)
    where
        C: LedgerClient + ?Sized,
        S: Signer + ?Sized,
    {
        if run.is_failed() {
            debug!("Run already failed, nothing to execute");
            return;
        }

        while let Some(index) = run.current() {
            let transaction = match run.status(index).cloned() {
                Some(StepStatus::Submitted(hash)) => hash,
                Some(StepStatus::Pending) => {
                    let Some(step) = run.step(index).cloned() else {
                        break;
                    };
                    match self.submit(client, signer, &step).await {
                        Ok(hash) => {
                            info!("Step #{} {} submitted as {}", index, step.label(), hash);
                            run.set_status(index, StepStatus::Submitted(hash));
                            hash
                        }
                        Err(e) => {
                            warn!("Step #{} {} was not submitted: {}", index, step.label(), e);
                            run.set_status(index, StepStatus::Failed(e));
                            break;
                        }
                    }
                }
                _ => break,
            };

            match self.wait_for_receipt(client, &transaction).await {
                Ok(receipt) => {
                    info!("Step #{} confirmed in transaction {}", index, transaction);
                    run.set_status(index, StepStatus::Confirmed(receipt));
                }
                Err(e) => {
                    error!("Step #{} failed: {}", index, e);
                    run.set_status(index, StepStatus::Failed(e));
                    break;
                }
            }
        }
    }

    /// Ask the signer then hand the step to the node.
    pub async fn submit<C, S>(
        &self,
        client: &C,
        signer: &S,
        step: &PipelineStep,
    ) -> Result<Hash, PipelineError>
    where
        C: LedgerClient + ?Sized,
        S: Signer + ?Sized,
    {
        let request = step
            .to_request(signer.account())
            .map_err(PipelineError::Submission)?;

        signer.approve(&request).await?;

        client
            .send_transaction(&request)
            .await
            .map_err(PipelineError::from_submission)
    }

    /// Poll the receipt of `transaction` until it is included or the deadline passes.
    pub async fn wait_for_receipt<C>(&self, client: &C, transaction: &Hash) -> Result<Receipt, PipelineError>
    where
        C: LedgerClient + ?Sized,
    {
        let poll = async {
            let mut errors = 0;
            loop {
                match client.get_receipt(transaction).await {
                    Ok(receipt) => {
                        errors = 0;
                        match receipt.status {
                            ReceiptStatus::Success => return Ok(receipt),
                            ReceiptStatus::Reverted => {
                                return Err(PipelineError::ExecutionReverted {
                                    transaction: *transaction,
                                    reason: receipt.revert_reason,
                                })
                            }
                            ReceiptStatus::Unknown => {
                                debug!("Transaction {} not included yet", transaction);
                            }
                        }
                    }
                    Err(e) => {
                        errors += 1;
                        if errors >= self.config.max_poll_errors {
                            return Err(PipelineError::Transport(e));
                        }
                        warn!(
                            "Error while fetching receipt of {} ({}/{}): {}",
                            transaction, errors, self.config.max_poll_errors, e
                        );
                    }
                }
                sleep(self.config.poll_interval).await;
            }
        };

        timeout(self.config.timeout, poll)
            .await
            .map_err(|_| PipelineError::ConfirmationTimeout {
                transaction: *transaction,
                elapsed: self.config.timeout,
            })?
    }
}
