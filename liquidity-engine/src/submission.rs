//! Sequential chunk submission
//!
//! Chunks draw from the same balance and must land in order, so each one waits
//! for the previous confirmation. The first failure aborts the rest of the
//! queue; confirmed chunks stay confirmed.
//!
//! ```text
//! Idle -> Submitting(i) -> Idle        (all chunks confirmed)
//!                       -> Aborted(i)  (chunk i failed)
//! ```

use crate::error::LiquidityError;
use crate::types::Chunk;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Confirmation returned by the chain collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub chunk_index: usize,
    pub signature: String,
    pub confirmed_at: DateTime<Utc>,
}

/// External collaborator that sends one chunk and waits for its confirmation
///
/// Timeouts and cancellation are the collaborator's business; an `Err` carries
/// its reason and aborts the sequence.
#[allow(async_fn_in_trait)]
pub trait ChunkSubmitter {
    async fn submit(&mut self, chunk: &Chunk) -> Result<SubmissionReceipt, String>;
}

/// Submission state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Idle,
    Submitting { index: usize },
    Aborted { index: usize },
}

/// Outcome of a submission run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub completed: usize,
    pub total: usize,
    pub receipts: Vec<SubmissionReceipt>,
    pub failure: Option<LiquidityError>,
}

impl SubmissionReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.completed == self.total
    }

    /// "K of N chunks completed"
    pub fn summary(&self) -> String {
        format!("{} of {} chunks completed", self.completed, self.total)
    }
}

/// Feeds chunks to a [`ChunkSubmitter`] one at a time
#[derive(Debug, Clone)]
pub struct ChunkSequencer {
    chunks: Vec<Chunk>,
    state: SubmissionState,
    receipts: Vec<SubmissionReceipt>,
    failure: Option<LiquidityError>,
}

impl ChunkSequencer {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            state: SubmissionState::Idle,
            receipts: Vec::new(),
            failure: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn completed(&self) -> usize {
        self.receipts.len()
    }

    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    /// Submit every pending chunk in order, stopping at the first failure
    ///
    /// An aborted sequencer stays aborted until [`ChunkSequencer::resume`].
    pub async fn run<S: ChunkSubmitter>(&mut self, submitter: &mut S) -> SubmissionReport {
        if let SubmissionState::Aborted { index } = self.state {
            warn!("Sequence aborted at chunk {}; resume to continue", index);
            return self.report();
        }

        let total = self.total();
        for index in self.completed()..total {
            self.state = SubmissionState::Submitting { index };
            info!("Submitting chunk {}/{}", index + 1, total);

            let outcome = submitter.submit(&self.chunks[index]).await;
            match outcome {
                Ok(receipt) => {
                    info!(
                        "Chunk {}/{} confirmed: {}",
                        index + 1,
                        total,
                        receipt.signature
                    );
                    self.receipts.push(receipt);
                }
                Err(reason) => {
                    warn!(
                        "Chunk {}/{} failed, dropping {} remaining: {}",
                        index + 1,
                        total,
                        total - index - 1,
                        reason
                    );
                    self.state = SubmissionState::Aborted { index };
                    self.failure = Some(LiquidityError::ChunkSubmissionFailed {
                        index,
                        completed: self.receipts.len(),
                        total,
                        reason,
                    });
                    return self.report();
                }
            }
        }

        self.state = SubmissionState::Idle;
        self.report()
    }

    /// Retry from the failed chunk onward
    pub async fn resume<S: ChunkSubmitter>(&mut self, submitter: &mut S) -> SubmissionReport {
        if let SubmissionState::Aborted { index } = self.state {
            info!("Resuming from chunk {}/{}", index + 1, self.total());
            self.state = SubmissionState::Idle;
            self.failure = None;
        }
        self.run(submitter).await
    }

    fn report(&self) -> SubmissionReport {
        SubmissionReport {
            completed: self.receipts.len(),
            total: self.chunks.len(),
            receipts: self.receipts.clone(),
            failure: self.failure.clone(),
        }
    }
}
