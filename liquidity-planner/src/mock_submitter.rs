//! Mock chain collaborator for dry runs
//!
//! Stands in for the wallet/RPC layer: waits a little, then confirms the chunk
//! with a random signature unless told to fail it.

use chrono::Utc;
use dlmm_liquidity_engine::{Chunk, ChunkSubmitter, SubmissionReceipt};
use log::debug;
use tokio::time::{sleep, Duration};

pub struct MockChainSubmitter {
    fail_at: Option<usize>,
    latency: Duration,
}

impl MockChainSubmitter {
    pub fn new(fail_at: Option<usize>, latency_ms: u64) -> Self {
        Self {
            fail_at,
            latency: Duration::from_millis(latency_ms),
        }
    }
}

impl ChunkSubmitter for MockChainSubmitter {
    async fn submit(&mut self, chunk: &Chunk) -> Result<SubmissionReceipt, String> {
        debug!(
            "Sending add_liquidity for bins {}: x={} y={}",
            chunk.range, chunk.amount_x, chunk.amount_y
        );

        // Simulate confirmation time
        sleep(self.latency).await;

        if self.fail_at == Some(chunk.index) {
            return Err("simulated transaction failure".to_string());
        }

        Ok(SubmissionReceipt {
            chunk_index: chunk.index,
            signature: format!("mock_add_liquidity_{}", rand::random::<u64>()),
            confirmed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlmm_liquidity_engine::{ChunkSequencer, LiquidityRange};

    fn chunk(index: usize) -> Chunk {
        Chunk {
            index,
            count: 2,
            range: LiquidityRange::new(0, 0).unwrap(),
            delta_ids: vec![0],
            weight_x: vec![0],
            weight_y: vec![0],
            amount_x: 0,
            amount_y: 0,
            amount_x_min: 0,
            amount_y_min: 0,
        }
    }

    #[tokio::test]
    async fn test_mock_fails_requested_chunk() {
        let mut submitter = MockChainSubmitter::new(Some(1), 0);
        let mut sequencer = ChunkSequencer::new(vec![chunk(0), chunk(1)]);

        let report = sequencer.run(&mut submitter).await;

        assert_eq!(report.summary(), "1 of 2 chunks completed");
        assert!(report.receipts[0].signature.starts_with("mock_add_liquidity_"));
    }
}
