//! Integration tests for the liquidity engine
//!
//! Covers the full path from range edits to submitted chunks:
//! - Bin/price conversion properties
//! - Distribution normalization across shapes
//! - Chunking invariants
//! - Range synchronizer fixed points
//! - Sequential submission with partial completion

use anyhow::Result;
use chrono::Utc;
use dlmm_liquidity_engine::{
    chunk, compute_weights, plan_add_liquidity, AddLiquidityRequest, BinPriceConverter, Chunk,
    ChunkSequencer, ChunkSubmitter, DistributionShape, LiquidityError, LiquidityRange, PriceBase,
    RangeAction, RangeSyncState, SubmissionReceipt, SubmissionState, MIN_PRICE, PRECISION,
};
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn shape_strategy() -> impl Strategy<Value = DistributionShape> {
    prop_oneof![
        Just(DistributionShape::Uniform),
        Just(DistributionShape::Curve),
        Just(DistributionShape::BidAsk),
    ]
}

mod bin_price_tests {
    use super::*;

    #[test]
    fn test_invalid_price_scenario() {
        let converter = BinPriceConverter::new(25, 9, 6).unwrap();
        assert!(matches!(
            converter.bin_from_price(dec!(-1)),
            Err(LiquidityError::InvalidPrice(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_bin_price_round_trip(bin_step in 1u16..=100, bin_id in -2000i32..2000) {
            let converter = BinPriceConverter::new(bin_step, 6, 6).unwrap();
            let price = converter.price_from_bin(bin_id).unwrap();
            prop_assert_eq!(converter.bin_from_price(price).unwrap(), bin_id);
        }

        #[test]
        fn prop_every_quoted_price_round_trips(bin_step in 1u16..=100, bin_id in -60_000i32..60_000) {
            // Far bins are either rejected outright or exact enough to map back
            let converter = BinPriceConverter::new(bin_step, 6, 6).unwrap();
            match converter.price_from_bin(bin_id) {
                Ok(price) => {
                    prop_assert!(price >= MIN_PRICE);
                    prop_assert_eq!(converter.bin_from_price(price).unwrap(), bin_id);
                }
                Err(e) => prop_assert_eq!(e, LiquidityError::PriceOutOfRange { bin_id }),
            }
        }

        #[test]
        fn prop_price_monotonic(bin_step in 1u16..=100, bin_id in -2000i32..2000) {
            let converter = BinPriceConverter::new(bin_step, 9, 6).unwrap();
            prop_assert!(converter.price_from_bin(bin_id).unwrap() < converter.price_from_bin(bin_id + 1).unwrap());
        }

        #[test]
        fn prop_flipped_base_round_trip(bin_step in 1u16..=100, bin_id in -1000i32..1000) {
            let converter = BinPriceConverter::new(bin_step, 9, 6).unwrap();
            let in_y = converter.price_from_bin_in(bin_id, PriceBase::Y).unwrap();
            prop_assert_eq!(converter.bin_from_price_in(in_y, PriceBase::Y).unwrap(), bin_id);
        }
    }
}

mod distribution_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_each_side_sums_to_precision_or_zero(
            active in -50i32..50,
            below in 0i32..40,
            above in 0i32..40,
            amount_x in 0u64..1_000_000_000,
            amount_y in 0u64..1_000_000_000,
            shape in shape_strategy(),
        ) {
            let range = LiquidityRange::new(active - below, active + above).unwrap();
            let weights = compute_weights(range, shape, amount_x, amount_y, active, None).unwrap();

            let expected_x = if amount_x > 0 { PRECISION } else { 0 };
            let expected_y = if amount_y > 0 { PRECISION } else { 0 };
            prop_assert_eq!(weights.sum_x(), expected_x);
            prop_assert_eq!(weights.sum_y(), expected_y);
            prop_assert_eq!(weights.bin_count(), range.bin_count());

            for (offset, bin_id) in weights.bin_ids().into_iter().enumerate() {
                if bin_id < active {
                    prop_assert_eq!(weights.weight_x[offset], 0);
                }
                if bin_id > active {
                    prop_assert_eq!(weights.weight_y[offset], 0);
                }
            }
        }
    }

    #[test]
    fn test_range_entirely_above_active_rejects_y() {
        let range = LiquidityRange::new(120, 130).unwrap();
        for shape in [
            DistributionShape::Uniform,
            DistributionShape::Curve,
            DistributionShape::BidAsk,
        ] {
            assert!(matches!(
                compute_weights(range, shape, 10, 10, 100, None),
                Err(LiquidityError::IncompatibleRange { .. })
            ));
            assert!(compute_weights(range, shape, 10, 0, 100, None).is_ok());
        }
    }
}

mod chunking_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_chunk_sums_within_rounding(
            below in 0i32..120,
            above in 0i32..120,
            limit in 1u32..40,
            amount_x in 1u64..u64::MAX / 2,
            amount_y in 1u64..u64::MAX / 2,
            slippage_bps in 0u16..=10_000,
            shape in shape_strategy(),
        ) {
            let active = 0;
            // Both sides need at least one eligible bin
            let range = LiquidityRange::new(active - below, active + above).unwrap();
            let weights = compute_weights(range, shape, amount_x, amount_y, active, None).unwrap();
            let min_x = dlmm_liquidity_engine::min_amount(amount_x, slippage_bps).unwrap();
            let min_y = dlmm_liquidity_engine::min_amount(amount_y, slippage_bps).unwrap();

            let chunks = chunk(&weights, amount_x, amount_y, min_x, min_y, limit).unwrap();
            let size = range.bin_count();
            prop_assert_eq!(chunks.len(), size.div_ceil(limit as usize));

            let n = chunks.len() as u64;
            let total_x: u64 = chunks.iter().map(|c| c.amount_x).sum();
            let total_y: u64 = chunks.iter().map(|c| c.amount_y).sum();
            prop_assert!(total_x <= amount_x && total_x + n >= amount_x);
            prop_assert!(total_y <= amount_y && total_y + n >= amount_y);

            let total_min_x: u64 = chunks.iter().map(|c| c.amount_x_min).sum();
            let total_min_y: u64 = chunks.iter().map(|c| c.amount_y_min).sum();
            prop_assert!(total_min_x <= min_x);
            prop_assert!(total_min_y <= min_y);

            let mut next_bin = range.min_bin_id();
            for c in &chunks {
                prop_assert_eq!(c.range.min_bin_id(), next_bin);
                next_bin = c.range.max_bin_id() + 1;
                let sum_x: u128 = c.weight_x.iter().sum();
                let sum_y: u128 = c.weight_y.iter().sum();
                prop_assert!(sum_x == PRECISION || sum_x == 0);
                prop_assert!(sum_y == PRECISION || sum_y == 0);
            }
            prop_assert_eq!(next_bin, range.max_bin_id() + 1);
        }
    }
}

mod range_sync_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_min_price_read_back_is_idempotent(
            bin_step in 1u16..=100,
            price_milli in 1u64..5_000,
            base_is_y in any::<bool>(),
        ) {
            let converter = BinPriceConverter::new(bin_step, 6, 6).unwrap();
            let base = if base_is_y { PriceBase::Y } else { PriceBase::X };
            let state = RangeSyncState::centered(0, 1, base).unwrap();
            // Wide range so the edit never crosses the opposite edge
            let state = state.apply(&converter, RangeAction::SetSliderOffsets { lo: -2000, hi: 2000 });

            let text = format!("{}.{:03}", price_milli / 1000, price_milli % 1000);
            let once = state.apply(&converter, RangeAction::SetMinPriceAbsolute(text));
            let shown = once.view(&converter).unwrap().min_price;
            let twice = once.apply(&converter, RangeAction::SetMinPriceAbsolute(shown.to_string()));

            prop_assert_eq!(once, twice);
            prop_assert!(once.min_bin_id() <= once.max_bin_id());
        }

        #[test]
        fn prop_any_edit_keeps_min_le_max(
            lo in -500i32..500,
            hi in -500i32..500,
            count in 0u32..300,
            percent in -150i64..150,
        ) {
            let converter = BinPriceConverter::new(10, 9, 6).unwrap();
            let mut state = RangeSyncState::centered(1000, 51, PriceBase::X).unwrap();
            for action in [
                RangeAction::SetSliderOffsets { lo, hi },
                RangeAction::SetBinCount(count),
                RangeAction::SetMaxPricePercent(percent.to_string()),
                RangeAction::SetMinPricePercent((-percent).to_string()),
                RangeAction::SetPriceBase(PriceBase::Y),
                RangeAction::SetMinPricePercent(percent.to_string()),
            ] {
                state = state.apply(&converter, action);
                prop_assert!(state.min_bin_id() <= state.max_bin_id());
            }
        }
    }

    #[test]
    fn test_edits_feed_the_planner() -> Result<()> {
        let converter = BinPriceConverter::new(25, 9, 6)?;
        let state = RangeSyncState::centered(100, 69, PriceBase::X)?
            .apply(&converter, RangeAction::SetSliderOffsets { lo: -10, hi: 10 });

        let request = AddLiquidityRequest {
            range: state.range(),
            shape: DistributionShape::Uniform,
            curve_param: None,
            amount_x: 1000,
            amount_y: 1000,
            slippage_tolerance_bps: 50,
            bin_count_limit: 7,
        };
        let plan = plan_add_liquidity(&request, state.active_bin_id())?;

        assert_eq!(plan.chunk_count(), 3);
        assert_eq!(plan.weights.weight_x[20], 100_000_000_000_000_000);
        Ok(())
    }
}

mod submission_tests {
    use super::*;

    struct FlakySubmitter {
        fail_at: Option<usize>,
        submitted: Vec<usize>,
    }

    impl ChunkSubmitter for FlakySubmitter {
        async fn submit(&mut self, chunk: &Chunk) -> Result<SubmissionReceipt, String> {
            tokio::task::yield_now().await;
            self.submitted.push(chunk.index);
            if self.fail_at == Some(chunk.index) {
                return Err(format!("chunk {} rejected", chunk.index));
            }
            Ok(SubmissionReceipt {
                chunk_index: chunk.index,
                signature: format!("mock_sig_{}", chunk.index),
                confirmed_at: Utc::now(),
            })
        }
    }

    fn scenario_request() -> AddLiquidityRequest {
        AddLiquidityRequest {
            range: LiquidityRange::new(90, 110).unwrap(),
            shape: DistributionShape::Curve,
            curve_param: Some(dec!(0.1)),
            amount_x: 1_000_000,
            amount_y: 2_000_000,
            slippage_tolerance_bps: 100,
            bin_count_limit: 7,
        }
    }

    #[tokio::test]
    async fn test_plan_then_submit_everything() -> Result<()> {
        let plan = plan_add_liquidity(&scenario_request(), 100)?;
        let mut submitter = FlakySubmitter {
            fail_at: None,
            submitted: vec![],
        };

        let mut sequencer = ChunkSequencer::new(plan.chunks.clone());
        let report = sequencer.run(&mut submitter).await;

        assert!(report.is_complete());
        assert_eq!(report.total, 3);
        assert_eq!(submitter.submitted, vec![0, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_completion_is_reported() -> Result<()> {
        let plan = plan_add_liquidity(&scenario_request(), 100)?;
        let mut submitter = FlakySubmitter {
            fail_at: Some(2),
            submitted: vec![],
        };

        let mut sequencer = ChunkSequencer::new(plan.chunks);
        let report = sequencer.run(&mut submitter).await;

        assert_eq!(report.summary(), "2 of 3 chunks completed");
        assert_eq!(sequencer.state(), SubmissionState::Aborted { index: 2 });
        match report.failure {
            Some(LiquidityError::ChunkSubmissionFailed { index, completed, total, .. }) => {
                assert_eq!((index, completed, total), (2, 2, 3));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        Ok(())
    }
}
