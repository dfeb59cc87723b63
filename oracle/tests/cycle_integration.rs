use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use tokio::sync::watch;

use oracle::{
    calculator::{ScalarConfig, compute_decision},
    chain::{ChainClient, ChainError, InclusionReceipt, OperatorSigner, TxAuthorization},
    error::AppError,
    execution::{FailureStage, SkipReason, UpdateOutcome, UpdateSubmitter},
    metrics::{Telemetry, TelemetryReader},
    price::{PriceAggregator, PriceError, PriceQuote, PriceSource},
    scheduler::UpdateCycle,
};

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const CHAIN_ID: u64 = 11_155_111;
const OVERHEAD: u64 = 188;

// -----------------------
// Scripted chain
// -----------------------

#[derive(Clone, Copy, Debug)]
enum WaitScript {
    Included,
    Reverted,
    TimedOut,
}

/// In-memory `SystemConfig`: a confirmed send updates the stored scalar.
struct ScriptedChain {
    scalar: Mutex<u128>,
    fail_scalar_read: AtomicBool,
    waits: Mutex<VecDeque<WaitScript>>,
    sent: Mutex<Vec<(U256, u128)>>,
    pending: Mutex<Option<u128>>,
    scalar_reads: AtomicUsize,
}

impl ScriptedChain {
    fn new(scalar: u128) -> Self {
        Self {
            scalar: Mutex::new(scalar),
            fail_scalar_read: AtomicBool::new(false),
            waits: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            scalar_reads: AtomicUsize::new(0),
        }
    }

    fn script_waits(&self, script: &[WaitScript]) {
        self.waits.lock().unwrap().extend(script.iter().copied());
    }

    fn sent(&self) -> Vec<(U256, u128)> {
        self.sent.lock().unwrap().clone()
    }

    fn stored_scalar(&self) -> u128 {
        *self.scalar.lock().unwrap()
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(CHAIN_ID)
    }

    async fn overhead(&self) -> Result<U256, ChainError> {
        Ok(U256::from(OVERHEAD))
    }

    async fn scalar(&self) -> Result<u128, ChainError> {
        self.scalar_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_scalar_read.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection reset".into()));
        }
        Ok(self.stored_scalar())
    }

    async fn send_gas_config(
        &self,
        auth: &TxAuthorization,
        overhead: U256,
        scalar: u128,
    ) -> Result<TxHash, ChainError> {
        assert_eq!(auth.chain_id, CHAIN_ID);
        let mut sent = self.sent.lock().unwrap();
        sent.push((overhead, scalar));
        *self.pending.lock().unwrap() = Some(scalar);
        Ok(TxHash::repeat_byte(sent.len() as u8))
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, ChainError> {
        let script = self
            .waits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(WaitScript::Included);
        let pending = self.pending.lock().unwrap().take();

        match script {
            WaitScript::TimedOut => Err(ChainError::Rpc("confirmation timed out".into())),
            WaitScript::Reverted => Ok(InclusionReceipt {
                tx_hash,
                block_number: 7,
                gas_used: 25_000,
                success: false,
            }),
            WaitScript::Included => {
                if let Some(scalar) = pending {
                    *self.scalar.lock().unwrap() = scalar;
                }
                Ok(InclusionReceipt {
                    tx_hash,
                    block_number: 7,
                    gas_used: 31_000,
                    success: true,
                })
            }
        }
    }
}

// -----------------------
// Scripted prices
// -----------------------

struct ScriptedPrice {
    usd_price: Mutex<f64>,
    fail: AtomicBool,
}

impl ScriptedPrice {
    fn new(usd_price: f64) -> Arc<Self> {
        Arc::new(Self {
            usd_price: Mutex::new(usd_price),
            fail: AtomicBool::new(false),
        })
    }

    fn set(&self, usd_price: f64) {
        *self.usd_price.lock().unwrap() = usd_price;
    }
}

#[async_trait]
impl PriceSource for ScriptedPrice {
    async fn quote(&self, symbol: &str) -> Result<PriceQuote, PriceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PriceError::Parse {
                symbol: symbol.to_string(),
                raw: "<html>502 Bad Gateway</html>".into(),
            });
        }
        Ok(PriceQuote {
            symbol: symbol.to_string(),
            usd_price: *self.usd_price.lock().unwrap(),
        })
    }
}

// -----------------------
// Harness
// -----------------------

struct Harness {
    cycle: UpdateCycle<ScriptedChain, OperatorSigner>,
    chain: Arc<ScriptedChain>,
    eth: Arc<ScriptedPrice>,
    token: Arc<ScriptedPrice>,
    reader: TelemetryReader,
}

fn harness(current_scalar: u128, eth_usd: f64, token_usd: f64) -> Harness {
    let chain = Arc::new(ScriptedChain::new(current_scalar));
    let eth = ScriptedPrice::new(eth_usd);
    let token = ScriptedPrice::new(token_usd);

    let prices = PriceAggregator::new(
        eth.clone(),
        "ETHUSDT".to_string(),
        token.clone(),
        "TOKENUSDT".to_string(),
    );
    let signer = Arc::new(OperatorSigner::from_hex(KEY, Some(CHAIN_ID)).unwrap());
    let submitter = UpdateSubmitter::new(chain.clone(), signer, CHAIN_ID);

    let telemetry = Telemetry::new();
    let reader = telemetry.reader();

    let cycle = UpdateCycle::new(
        prices,
        submitter,
        ScalarConfig::default(),
        telemetry,
    );

    Harness {
        cycle,
        chain,
        eth,
        token,
        reader,
    }
}

fn expected_target(eth_usd: f64, token_usd: f64, current: u128) -> u128 {
    compute_decision(eth_usd, token_usd, current, &ScalarConfig::default())
        .unwrap()
        .target_scalar
}

// -----------------------
// Tests
// -----------------------

#[tokio::test]
async fn large_drift_is_confirmed_and_stored() {
    let mut h = harness(100_000_000, 3000.0, 0.5);
    let target = expected_target(3000.0, 0.5, 100_000_000);

    let outcome = h.cycle.tick().await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Confirmed { block: 7, gas_used: 31_000, .. }));
    assert_eq!(h.chain.sent(), vec![(U256::from(OVERHEAD), target)]);
    assert_eq!(h.chain.stored_scalar(), target);
    assert_eq!(h.chain.scalar_reads.load(Ordering::SeqCst), 1);

    let snap = h.reader.snapshot();
    assert_eq!(snap.updates_total, 1);
    assert_eq!(snap.updates_success_total, 1);
    assert_eq!(snap.updates_failure_total, 0);
    assert!(snap.last_update_timestamp > 0);
    assert_eq!(snap.cycles_total, 1);
    assert_eq!(snap.cycle_errors_total, 0);
    assert_eq!(snap.reference_price_usd, 3000.0);
    assert_eq!(snap.target_price_usd, 0.5);
    assert_eq!(snap.target_scalar, target as f64);
}

#[tokio::test]
async fn stable_scalar_makes_no_write() {
    let current = expected_target(3000.0, 0.5, 0);
    let mut h = harness(current, 3000.0, 0.5);

    let outcome = h.cycle.tick().await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Skipped {
            reason: SkipReason::BelowThreshold
        }
    );
    assert!(h.chain.sent().is_empty());

    let snap = h.reader.snapshot();
    assert_eq!(snap.updates_total, 0);
    assert_eq!(snap.cycles_total, 1);
    assert_eq!(snap.cycle_errors_total, 0);
    assert_eq!(snap.current_scalar, current as f64);
}

#[tokio::test]
async fn confirmation_timeout_is_not_retried_and_next_cycle_recomputes() {
    let mut h = harness(100_000_000, 3000.0, 0.5);
    h.chain.script_waits(&[WaitScript::TimedOut]);
    let first_target = expected_target(3000.0, 0.5, 100_000_000);

    let first = h.cycle.tick().await.unwrap();
    match first {
        UpdateOutcome::Failed { stage, .. } => assert_eq!(stage, FailureStage::Confirm),
        other => panic!("expected confirm failure, got {other:?}"),
    }
    assert_eq!(h.chain.sent().len(), 1);
    assert_eq!(h.chain.stored_scalar(), 100_000_000);

    // Prices move before the next tick: the new target comes from fresh data.
    h.token.set(0.6);
    let second_target = expected_target(3000.0, 0.6, 100_000_000);
    assert_ne!(first_target, second_target);

    let second = h.cycle.tick().await.unwrap();
    assert!(matches!(second, UpdateOutcome::Confirmed { .. }));
    assert_eq!(
        h.chain.sent(),
        vec![
            (U256::from(OVERHEAD), first_target),
            (U256::from(OVERHEAD), second_target)
        ]
    );

    let snap = h.reader.snapshot();
    assert_eq!(snap.updates_total, 2);
    assert_eq!(snap.updates_success_total, 1);
    assert_eq!(snap.updates_failure_total, 1);
    assert_eq!(snap.cycles_total, 2);
    assert_eq!(snap.cycle_errors_total, 1);
}

#[tokio::test]
async fn revert_counts_as_failure() {
    let mut h = harness(100_000_000, 3000.0, 0.5);
    h.chain.script_waits(&[WaitScript::Reverted]);

    let outcome = h.cycle.tick().await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Reverted { block: 7, .. }));
    assert!(matches!(
        outcome.to_error(),
        Some(AppError::OnChainRevert { .. })
    ));
    assert_eq!(h.chain.stored_scalar(), 100_000_000);

    let snap = h.reader.snapshot();
    assert_eq!(snap.updates_total, 1);
    assert_eq!(snap.updates_failure_total, 1);
    assert_eq!(snap.last_update_timestamp, 0);
}

#[tokio::test]
async fn price_outage_aborts_cycle_before_chain_reads() {
    let mut h = harness(100_000_000, 3000.0, 0.5);
    h.eth.fail.store(true, Ordering::SeqCst);

    let err = h.cycle.tick().await.unwrap_err();
    match err {
        AppError::PriceUnavailable { symbol, .. } => assert_eq!(symbol, "ETHUSDT"),
        other => panic!("expected price error, got {other:?}"),
    }
    assert_eq!(h.chain.scalar_reads.load(Ordering::SeqCst), 0);

    // Recovery on the next tick.
    h.eth.fail.store(false, Ordering::SeqCst);
    let outcome = h.cycle.tick().await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Confirmed { .. }));

    let snap = h.reader.snapshot();
    assert_eq!(snap.cycles_total, 2);
    assert_eq!(snap.cycle_errors_total, 1);
}

#[tokio::test]
async fn zero_or_negative_prices_never_reach_the_chain() {
    for (eth_usd, token_usd) in [(0.0, 0.5), (-5.0, 0.5), (3000.0, 0.0)] {
        let mut h = harness(660_000_000, eth_usd, token_usd);

        let err = h.cycle.tick().await.unwrap_err();

        match err {
            AppError::PriceUnavailable {
                source: PriceError::NotPositive { .. },
                ..
            } => {}
            other => panic!("({eth_usd}, {token_usd}): unexpected error {other:?}"),
        }
        assert_eq!(h.chain.scalar_reads.load(Ordering::SeqCst), 0);
        assert!(h.chain.sent().is_empty());
        assert_eq!(h.chain.stored_scalar(), 660_000_000);
        assert_eq!(h.reader.snapshot().updates_total, 0);
    }
}

#[tokio::test]
async fn scalar_read_failure_ends_cycle_at_read_stage() {
    let mut h = harness(100_000_000, 3000.0, 0.5);
    h.chain.fail_scalar_read.store(true, Ordering::SeqCst);

    let outcome = h.cycle.tick().await.unwrap();

    match &outcome {
        UpdateOutcome::Failed { stage, .. } => assert_eq!(*stage, FailureStage::Read),
        other => panic!("expected read failure, got {other:?}"),
    }
    assert_eq!(outcome.to_error().unwrap().kind(), "contract_read");
    assert!(h.chain.sent().is_empty());

    let snap = h.reader.snapshot();
    assert_eq!(snap.updates_total, 0);
    assert_eq!(snap.cycle_errors_total, 1);
}

#[tokio::test(start_paused = true)]
async fn loop_ticks_immediately_then_on_interval_until_shutdown() {
    let h = harness(100_000_000, 3000.0, 0.5);
    let reader = h.reader.clone();
    let chain = h.chain.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(h.cycle.run(Duration::from_secs(60), shutdown_rx));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(reader.snapshot().cycles_total, 1);
    assert_eq!(chain.sent().len(), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(reader.snapshot().cycles_total, 2);
    // Already at the new target: second cycle is gated.
    assert_eq!(chain.sent().len(), 1);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(reader.snapshot().cycles_total, 2);
}
