//! Integration tests for the batch orchestrator.
//!
//! Uses in-memory derivers/fetchers for pipeline semantics and a wiremock
//! server for the full Sui + Blockberry wiring.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seedscan_balance::{BalanceError, BalanceFetcher};
use seedscan_common::types::{
    BalanceRecord, BatchConfig, BatchProgress, DerivedAddress, SeedPhrase,
};
use seedscan_derive::{AddressDeriver, DerivationError};
use seedscan_engine::BatchOrchestrator;

const VALID_12: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// ============================================================
// Helpers
// ============================================================

/// Derives `addr-<first word>` for phrases starting with "good", fails otherwise.
/// Records every phrase it was asked about.
#[derive(Default)]
struct FakeDeriver {
    seen: Arc<Mutex<Vec<String>>>,
}

impl AddressDeriver for FakeDeriver {
    fn derive(&self, phrase: &SeedPhrase) -> Result<DerivedAddress, DerivationError> {
        self.seen.lock().unwrap().push(phrase.as_str().to_string());
        let first = phrase.as_str().split_whitespace().next().unwrap_or_default();
        if first.starts_with("good") {
            Ok(DerivedAddress::new(format!("addr-{first}")))
        } else {
            Err(DerivationError::InvalidMnemonic("unknown word".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Answers from a fixed table; unknown addresses get HTTP 404.
struct TableFetcher {
    answers: HashMap<String, Result<BalanceRecord, BalanceError>>,
}

impl TableFetcher {
    fn new(entries: Vec<(&str, Result<BalanceRecord, BalanceError>)>) -> Self {
        Self {
            answers: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

impl BalanceFetcher for TableFetcher {
    async fn fetch(&self, address: &DerivedAddress) -> Result<BalanceRecord, BalanceError> {
        self.answers
            .get(address.as_str())
            .cloned()
            .unwrap_or(Err(BalanceError::Http { status: 404 }))
    }
}

/// Resolves the first lookup, then never answers.
struct StallingFetcher {
    calls: Mutex<u32>,
}

impl BalanceFetcher for StallingFetcher {
    async fn fetch(&self, address: &DerivedAddress) -> Result<BalanceRecord, BalanceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if call == 1 {
            Ok(record(address.as_str()))
        } else {
            std::future::pending().await
        }
    }
}

fn record(tag: &str) -> BalanceRecord {
    BalanceRecord::new(serde_json::json!({ "address": tag, "totalBalance": 1 }))
}

fn batch_config(dir: &Path, input: &str) -> BatchConfig {
    let input_path = dir.join("input.txt");
    std::fs::write(&input_path, input).unwrap();
    BatchConfig {
        api_key: "test-key".to_string(),
        input_path,
        output_path: dir.join("out.txt"),
        retry_limit: 2,
        retry_delay: Duration::from_millis(5),
    }
}

fn output_lines(config: &BatchConfig) -> Vec<serde_json::Value> {
    std::fs::read_to_string(&config.output_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================
// Pipeline semantics
// ============================================================

#[tokio::test]
async fn test_saved_records_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "good1 x\ngood2 x\n  good3 x  \ngood4 x\n");
    let fetcher = TableFetcher::new(vec![
        ("addr-good1", Ok(record("g1"))),
        ("addr-good2", Err(BalanceError::Http { status: 500 })),
        ("addr-good3", Ok(record("g3"))),
        ("addr-good4", Ok(record("g4"))),
    ]);
    let orchestrator = BatchOrchestrator::new(config.clone(), FakeDeriver::default(), fetcher);
    let (tx, rx) = watch::channel(BatchProgress::default());

    let summary = orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.checked, 4);
    assert_eq!(summary.saved, 3);
    assert_eq!(summary.balance_failures, 1);
    assert!(!summary.cancelled);

    let lines = output_lines(&config);
    let tags: Vec<_> = lines.iter().map(|v| v["address"].as_str().unwrap()).collect();
    assert_eq!(tags, vec!["g1", "g3", "g4"]);

    let last = *rx.borrow();
    assert_eq!(
        last,
        BatchProgress {
            total: 4,
            processed: 4,
            checked: 4,
            saved: 3
        }
    );
}

#[tokio::test]
async fn test_blank_lines_are_never_derived_or_counted() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "\n   \ngood1 a\n\t\n\ngood2 b\n\n");
    let deriver = FakeDeriver::default();
    let fetcher = TableFetcher::new(vec![("addr-good1", Ok(record("g1")))]);
    let orchestrator = BatchOrchestrator::new(config, deriver, fetcher);
    let (tx, _rx) = watch::channel(BatchProgress::default());

    let summary = orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.checked, 2);
    assert_eq!(summary.saved, 1);
}

#[tokio::test]
async fn test_counter_invariants_hold_with_mixed_failures() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "good1 x\nbad phrase\n\ngood2 y\nnope\n");
    let fetcher = TableFetcher::new(vec![
        ("addr-good1", Ok(record("g1"))),
        (
            "addr-good2",
            Err(BalanceError::Transport {
                attempts: 2,
                message: "refused".to_string(),
            }),
        ),
    ]);
    let orchestrator = BatchOrchestrator::new(config.clone(), FakeDeriver::default(), fetcher);
    let (tx, _rx) = watch::channel(BatchProgress::default());

    let summary = orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.derivation_failures, 2);
    assert_eq!(summary.checked, 2);
    assert_eq!(summary.saved, 1);
    assert!(summary.saved <= summary.checked);
    assert!(summary.checked <= summary.total);
    assert_eq!(output_lines(&config).len(), summary.saved);
}

#[tokio::test]
async fn test_deriver_sees_trimmed_phrases_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "  good1 a  \n\n\tbad b\n");
    let deriver = FakeDeriver::default();
    let seen = Arc::clone(&deriver.seen);
    let orchestrator = BatchOrchestrator::new(config, deriver, TableFetcher::new(vec![]));
    let (tx, _rx) = watch::channel(BatchProgress::default());

    orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["good1 a".to_string(), "bad b".to_string()]
    );
}

#[tokio::test]
async fn test_output_from_previous_run_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "good1 x\n");
    std::fs::write(&config.output_path, "old\nold\nold\n").unwrap();
    let fetcher = TableFetcher::new(vec![("addr-good1", Ok(record("g1")))]);
    let orchestrator = BatchOrchestrator::new(config.clone(), FakeDeriver::default(), fetcher);
    let (tx, _rx) = watch::channel(BatchProgress::default());

    orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(output_lines(&config).len(), 1);
}

#[tokio::test]
async fn test_missing_input_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = batch_config(dir.path(), "");
    config.input_path = dir.path().join("missing.txt");
    let orchestrator =
        BatchOrchestrator::new(config, FakeDeriver::default(), TableFetcher::new(vec![]));
    let (tx, _rx) = watch::channel(BatchProgress::default());

    let result = orchestrator.run(CancellationToken::new(), &tx).await;

    assert!(result.is_err());
}

// ============================================================
// Cancellation
// ============================================================

#[tokio::test]
async fn test_cancel_before_start_processes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "good1 x\ngood2 y\n");
    let fetcher = TableFetcher::new(vec![("addr-good1", Ok(record("g1")))]);
    let orchestrator = BatchOrchestrator::new(config.clone(), FakeDeriver::default(), fetcher);
    let (tx, _rx) = watch::channel(BatchProgress::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = orchestrator.run(cancel, &tx).await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.checked, 0);
    assert!(output_lines(&config).is_empty());
}

#[tokio::test]
async fn test_cancel_during_lookup_keeps_saved_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), "good1 x\ngood2 y\ngood3 z\n");
    let fetcher = StallingFetcher {
        calls: Mutex::new(0),
    };
    let orchestrator = BatchOrchestrator::new(config.clone(), FakeDeriver::default(), fetcher);
    let (tx, mut rx) = watch::channel(BatchProgress::default());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    let canceller = tokio::spawn(async move {
        // Wait until the first record is saved, then cancel the stalled lookup.
        rx.wait_for(|p| p.saved == 1).await.unwrap();
        trigger.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(cancel, &tx))
        .await
        .expect("run should stop once cancelled")
        .unwrap();
    canceller.await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.checked, 2);
    assert_eq!(output_lines(&config).len(), 1);
}

// ============================================================
// Full wiring: Sui derivation + Blockberry over HTTP
// ============================================================

#[tokio::test]
async fn test_example_scenario_against_mock_api() {
    let server = MockServer::start().await;
    let body = serde_json::json!([{ "coinType": "0x2::sui::SUI", "totalBalance": 0 }]);

    Mock::given(method("GET"))
        .and(path_regex(r"^/sui/v1/accounts/0x[0-9a-f]{64}/balance$"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = batch_config(dir.path(), &format!("{VALID_12}\n\nbad phrase\n"));
    let orchestrator = BatchOrchestrator::for_sui(
        config.clone(),
        &format!("{}/sui/v1", server.uri()),
        Some(Duration::from_secs(5)),
    )
    .unwrap();
    let (tx, _rx) = watch::channel(BatchProgress::default());

    let summary = orchestrator
        .run(CancellationToken::new(), &tx)
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.derivation_failures, 1);
    assert_eq!(summary.saved, 1);
    assert_eq!(output_lines(&config), vec![body]);
}
