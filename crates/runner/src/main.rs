//! SeedScan CLI - check one phrase file from the terminal

use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use seedscan_balance::BalanceFetcher;
use seedscan_common::config::AppConfig;
use seedscan_common::types::{BatchProgress, BatchSummary};
use seedscan_derive::AddressDeriver;
use seedscan_engine::BatchOrchestrator;

/// Derive Sui addresses from seed phrases and save their balances
#[derive(Parser)]
#[command(name = "seedscan-runner", version, about, long_about = None)]
struct Cli {
    /// Phrase file, one phrase per line
    #[arg(short, long, env = "INPUT_PATH")]
    input: PathBuf,

    /// Output file (defaults to OUTPUT_FILE_NAME under MEDIA_ROOT)
    #[arg(short, long, env = "OUTPUT_PATH")]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seedscan_engine=info,seedscan_balance=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} phrases ({msg})",
        )
        .context("building progress bar style")?,
    );
    Ok(bar)
}

/// Mirror orchestrator progress onto the bar until the sender is dropped.
async fn follow_progress(mut rx: watch::Receiver<BatchProgress>, bar: ProgressBar) {
    loop {
        let progress = *rx.borrow_and_update();
        bar.set_length(progress.total as u64);
        bar.set_position(progress.processed as u64);
        bar.set_message(format!("checked {}, saved {}", progress.checked, progress.saved));
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Run one batch until it finishes or `shutdown` resolves.
///
/// On shutdown the run is cancelled and stops at the next phrase boundary.
/// `progress` is dropped on return so followers see the channel close.
async fn run_batch<D, F>(
    orchestrator: &BatchOrchestrator<D, F>,
    progress: watch::Sender<BatchProgress>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<BatchSummary>
where
    D: AddressDeriver,
    F: BalanceFetcher,
{
    let cancel = CancellationToken::new();
    let run = orchestrator.run(cancel.clone(), &progress);
    tokio::pin!(run);

    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = shutdown => None,
    };
    match finished {
        Some(result) => result,
        None => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
            cancel.cancel();
            run.await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::from_env()?;
    let output = cli.output.unwrap_or_else(|| config.default_output_path());
    let batch = config.batch_config(cli.input, output);
    let orchestrator = BatchOrchestrator::for_sui(
        batch,
        &config.balance_api_url,
        Some(config.request_timeout()),
    )?;

    let (progress_tx, progress_rx) = watch::channel(BatchProgress::default());
    let bar = progress_bar()?;
    let follower = tokio::spawn(follow_progress(progress_rx, bar.clone()));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };
    let result = run_batch(&orchestrator, progress_tx, shutdown).await;
    let _ = follower.await;
    bar.finish();

    let summary = result?;
    println!(
        "{} phrases, {} checked, {} saved{}",
        summary.total,
        summary.checked,
        summary.saved,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    println!("Results written to {}", orchestrator.config().output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use seedscan_balance::BalanceError;
    use seedscan_common::types::{BalanceRecord, BatchConfig, DerivedAddress, SeedPhrase};
    use seedscan_derive::DerivationError;

    use super::*;

    struct EchoDeriver;

    impl AddressDeriver for EchoDeriver {
        fn derive(&self, phrase: &SeedPhrase) -> Result<DerivedAddress, DerivationError> {
            Ok(DerivedAddress::new(phrase.as_str()))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    /// Never answers, so only cancellation can end a run.
    struct StalledFetcher;

    impl BalanceFetcher for StalledFetcher {
        async fn fetch(&self, _address: &DerivedAddress) -> Result<BalanceRecord, BalanceError> {
            std::future::pending().await
        }
    }

    struct InstantFetcher;

    impl BalanceFetcher for InstantFetcher {
        async fn fetch(&self, address: &DerivedAddress) -> Result<BalanceRecord, BalanceError> {
            Ok(BalanceRecord::new(serde_json::json!({ "address": address.as_str() })))
        }
    }

    fn batch(dir: &std::path::Path) -> BatchConfig {
        let input_path = dir.join("phrases.txt");
        std::fs::write(&input_path, "one\ntwo\n").unwrap();
        BatchConfig {
            api_key: "k".to_string(),
            input_path,
            output_path: dir.join("out.txt"),
            retry_limit: 1,
            retry_delay: std::time::Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_run_batch_completes_and_closes_progress() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = BatchOrchestrator::new(batch(dir.path()), EchoDeriver, InstantFetcher);
        let (tx, mut rx) = watch::channel(BatchProgress::default());

        let summary = run_batch(&orchestrator, tx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.saved, 2);
        assert!(!summary.cancelled);
        assert_eq!(rx.borrow_and_update().processed, 2);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_stalled_run() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = BatchOrchestrator::new(batch(dir.path()), EchoDeriver, StalledFetcher);
        let (tx, mut rx) = watch::channel(BatchProgress::default());

        let summary = run_batch(&orchestrator, tx, async {}).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.saved, 0);
        assert!(rx.changed().await.is_err());
    }
}
