//! Sequential batch orchestrator.
//!
//! For every non-blank input line, in file order:
//! 1. Derive the address (failures are skipped, not counted as checked)
//! 2. Fetch its balance (failures are skipped, counted as checked)
//! 3. Append the balance record to the output file
//!
//! One phrase is fully handled before the next one starts. Per-phrase errors
//! never abort the run; I/O errors on the input or output file do.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use seedscan_balance::{
    BalanceApiConfig, BalanceError, BalanceFetcher, BlockberryClient, RetryPolicy,
};
use seedscan_common::types::{BatchConfig, BatchProgress, BatchSummary};
use seedscan_derive::{AddressDeriver, SuiDeriver};

use crate::reader::{PhraseLine, read_phrases};
use crate::writer::OutputWriter;

/// What happened to a single phrase.
#[derive(Debug)]
enum PhraseOutcome {
    Saved,
    DerivationFailed,
    BalanceFailed,
    Cancelled,
}

/// Runs one batch over `config.input_path`, writing to `config.output_path`.
pub struct BatchOrchestrator<D, F> {
    config: BatchConfig,
    deriver: D,
    fetcher: F,
}

impl BatchOrchestrator<SuiDeriver, BlockberryClient> {
    /// Production wiring: Sui derivation and the Blockberry balance API.
    pub fn for_sui(
        config: BatchConfig,
        balance_api_url: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, BalanceError> {
        let fetcher = BlockberryClient::new(BalanceApiConfig {
            base_url: balance_api_url.to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::new(config.retry_limit, config.retry_delay),
            request_timeout,
        })?;
        Ok(Self::new(config, SuiDeriver::new(), fetcher))
    }
}

impl<D: AddressDeriver, F: BalanceFetcher> BatchOrchestrator<D, F> {
    pub fn new(config: BatchConfig, deriver: D, fetcher: F) -> Self {
        Self {
            config,
            deriver,
            fetcher,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process the whole input file.
    ///
    /// `cancel` is checked before each phrase and raced against every balance
    /// lookup. Progress is published to `progress` after each phrase.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        progress: &watch::Sender<BatchProgress>,
    ) -> anyhow::Result<BatchSummary> {
        let phrases = read_phrases(&self.config.input_path).await?;
        let mut summary = BatchSummary {
            total: phrases.len(),
            ..Default::default()
        };
        let mut state = BatchProgress {
            total: phrases.len(),
            ..Default::default()
        };
        progress.send_replace(state);

        let mut writer = OutputWriter::create(&self.config.output_path).await?;

        tracing::info!(
            total = summary.total,
            input = %self.config.input_path.display(),
            output = %self.config.output_path.display(),
            deriver = self.deriver.name(),
            "Processing seed phrases and fetching balances"
        );

        for line in &phrases {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            match self.process_phrase(line, &mut writer, &cancel, &mut summary).await? {
                PhraseOutcome::Cancelled => {
                    summary.cancelled = true;
                    break;
                }
                PhraseOutcome::Saved
                | PhraseOutcome::DerivationFailed
                | PhraseOutcome::BalanceFailed => {
                    state.processed += 1;
                }
            }

            state.checked = summary.checked;
            state.saved = summary.saved;
            progress.send_replace(state);
        }

        state.checked = summary.checked;
        state.saved = summary.saved;
        progress.send_replace(state);

        let written = writer.finish().await?;
        tracing::debug!(
            records = written,
            output = %self.config.output_path.display(),
            "Output closed"
        );

        if summary.cancelled {
            tracing::warn!(
                processed = state.processed,
                total = summary.total,
                checked = summary.checked,
                saved = summary.saved,
                "Batch cancelled"
            );
        } else {
            tracing::info!(
                checked = summary.checked,
                saved = summary.saved,
                derivation_failures = summary.derivation_failures,
                balance_failures = summary.balance_failures,
                "Batch finished"
            );
        }

        Ok(summary)
    }

    async fn process_phrase(
        &self,
        line: &PhraseLine,
        writer: &mut OutputWriter,
        cancel: &CancellationToken,
        summary: &mut BatchSummary,
    ) -> anyhow::Result<PhraseOutcome> {
        let address = match self.deriver.derive(&line.phrase) {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(
                    line = line.line_number,
                    phrase = %line.phrase.redacted(),
                    error = %e,
                    "Failed to derive address"
                );
                summary.derivation_failures += 1;
                return Ok(PhraseOutcome::DerivationFailed);
            }
        };

        summary.checked += 1;
        tracing::debug!(line = line.line_number, address = %address, "Derived address");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.fetcher.fetch(&address) => Some(result),
        };

        match fetched {
            None => Ok(PhraseOutcome::Cancelled),
            Some(Ok(record)) => {
                writer.write_record(&record).await?;
                summary.saved += 1;
                tracing::info!(line = line.line_number, address = %address, "Saved balance");
                Ok(PhraseOutcome::Saved)
            }
            Some(Err(e)) => {
                tracing::warn!(
                    line = line.line_number,
                    address = %address,
                    kind = e.kind(),
                    error = %e,
                    "Failed to fetch balance"
                );
                summary.balance_failures += 1;
                Ok(PhraseOutcome::BalanceFailed)
            }
        }
    }
}
