use std::path::{Path, PathBuf};

use anyhow::Context;
use seedscan_common::types::BalanceRecord;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Line-per-record output file, truncated when created.
///
/// Each record is flushed as soon as it is written, so an interrupted run
/// keeps everything saved before the interruption.
pub struct OutputWriter {
    path: PathBuf,
    file: BufWriter<File>,
    written: usize,
}

impl OutputWriter {
    pub async fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .await
            .with_context(|| format!("creating output file {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            written: 0,
        })
    }

    pub async fn write_record(&mut self, record: &BalanceRecord) -> anyhow::Result<()> {
        let mut line = record.to_line();
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("writing to {}", self.path.display()))?;
        self.file.flush().await?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close; returns the number of records written.
    pub async fn finish(mut self) -> anyhow::Result<usize> {
        self.file.flush().await?;
        self.file.shutdown().await?;
        Ok(self.written)
    }
}
