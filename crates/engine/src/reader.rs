use std::path::Path;

use anyhow::Context;
use seedscan_common::types::SeedPhrase;

/// A non-blank input line and its 1-based position in the file.
#[derive(Debug, Clone)]
pub struct PhraseLine {
    pub line_number: usize,
    pub phrase: SeedPhrase,
}

/// Read the whole phrase file eagerly.
///
/// Fails on missing files and on content that is not UTF-8.
pub async fn read_phrases(path: &Path) -> anyhow::Result<Vec<PhraseLine>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading phrase file {}", path.display()))?;
    Ok(parse_phrases(&contents))
}

/// Split into lines, trimming each one and dropping blanks.
pub fn parse_phrases(contents: &str) -> Vec<PhraseLine> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            SeedPhrase::from_line(line).map(|phrase| PhraseLine {
                line_number: idx + 1,
                phrase,
            })
        })
        .collect()
}
