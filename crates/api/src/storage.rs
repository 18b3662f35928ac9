//! Files under the media root: uploaded phrase lists and job outputs.

use std::path::{Path, PathBuf};

use seedscan_common::error::AppError;
use uuid::Uuid;

const MAX_STORED_NAME_LEN: usize = 100;
const FALLBACK_UPLOAD_NAME: &str = "upload.txt";

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Location of a file stored under the root by this server.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Persist an upload as `<uuid>-<sanitized name>` and return the stored name.
    pub async fn save_upload(
        &self,
        original_name: Option<&str>,
        contents: &[u8],
    ) -> Result<String, AppError> {
        self.ensure_root().await?;
        let stored = format!(
            "{}-{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(original_name.unwrap_or(FALLBACK_UPLOAD_NAME))
        );
        tokio::fs::write(self.path_of(&stored), contents).await?;

        tracing::debug!(stored = %stored, bytes = contents.len(), "Stored upload");
        Ok(stored)
    }

    /// Map a requested download name to a file inside the root.
    ///
    /// Returns `Ok(None)` when no such file exists, and a validation error
    /// for names that are not a single path component or that resolve
    /// outside the root (e.g. through a symlink).
    pub async fn resolve_download(&self, filename: &str) -> Result<Option<PathBuf>, AppError> {
        if !is_plain_file_name(filename) {
            return Err(AppError::Validation(format!(
                "Invalid file name: {filename}"
            )));
        }

        let root = match tokio::fs::canonicalize(&self.root).await {
            Ok(root) => root,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let candidate = match tokio::fs::canonicalize(root.join(filename)).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !candidate.starts_with(&root) {
            tracing::warn!(requested = %filename, "Download resolved outside media root");
            return Err(AppError::Validation(format!(
                "Invalid file name: {filename}"
            )));
        }

        let is_file = tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        Ok(is_file.then_some(candidate))
    }
}

/// A single, non-special path component.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).is_relative()
}

/// Reduce a client-supplied file name to a safe basename.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STORED_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        FALLBACK_UPLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("results-1.txt"));
        assert!(is_plain_file_name("balances.txt"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name("a/b.txt"));
        assert!(!is_plain_file_name("a\\b.txt"));
        assert!(!is_plain_file_name("/etc/passwd"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("phrases.txt"), "phrases.txt");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\my list.txt"), "my_list.txt");
        assert_eq!(sanitize_file_name("..."), "upload.txt");
        assert_eq!(sanitize_file_name(""), "upload.txt");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_STORED_NAME_LEN);
    }

    #[tokio::test]
    async fn test_save_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().join("media"));

        let stored = storage
            .save_upload(Some("../seeds.txt"), b"one\ntwo\n")
            .await
            .unwrap();
        assert!(stored.ends_with("-seeds.txt"));

        let resolved = storage.resolve_download(&stored).await.unwrap().unwrap();
        assert_eq!(std::fs::read(resolved).unwrap(), b"one\ntwo\n");
    }

    #[tokio::test]
    async fn test_resolve_missing_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().to_path_buf());

        assert!(storage.resolve_download("nope.txt").await.unwrap().is_none());
        assert!(matches!(
            storage.resolve_download("../secret").await,
            Err(AppError::Validation(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        std::fs::write(&secret, "top secret").unwrap();

        let media = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&secret, media.path().join("link.txt")).unwrap();
        let storage = MediaStorage::new(media.path().to_path_buf());

        assert!(matches!(
            storage.resolve_download("link.txt").await,
            Err(AppError::Validation(_))
        ));
    }
}
