use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Reduce a client-supplied name to something safe to join onto the upload directory.
/// Accents are decomposed and dropped (`résumé` becomes `resume`), whitespace folds to
/// `_`, only ASCII letters, digits, `.`, `_` and `-` survive, and leading or trailing
/// dots and underscores are stripped.
pub fn secure_filename(filename: &str) -> String {
    // browsers on Windows send the full path
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let ascii: String = base.nfkd().filter(char::is_ascii).collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(['.', '_'])
        .to_string()
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// The client sent a name that is empty or not an allowed type once sanitized.
    #[error("Invalid file name {0:?}. Please upload PDF, DOC, or DOCX.")]
    Rejected(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Resume storage on local disk.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload folder {}", self.root.display()))
    }

    /// Write the file under a timestamp-prefixed, sanitized name and return that name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let stamped = format!("{}_{}", Local::now().format("%Y%m%d%H%M%S"), original_name);
        let filename = secure_filename(&stamped);
        if filename.is_empty() || !allowed_file(&filename) {
            return Err(UploadError::Rejected(original_name.to_string()));
        }

        self.ensure_dir().await?;
        let path = self.root.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to save upload to {}", path.display()))?;

        tracing::info!(file = %filename, size = bytes.len(), "Stored resume");
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("resume.pdf"));
        assert!(allowed_file("Resume.DOCX"));
        assert!(allowed_file("my.cv.doc"));
        assert!(!allowed_file("resume"));
        assert!(!allowed_file("resume.exe"));
        assert!(!allowed_file("pdf"));
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Resume (final).pdf"), "My_Resume_final.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\asha\\cv.docx"), "cv.docx");
        assert_eq!(secure_filename("..hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("cv.pdf._"), "cv.pdf");
        assert_eq!(secure_filename("..."), "");
    }

    #[tokio::test]
    async fn test_save_writes_stamped_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = UploadStore::new(dir.path().join("uploads"));

        let name = store.save("Asha Rao CV.pdf", b"%PDF-1.4").await?;
        assert!(name.ends_with("_Asha_Rao_CV.pdf"));
        assert_eq!(name.len(), "20250101120000_Asha_Rao_CV.pdf".len());

        let written = tokio::fs::read(store.root().join(&name)).await?;
        assert_eq!(written, b"%PDF-1.4");
        Ok(())
    }

    #[test]
    fn test_secure_filename_strips_accents() {
        assert_eq!(secure_filename("résumé.pdf"), "resume.pdf");
        assert_eq!(secure_filename("Zoë Ångström CV.docx"), "Zoe_Angstrom_CV.docx");
        assert_eq!(secure_filename("履歴書.pdf"), "pdf");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let err = store.save("payload.sh", b"#!/bin/sh").await.unwrap_err();
        assert!(matches!(err, UploadError::Rejected(ref name) if name == "payload.sh"));
    }

    #[tokio::test]
    async fn test_save_reports_disk_failure_as_storage_error() -> Result<()> {
        // the upload root is a regular file, so creating the directory fails
        let blocker = tempfile::NamedTempFile::new()?;
        let store = UploadStore::new(blocker.path());

        let err = store.save("resume.pdf", b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, UploadError::Storage(_)));
        Ok(())
    }
}
