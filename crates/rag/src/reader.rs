//! Document readers
//!
//! Plain text and markdown files only. Anything else is rejected before it
//! reaches the chunker.

use std::path::Path;

use crate::RagError;

/// File extensions the ingestion pipeline accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Check whether a filename has a supported extension
pub fn is_supported(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a document into a string
///
/// Fails with an ingestion error for unsupported extensions, unreadable
/// files, and files with no textual content.
pub async fn read_document(path: &Path) -> Result<String, RagError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if !is_supported(filename) {
        return Err(RagError::Ingestion(format!(
            "Unsupported file type: {} (supported: {})",
            filename,
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RagError::Ingestion(format!("Failed to read {}: {}", path.display(), e)))?;

    if content.trim().is_empty() {
        return Err(RagError::Ingestion(format!(
            "Document is empty: {}",
            path.display()
        )));
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported("notes.txt"));
        assert!(is_supported("README.md"));
        assert!(is_supported("UPPER.TXT"));
        assert!(!is_supported("report.pdf"));
        assert!(!is_supported("archive.tar.gz"));
        assert!(!is_supported("no_extension"));
    }

    #[tokio::test]
    async fn test_read_text_document() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Refund policy: thirty days.").unwrap();

        let content = read_document(file.path()).await.unwrap();
        assert!(content.contains("Refund policy"));
    }

    #[tokio::test]
    async fn test_read_unsupported_rejected() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = read_document(file.path()).await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_read_empty_rejected() {
        let file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        let result = read_document(file.path()).await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_read_missing_rejected() {
        let result = read_document(Path::new("/nonexistent/missing.txt")).await;
        assert!(matches!(result, Err(RagError::Ingestion(_))));
    }
}
