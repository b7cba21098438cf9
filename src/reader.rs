use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Read an entire chunk file as UTF-8 text.
///
/// Chunks are small (a few KB of article text), so whole-file reads are
/// simpler and no slower than streaming. Errors carry the file path for
/// per-unit reporting in batch runs.
pub async fn read_chunk_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    debug!("Reading chunk file: {}", path.display());
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read chunk file: {}", path.display()))?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_chunk_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "El síndrome persiste.").unwrap();

        let text = read_chunk_text(file.path()).await.unwrap();
        assert_eq!(text, "El síndrome persiste.");
    }

    #[tokio::test]
    async fn test_read_missing_chunk_is_error() {
        let result = read_chunk_text("/nonexistent/art1_chunk_1.txt").await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("art1_chunk_1.txt"), "unhelpful error: {err}");
    }

    #[tokio::test]
    async fn test_read_non_utf8_chunk_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0xFF, 0xFE, 0xFD]).unwrap();

        assert!(read_chunk_text(file.path()).await.is_err());
    }
}
