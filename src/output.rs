// WHY: record layout matches what the annotation review tool imports; field
// names and the capitalized "Comments" key are part of that contract

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::annotator::LabeledSpan;

/// One annotated chunk, persisted as a single JSONL line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    /// Chunk number within its article.
    pub id: u32,
    /// Cleaned chunk text the span offsets refer to.
    pub text: String,
    /// `[start, end, category]` triples in acceptance order.
    pub label: Vec<(usize, usize, String)>,
    #[serde(rename = "Comments")]
    pub comments: Vec<String>,
}

impl AnnotationRecord {
    pub fn new(chunk: u32, text: String, spans: Vec<LabeledSpan>) -> Self {
        Self {
            id: chunk,
            text,
            label: spans
                .into_iter()
                .map(|s| (s.start, s.end, s.category))
                .collect(),
            comments: Vec::new(),
        }
    }
}

/// Output path for one annotated chunk: `<out_dir>/art<A>/art<A>_chunk_<C>.jsonl`.
pub fn record_path(out_dir: &Path, article: u32, chunk: u32) -> PathBuf {
    out_dir
        .join(format!("art{article}"))
        .join(format!("art{article}_chunk_{chunk}.jsonl"))
}

/// Write one record as a compact JSON line, creating parent directories.
pub async fn write_record(path: &Path, record: &AnnotationRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let line = serde_json::to_string(record).context("Failed to serialize annotation record")?;
    let file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    debug!("Wrote annotation record: {}", path.display());
    Ok(())
}

/// Per-chunk processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileStats {
    /// Chunk file path relative to invocation
    pub path: String,
    pub article: u32,
    pub chunk: u32,
    /// Number of characters in the cleaned text
    pub chars_processed: u64,
    /// Number of spans accepted
    pub spans_detected: u64,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Processing status (annotated, failed)
    pub status: String,
    /// Error message if processing failed
    pub error: Option<String>,
}

/// Whole-run summary written to the stats file.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunStats {
    pub chunks_total: u64,
    pub chunks_annotated: u64,
    pub chunks_failed: u64,
    pub spans_total: u64,
    pub files: Vec<FileStats>,
}

impl RunStats {
    pub fn record(&mut self, stats: FileStats) {
        self.chunks_total += 1;
        if stats.error.is_none() {
            self.chunks_annotated += 1;
            self.spans_total += stats.spans_detected;
        } else {
            self.chunks_failed += 1;
        }
        self.files.push(stats);
    }
}

/// Write the run summary as pretty JSON.
pub async fn write_run_stats(path: &Path, stats: &RunStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize run stats")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write stats file: {}", path.display()))?;
    Ok(())
}
