use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use prelabel::dictionary::DictionaryIndex;
use prelabel::output::{record_path, write_record, write_run_stats, FileStats, RunStats};
use prelabel::reader::read_chunk_text;
use prelabel::{
    clean_text, collect_chunks, Annotator, AnnotationRecord, ChunkRef, DiscoveryConfig,
    MatcherConfig, Scope, SimilarityBackend,
};

#[derive(Parser, Debug)]
#[command(name = "prelabel")]
#[command(about = "Dictionary-driven span pre-annotator for article text chunks")]
#[command(version)]
struct Args {
    /// Corpus root containing the articulos_limpios/ chunk tree
    root_dir: PathBuf,

    /// Dictionary resource mapping category names to term lists
    #[arg(long, default_value = "dictionary.json")]
    dictionary: PathBuf,

    /// Restrict the run to one article number
    #[arg(long)]
    article: Option<u32>,

    /// Restrict the run to one chunk of --article
    #[arg(long, requires = "article")]
    chunk: Option<u32>,

    /// Directory receiving art<N>/ JSONL output
    #[arg(long, default_value = "annotations")]
    out_dir: PathBuf,

    /// Use the strict matching profile (longer minimum terms, generic-word
    /// exclusion list)
    #[arg(long)]
    strict: bool,

    /// Similarity backend for the fuzzy pass
    #[arg(long, value_enum, default_value_t = BackendArg::Sequence)]
    similarity: BackendArg,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Sequence,
    EditDistance,
}

impl From<BackendArg> for SimilarityBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sequence => SimilarityBackend::Sequence,
            BackendArg::EditDistance => SimilarityBackend::EditDistance,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting prelabel");
    info!(?args, "Parsed CLI arguments");

    // WHY: validate root directory exists early to fail fast with clear error
    if !args.root_dir.exists() {
        anyhow::bail!("Root directory does not exist: {}", args.root_dir.display());
    }
    if !args.root_dir.is_dir() {
        anyhow::bail!("Root path is not a directory: {}", args.root_dir.display());
    }

    let scope = match (args.article, args.chunk) {
        (Some(article), Some(chunk)) => Scope::Chunk { article, chunk },
        (Some(article), None) => Scope::Article(article),
        _ => Scope::All,
    };

    // Dictionary problems are fatal before any annotation happens.
    let categories = prelabel::load_dictionary(&args.dictionary)?;
    let config = if args.strict {
        MatcherConfig::strict()
    } else {
        MatcherConfig::default()
    };
    let index = DictionaryIndex::compile(categories, config);
    info!(
        "Compiled dictionary: {} categories, {} terms",
        index.categories.len(),
        index.term_count()
    );
    let annotator = Annotator::with_backend(index, args.similarity.into())?;

    let discovery_config = DiscoveryConfig {
        fail_fast: args.fail_fast,
    };
    let chunks = collect_chunks(&args.root_dir, scope, discovery_config).await?;

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(chunks.len() as u64)
    };

    let mut run_stats = RunStats::default();
    for chunk in &chunks {
        let start_time = Instant::now();
        match process_chunk(&annotator, chunk, &args.out_dir).await {
            Ok((chars, spans)) => {
                run_stats.record(FileStats {
                    path: chunk.path.display().to_string(),
                    article: chunk.article,
                    chunk: chunk.chunk,
                    chars_processed: chars,
                    spans_detected: spans,
                    processing_time_ms: start_time.elapsed().as_millis() as u64,
                    status: "annotated".to_string(),
                    error: None,
                });
            }
            Err(e) => {
                if args.fail_fast {
                    return Err(e);
                }
                warn!("Failed to process {} (continuing): {e:#}", chunk.path.display());
                run_stats.record(FileStats {
                    path: chunk.path.display().to_string(),
                    article: chunk.article,
                    chunk: chunk.chunk,
                    chars_processed: 0,
                    spans_detected: 0,
                    processing_time_ms: start_time.elapsed().as_millis() as u64,
                    status: "failed".to_string(),
                    error: Some(format!("{e:#}")),
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    write_run_stats(&args.stats_out, &run_stats).await?;
    info!(
        "Annotation run completed: {} annotated, {} failed",
        run_stats.chunks_annotated, run_stats.chunks_failed
    );

    println!(
        "prelabel v{} - annotation complete",
        env!("CARGO_PKG_VERSION")
    );
    println!("Chunks processed: {}", run_stats.chunks_total);
    println!("Spans detected: {}", run_stats.spans_total);
    if run_stats.chunks_failed > 0 {
        println!("Chunks failed: {}", run_stats.chunks_failed);
    }
    println!("Stats written to: {}", args.stats_out.display());

    Ok(())
}

/// Annotate one chunk end to end: read, clean, match, write JSONL.
async fn process_chunk(
    annotator: &Annotator,
    chunk: &ChunkRef,
    out_dir: &std::path::Path,
) -> Result<(u64, u64)> {
    let raw = read_chunk_text(&chunk.path).await?;
    let text = clean_text(&raw);
    let chars = text.chars().count() as u64;

    let spans = annotator.annotate(&text);
    let span_count = spans.len() as u64;
    info!(
        "Annotated art{} chunk {}: {} spans",
        chunk.article, chunk.chunk, span_count
    );

    let record = AnnotationRecord::new(chunk.chunk, text, spans);
    let out_path = record_path(out_dir, chunk.article, chunk.chunk);
    write_record(&out_path, &record)
        .await
        .with_context(|| format!("Failed to write record for {}", chunk.path.display()))?;

    Ok((chars, span_count))
}
