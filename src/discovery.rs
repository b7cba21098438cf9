use anyhow::{Context, Result};
use futures::stream::{Stream, StreamExt};
use glob::glob;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Directory under the corpus root holding cleaned article chunks.
pub const CHUNKS_DIR: &str = "articulos_limpios";

/// Which chunk files a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every chunk of every article.
    All,
    /// Every chunk of one article.
    Article(u32),
    /// One specific chunk.
    Chunk { article: u32, chunk: u32 },
}

impl Scope {
    fn glob_pattern(&self, root: &Path) -> String {
        let base = root.join(CHUNKS_DIR);
        match self {
            Scope::All => format!("{}/art*/art*_chunk_*.txt", base.display()),
            Scope::Article(a) => {
                format!("{}/art{a}/art{a}_chunk_*.txt", base.display())
            }
            Scope::Chunk { article, chunk } => {
                format!(
                    "{}/art{article}/art{article}_chunk_{chunk}.txt",
                    base.display()
                )
            }
        }
    }
}

/// One discovered chunk file with its parsed identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRef {
    pub path: PathBuf,
    pub article: u32,
    pub chunk: u32,
}

/// Configuration for chunk discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Discover chunk files under `root` matching `scope`.
///
/// Returns an async stream of parsed [`ChunkRef`]s. Files inside the chunk
/// tree that do not follow the `art<A>_chunk_<C>.txt` naming are logged and
/// skipped.
pub fn discover_chunks(
    root: impl AsRef<Path>,
    scope: Scope,
    config: DiscoveryConfig,
) -> impl Stream<Item = Result<ChunkRef>> {
    let pattern = scope.glob_pattern(root.as_ref());
    debug!("Starting chunk discovery with pattern: {}", pattern);

    futures::stream::unfold(
        DiscoveryState::new(pattern, config),
        |mut state| async move { state.next_chunk().await.map(|result| (result, state)) },
    )
}

struct DiscoveryState {
    pattern: String,
    config: DiscoveryConfig,
    glob_iter: Option<glob::Paths>,
    name_pattern: Option<Regex>,
}

impl DiscoveryState {
    fn new(pattern: String, config: DiscoveryConfig) -> Self {
        Self {
            pattern,
            config,
            glob_iter: None,
            name_pattern: None,
        }
    }

    async fn next_chunk(&mut self) -> Option<Result<ChunkRef>> {
        if self.glob_iter.is_none() {
            match glob(&self.pattern) {
                Ok(paths) => self.glob_iter = Some(paths),
                Err(e) => {
                    return Some(Err(anyhow::anyhow!("Failed to create glob pattern: {e}")))
                }
            }
            match Regex::new(r"^art(\d+)_chunk_(\d+)\.txt$") {
                Ok(re) => self.name_pattern = Some(re),
                Err(e) => return Some(Err(anyhow::anyhow!("Invalid chunk name pattern: {e}"))),
            }
        }

        loop {
            let next = self.glob_iter.as_mut()?.next();
            match next {
                Some(Ok(path)) => match self.parse_and_validate(path).await {
                    Ok(Some(chunk)) => return Some(Ok(chunk)),
                    Ok(None) => continue,
                    Err(e) => {
                        if self.config.fail_fast {
                            return Some(Err(e));
                        }
                        warn!("Chunk validation error (continuing): {e}");
                        continue;
                    }
                },
                Some(Err(e)) => {
                    let error_msg = format!("Glob iteration error: {e}");
                    if self.config.fail_fast {
                        return Some(Err(anyhow::anyhow!(error_msg)));
                    }
                    warn!("{}", error_msg);
                    continue;
                }
                None => {
                    debug!("Chunk discovery completed");
                    return None;
                }
            }
        }
    }

    async fn parse_and_validate(&self, path: PathBuf) -> Result<Option<ChunkRef>> {
        let Some(captures) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.name_pattern.as_ref()?.captures(n))
        else {
            debug!("Ignoring non-chunk file: {}", path.display());
            return Ok(None);
        };

        let article: u32 = captures[1].parse().context("article number out of range")?;
        let chunk: u32 = captures[2].parse().context("chunk number out of range")?;

        let metadata = fs::metadata(&path)
            .await
            .with_context(|| format!("Cannot access chunk file: {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("Chunk path is not a file: {}", path.display());
        }

        Ok(Some(ChunkRef {
            path,
            article,
            chunk,
        }))
    }
}

/// Collect discovered chunks into a Vec, sorted by article then chunk number.
///
/// A [`Scope::Chunk`] that matches nothing is an error (the requested unit is
/// missing); empty results for broader scopes are reported but not fatal.
pub async fn collect_chunks(
    root: impl AsRef<Path>,
    scope: Scope,
    config: DiscoveryConfig,
) -> Result<Vec<ChunkRef>> {
    let mut chunks = Vec::new();
    let mut stream = Box::pin(discover_chunks(root.as_ref(), scope, config));
    while let Some(result) = stream.next().await {
        chunks.push(result?);
    }

    // WHY: glob yields lexicographic order, which puts art10 before art2;
    // downstream reporting expects numeric order
    chunks.sort_by_key(|c| (c.article, c.chunk));

    if chunks.is_empty() {
        if let Scope::Chunk { article, chunk } = scope {
            anyhow::bail!(
                "Chunk file not found: {}",
                root.as_ref()
                    .join(CHUNKS_DIR)
                    .join(format!("art{article}"))
                    .join(format!("art{article}_chunk_{chunk}.txt"))
                    .display()
            );
        }
        warn!("No chunk files found for scope {scope:?}");
    }

    info!(
        "Discovered {} chunk files for scope {:?}",
        chunks.len(),
        scope
    );
    Ok(chunks)
}
