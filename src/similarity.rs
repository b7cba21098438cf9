// WHY: the fuzzy pass depends only on this interface, so scoring stays a
// capability that can be swapped at startup without touching the matcher

/// Approximate string similarity on a 0–100 scale.
pub trait Similarity: Send + Sync {
    /// Score two already-normalized strings; 100 means identical.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Backend selection, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityBackend {
    /// Ratcliff/Obershelp sequence ratio, the reference scoring.
    #[default]
    Sequence,
    /// Normalized Levenshtein via strsim; cheaper, slightly stricter.
    EditDistance,
}

impl SimilarityBackend {
    pub fn create(self) -> Box<dyn Similarity> {
        match self {
            SimilarityBackend::Sequence => Box::new(SequenceRatio),
            SimilarityBackend::EditDistance => Box::new(EditDistanceRatio),
        }
    }
}

/// Ratcliff/Obershelp ratio: `200 * matches / (len(a) + len(b))`, with
/// matches counted by recursively splitting around the longest common
/// substring. Matches the scoring of difflib/rapidfuzz-style ratios.
pub struct SequenceRatio;

impl Similarity for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 100.0;
        }
        200.0 * matching_chars(&a, &b) as f64 / total as f64
    }
}

/// Edit-distance ratio backed by strsim's normalized Levenshtein.
pub struct EditDistanceRatio;

impl Similarity for EditDistanceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b) * 100.0
    }
}

/// Total characters covered by the matching blocks of `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Longest common substring by dynamic programming over suffix lengths.
    let mut best_len = 0;
    let mut best_a = 0;
    let mut best_b = 0;
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        for slot in cur.iter_mut() {
            *slot = 0;
        }
        for (j, &cb) in b.iter().enumerate() {
            if ca == cb {
                cur[j + 1] = prev[j] + 1;
                if cur[j + 1] > best_len {
                    best_len = cur[j + 1];
                    best_a = i + 1 - best_len;
                    best_b = j + 1 - best_len;
                }
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    if best_len == 0 {
        return 0;
    }

    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}
