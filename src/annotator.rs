// WHY: the matcher owns no shared mutable state; one call works entirely on
// its local occupied-interval set, so per-chunk calls can run concurrently

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::cleaning::normalize_for_matching;
use crate::dictionary::{CompiledTerm, DictionaryIndex};
use crate::lemma::term_signature;
use crate::similarity::{Similarity, SimilarityBackend};

/// Half-open char-offset interval over the cleaned text plus its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSpan {
    pub start: usize,
    pub end: usize,
    pub category: String,
}

/// Dictionary-driven span annotator.
///
/// Built once from a compiled [`DictionaryIndex`] and a similarity backend;
/// [`Annotator::annotate`] is then total over any cleaned text and produces
/// pairwise non-overlapping spans.
pub struct Annotator {
    index: DictionaryIndex,
    similarity: Box<dyn Similarity>,
    token_pattern: Regex,
}

impl Annotator {
    /// Create an annotator with the default similarity backend.
    pub fn new(index: DictionaryIndex) -> Result<Self> {
        Self::with_backend(index, SimilarityBackend::default())
    }

    /// Create an annotator with an explicit similarity backend.
    pub fn with_backend(index: DictionaryIndex, backend: SimilarityBackend) -> Result<Self> {
        Ok(Self {
            index,
            similarity: backend.create(),
            token_pattern: Regex::new(r"[\w-]+")?,
        })
    }

    pub fn index(&self) -> &DictionaryIndex {
        &self.index
    }

    /// Annotate cleaned text with non-overlapping labeled spans.
    ///
    /// Categories are visited in dictionary load order, terms longest first.
    /// Each term gets an exact pass (all non-overlapping occurrences kept);
    /// terms that found nothing and are long enough get one fuzzy concession
    /// against the text's distinct word tokens. Spans are returned in
    /// acceptance order, not positional order.
    pub fn annotate(&self, text: &str) -> Vec<LabeledSpan> {
        let offsets = CharOffsets::new(text);
        let tokens = self.token_pool(text, &offsets);
        let config = &self.index.config;

        let mut spans: Vec<LabeledSpan> = Vec::new();
        let mut used: Vec<(usize, usize)> = Vec::new();

        for category in &self.index.categories {
            debug!(
                "Matching category {:?} ({} terms)",
                category.name,
                category.terms.len()
            );
            for term in &category.terms {
                let mut matched_here = false;

                // Exact pass: every non-overlapping occurrence counts.
                for m in term.pattern.find_iter(text) {
                    let start = offsets.to_char(m.start());
                    let end = offsets.to_char(m.end());
                    if overlaps_any(&used, start, end) {
                        continue;
                    }
                    if term_signature(m.as_str()) != term.signature {
                        continue;
                    }
                    debug!(
                        "Exact match: {:?} -> {:?} ({})",
                        m.as_str(),
                        term.term,
                        category.name
                    );
                    spans.push(LabeledSpan {
                        start,
                        end,
                        category: category.name.clone(),
                    });
                    used.push((start, end));
                    matched_here = true;
                }

                if matched_here || term.term.chars().count() < config.min_fuzzy_len {
                    continue;
                }

                // Fuzzy pass: at most one concession per term.
                if let Some(span) = self.fuzzy_match(term, &category.name, &tokens, &used) {
                    used.push((span.start, span.end));
                    spans.push(span);
                }
            }
        }

        spans
    }

    /// Find the first token similar enough to stand in for `term`.
    fn fuzzy_match(
        &self,
        term: &CompiledTerm,
        category: &str,
        tokens: &[TokenOccurrences],
        used: &[(usize, usize)],
    ) -> Option<LabeledSpan> {
        let config = &self.index.config;
        let target = normalize_for_matching(&term.term);
        let target_signature = term_signature(&target);

        for token in tokens {
            if token.surface.chars().count() < config.min_fuzzy_len {
                continue;
            }
            let normalized = normalize_for_matching(&token.surface);
            // tokens from the term's own inflectional family belong to the
            // exact pass and must not be claimed again here
            if term_signature(&normalized) == target_signature {
                continue;
            }
            // first occurrence not already claimed by an accepted span
            let Some(&(start, end)) = token
                .occurrences
                .iter()
                .find(|&&(s, e)| !overlaps_any(used, s, e))
            else {
                continue;
            };
            let score = self.similarity.score(&normalized, &target);
            if score >= config.fuzzy_threshold {
                debug!(
                    "Fuzzy match ({score:.1}): {:?} -> {:?} ({category})",
                    token.surface, term.term
                );
                return Some(LabeledSpan {
                    start,
                    end,
                    category: category.to_string(),
                });
            }
        }
        None
    }

    /// Distinct word tokens in first-occurrence order, with every occurrence
    /// interval recorded so a fuzzy acceptance can land on the first
    /// occurrence that is still unclaimed.
    fn token_pool(&self, text: &str, offsets: &CharOffsets) -> Vec<TokenOccurrences> {
        let mut pool: Vec<TokenOccurrences> = Vec::new();
        for m in self.token_pattern.find_iter(text) {
            let interval = (offsets.to_char(m.start()), offsets.to_char(m.end()));
            match pool.iter_mut().find(|t| t.surface == m.as_str()) {
                Some(token) => token.occurrences.push(interval),
                None => pool.push(TokenOccurrences {
                    surface: m.as_str().to_string(),
                    occurrences: vec![interval],
                }),
            }
        }
        pool
    }
}

/// One distinct token surface and all of its occurrence intervals.
struct TokenOccurrences {
    surface: String,
    occurrences: Vec<(usize, usize)>,
}

/// Translation table from regex byte offsets to char offsets.
///
/// Output spans use char (Unicode scalar) offsets so downstream annotation
/// tools index the text the same way regardless of encoding.
struct CharOffsets {
    byte_starts: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        Self {
            byte_starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    fn to_char(&self, byte_offset: usize) -> usize {
        self.byte_starts.partition_point(|&b| b < byte_offset)
    }
}

/// Proper interval intersection: true when the candidate shares any char
/// index with a claimed interval.
fn overlaps_any(used: &[(usize, usize)], start: usize, end: usize) -> bool {
    used.iter().any(|&(s, e)| start < e && s < end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::MatcherConfig;

    fn annotator(categories: Vec<(&str, Vec<&str>)>, config: MatcherConfig) -> Annotator {
        let categories = categories
            .into_iter()
            .map(|(name, terms)| {
                (
                    name.to_string(),
                    terms.into_iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Annotator::new(DictionaryIndex::compile(categories, config)).unwrap()
    }

    fn span(start: usize, end: usize, category: &str) -> LabeledSpan {
        LabeledSpan {
            start,
            end,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_two_categories_two_spans() {
        let annotator = annotator(
            vec![("Disease", vec!["diabetes"]), ("Gene", vec!["BRCA1"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("Diabetes mellitus affects BRCA1 expression.");
        assert_eq!(
            spans,
            vec![span(0, 8, "Disease"), span(26, 31, "Gene")]
        );
    }

    #[test]
    fn test_suffix_rule_claims_inflected_form() {
        let annotator = annotator(
            vec![("Symptom", vec!["fatigue"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("Patients reported fatigued states.");
        assert_eq!(spans, vec![span(18, 26, "Symptom")]);
    }

    #[test]
    fn test_generic_term_does_not_match_suffixed_form() {
        let annotator = annotator(
            vec![("Process", vec!["note"])],
            MatcherConfig::strict(),
        );
        let spans = annotator.annotate("See the notes section.");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_longest_term_wins_overlapping_region() {
        let annotator = annotator(
            vec![("Condition", vec!["failure", "heart failure"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("acute heart failure onset");
        assert_eq!(spans, vec![span(6, 19, "Condition")]);
    }

    #[test]
    fn test_whole_word_boundary() {
        let annotator = annotator(
            vec![("Structure", vec!["cell"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("cellular structures of the cell");
        assert_eq!(spans, vec![span(27, 31, "Structure")]);
    }

    #[test]
    fn test_all_exact_occurrences_kept() {
        let annotator = annotator(
            vec![("Disease", vec!["diabetes"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("diabetes precedes gestational diabetes");
        assert_eq!(
            spans,
            vec![span(0, 8, "Disease"), span(30, 38, "Disease")]
        );
    }

    #[test]
    fn test_fuzzy_fallback_single_concession() {
        let annotator = annotator(
            vec![("Disease", vec!["mellitus"])],
            MatcherConfig::default(),
        );
        // misspelled twice; only the first eligible occurrence is claimed
        let spans = annotator.annotate("melitus recurred as melitus");
        assert_eq!(spans, vec![span(0, 7, "Disease")]);
    }

    #[test]
    fn test_fuzzy_skipped_for_short_terms_and_tokens() {
        let annotator = annotator(
            vec![("Gene", vec!["tp53"])],
            MatcherConfig::default(),
        );
        // term below min_fuzzy_len: typo stays unlabeled
        assert!(annotator.annotate("tp35 deletion observed").is_empty());
    }

    #[test]
    fn test_fuzzy_uses_first_eligible_occurrence() {
        let annotator = annotator(
            vec![
                ("Chronic", vec!["chronic melitus"]),
                ("Disease", vec!["mellitus"]),
            ],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("chronic melitus then melitus again");
        // the multi-word exact span claims the first "melitus"; the fuzzy
        // pass for "mellitus" lands on the second occurrence instead of
        // giving up on the token
        assert_eq!(
            spans,
            vec![span(0, 15, "Chronic"), span(21, 28, "Disease")]
        );
    }

    #[test]
    fn test_fuzzy_does_not_claim_own_inflection_family() {
        let annotator = annotator(
            vec![("Condition", vec!["failure"])],
            MatcherConfig::default(),
        );
        // "failures" is exact-family (suffix rule), claimed by exact pass
        let spans = annotator.annotate("repeated failures were logged");
        assert_eq!(spans, vec![span(9, 17, "Condition")]);
    }

    #[test]
    fn test_accented_text_uses_char_offsets() {
        let annotator = annotator(
            vec![("Condición", vec!["síndrome"])],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("El síndrome persiste.");
        assert_eq!(spans, vec![span(3, 11, "Condición")]);
    }

    #[test]
    fn test_spans_never_overlap() {
        let annotator = annotator(
            vec![
                ("A", vec!["heart failure", "failure", "heart"]),
                ("B", vec!["acute heart", "failure onset"]),
            ],
            MatcherConfig::default(),
        );
        let spans = annotator.annotate("acute heart failure onset, heart failure again");
        for (i, a) in spans.iter().enumerate() {
            for b in spans.iter().skip(i + 1) {
                assert!(
                    a.end <= b.start || b.end <= a.start,
                    "{a:?} overlaps {b:?}"
                );
            }
        }
        assert!(!spans.is_empty());
    }

    #[test]
    fn test_annotate_empty_and_unmatched_text() {
        let annotator = annotator(
            vec![("Disease", vec!["diabetes"])],
            MatcherConfig::default(),
        );
        assert!(annotator.annotate("").is_empty());
        assert!(annotator.annotate("no relevant words here").is_empty());
    }
}
