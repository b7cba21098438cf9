use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::lemma::{lemma, term_signature, SUFFIXES};

/// Single strictness surface for the matching engine.
///
/// The two historical annotator variants (relaxed vs strict) differ only in
/// these values, so one engine serves both via [`MatcherConfig::default`]
/// and [`MatcherConfig::strict`].
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Generic terms that never receive suffix tolerance (e.g. "note").
    pub generic_exclusions: HashSet<String>,
    /// Terms shorter than this (in chars) compile to no pattern at all.
    pub min_term_len: usize,
    /// Minimum term/token length (in chars) for suffix tolerance and for
    /// participation in the fuzzy pass.
    pub min_fuzzy_len: usize,
    /// Similarity score (0–100) a token must reach in the fuzzy pass.
    pub fuzzy_threshold: f64,
    /// Inflectional suffixes accepted by suffix-tolerant patterns.
    pub suffixes: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            generic_exclusions: HashSet::new(),
            min_term_len: 2,
            min_fuzzy_len: 6,
            fuzzy_threshold: 88.0,
            suffixes: SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MatcherConfig {
    /// Stricter profile: longer minimum terms and a generic-word exclusion
    /// list that keeps short everyday words from over-matching via suffixes.
    pub fn strict() -> Self {
        Self {
            generic_exclusions: ["note", "text", "data", "info", "section"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_term_len: 3,
            ..Self::default()
        }
    }
}

/// A dictionary term with its compiled matcher and inflection signature.
#[derive(Debug, Clone)]
pub struct CompiledTerm {
    pub term: String,
    /// Per-word stems; an exact match is accepted only if the matched
    /// surface carries the same signature.
    pub signature: Vec<String>,
    pub pattern: Regex,
}

/// One named category and its terms, longest term first.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub terms: Vec<CompiledTerm>,
}

/// Precompiled read-only dictionary state, built once at startup and safe to
/// share across threads.
#[derive(Debug, Clone)]
pub struct DictionaryIndex {
    pub categories: Vec<Category>,
    pub config: MatcherConfig,
}

impl DictionaryIndex {
    /// Compile category term lists into matchers.
    ///
    /// Categories keep their load order; within a category terms are sorted
    /// longest first so more specific terms claim their region before
    /// shorter substrings can. Terms too short to pattern are skipped,
    /// never an error.
    pub fn compile(categories: Vec<(String, Vec<String>)>, config: MatcherConfig) -> Self {
        let compiled = categories
            .into_iter()
            .map(|(name, mut terms)| {
                terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
                let terms: Vec<CompiledTerm> = terms
                    .into_iter()
                    .filter_map(|term| match build_pattern(&term, &config) {
                        Some(pattern) => Some(CompiledTerm {
                            signature: term_signature(&term),
                            term,
                            pattern,
                        }),
                        None => {
                            debug!("Skipping unpatternable term: {term:?}");
                            None
                        }
                    })
                    .collect();
                debug!("Compiled category {name:?}: {} terms", terms.len());
                Category { name, terms }
            })
            .collect();
        Self {
            categories: compiled,
            config,
        }
    }

    /// Total number of compiled terms across all categories.
    pub fn term_count(&self) -> usize {
        self.categories.iter().map(|c| c.terms.len()).sum()
    }
}

/// Build the whole-word matcher for one term, or `None` when the term is too
/// short to match safely.
///
/// The matcher accepts the literal term and its lemmatized form (flexible
/// whitespace between words, case-insensitive). Terms of at least
/// `min_fuzzy_len` chars that are not on the generic exclusion list also
/// accept one inflectional suffix on the final word, with a stem-final
/// silent `e` made optional so forms like `fatigued` fall under the `-ed`
/// rule.
pub fn build_pattern(term: &str, config: &MatcherConfig) -> Option<Regex> {
    if term.chars().count() < config.min_term_len {
        return None;
    }
    let words: Vec<&str> = term.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let literal = words
        .iter()
        .map(|w| regex::escape(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(r"\s+");
    let lemmatized = words
        .iter()
        .map(|w| regex::escape(&lemma(w)))
        .collect::<Vec<_>>()
        .join(r"\s+");

    let suffix_tolerant = term.chars().count() >= config.min_fuzzy_len
        && !config.generic_exclusions.contains(&term.to_lowercase());

    let mut stems: Vec<String> = Vec::with_capacity(4);
    stems.push(literal.clone());
    stems.push(lemmatized.clone());
    if suffix_tolerant {
        // silent-e elision: "fatigue" also matches as "fatigu" + suffix
        for form in [&literal, &lemmatized] {
            if form.ends_with('e') && !form.ends_with(r"\s+e") {
                stems.push(form[..form.len() - 1].to_string());
            }
        }
    }
    let mut seen = HashSet::new();
    stems.retain(|s| seen.insert(s.clone()));

    let body = stems.join("|");
    let pattern = if suffix_tolerant {
        format!(r"\b(?:{body})(?:{})?\b", config.suffixes.join("|"))
    } else {
        format!(r"\b(?:{body})\b")
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Load the category → terms mapping from a `dictionary.json` resource.
///
/// Category order follows the JSON object order, which in turn drives the
/// matcher's category visit order. Absence or malformation is fatal.
pub fn load_dictionary(path: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dictionary: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Dictionary is not valid JSON: {}", path.display()))?;
    let object = value
        .as_object()
        .context("Dictionary root must be a JSON object of category → term list")?;

    let mut categories = Vec::with_capacity(object.len());
    for (name, terms) in object {
        let list = terms
            .as_array()
            .with_context(|| format!("Category {name:?} must map to an array of terms"))?;
        let mut parsed = Vec::with_capacity(list.len());
        for term in list {
            let term = term
                .as_str()
                .with_context(|| format!("Category {name:?} contains a non-string term"))?;
            parsed.push(term.to_string());
        }
        categories.push((name.clone(), parsed));
    }

    info!(
        "Dictionary loaded: {} categories, {} terms",
        categories.len(),
        categories.iter().map(|(_, t)| t.len()).sum::<usize>()
    );
    Ok(categories)
}
