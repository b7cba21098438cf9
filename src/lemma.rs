// WHY: an ultra-light suffix stripper is enough to bridge common inflections
// between dictionary terms and chunk text; no linguistic analysis intended

/// Inflectional suffixes recognized by [`lemma`] and by suffix-tolerant
/// patterns, tried in this order with first match winning.
pub const SUFFIXES: [&str; 9] = [
    "ing", "ed", "es", "s", "ion", "ation", "ment", "ability", "ization",
];

/// Collapse a word to a crude comparable root.
///
/// Lowercases, then repeatedly strips the first matching suffix from
/// [`SUFFIXES`], each time only if the remaining root stays more than 2
/// chars longer than the suffix (guards against over-stripping short
/// words). Stripping runs to a fixpoint so stacked inflections collapse
/// too (`mutations` → `mutation` → `mutat`), which keeps the result
/// stable: `lemma(lemma(w)) == lemma(w)`.
pub fn lemma(word: &str) -> String {
    let mut root = word.to_lowercase();
    'strip: loop {
        for suffix in SUFFIXES {
            if root.ends_with(suffix) && root.chars().count() > suffix.len() + 2 {
                root.truncate(root.len() - suffix.len());
                continue 'strip;
            }
        }
        return root;
    }
}

/// Lemma with one trailing `e` trimmed when the lemma is long enough.
///
/// `lemma` alone leaves `fatigue`/`fatigued` incomparable (`fatigue` vs
/// `fatigu`); trimming the silent `e` puts a term and its inflections on the
/// same footing for match verification.
pub fn stem(word: &str) -> String {
    let mut root = lemma(word);
    if root.chars().count() > 3 && root.ends_with('e') {
        root.pop();
    }
    root
}

/// Per-word stems of a (possibly multi-word) term, used to decide whether a
/// matched surface belongs to the same inflectional family as the term.
pub fn term_signature(term: &str) -> Vec<String> {
    term.split_whitespace().map(stem).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lemma_strips_suffixes() {
        assert_eq!(lemma("affects"), "affect");
        assert_eq!(lemma("reported"), "report");
        assert_eq!(lemma("diabetes"), "diabet");
        assert_eq!(lemma("signaling"), "signal");
    }

    #[test]
    fn test_lemma_guard_against_short_roots() {
        // remaining root must be more than 2 chars longer than the suffix
        assert_eq!(lemma("sing"), "sing");
        assert_eq!(lemma("bed"), "bed");
        assert_eq!(lemma("notes"), "not");
    }

    #[test]
    fn test_lemma_collapses_stacked_inflections() {
        // plural of an -ion word reaches the same root as the singular
        assert_eq!(lemma("mutations"), lemma("mutation"));
        assert_eq!(lemma("mutation"), "mutat");
    }

    #[test]
    fn test_lemma_lowercases() {
        assert_eq!(lemma("BRCA1"), "brca1");
        assert_eq!(lemma("Diabetes"), "diabet");
    }

    #[test]
    fn test_lemma_stability() {
        for word in ["mutations", "reported", "fatigued", "diabetes", "cell", "sections"] {
            let once = lemma(word);
            assert_eq!(lemma(&once), once, "lemma not stable for {word}");
        }
    }

    #[test]
    fn test_stem_trims_silent_e() {
        assert_eq!(stem("fatigue"), "fatigu");
        assert_eq!(stem("fatigued"), "fatigu");
        assert_eq!(stem("note"), "not");
        // short lemmas keep their final e
        assert_eq!(stem("see"), "see");
    }

    #[test]
    fn test_stem_unifies_ion_plurals() {
        assert_eq!(stem("sections"), stem("section"));
    }

    #[test]
    fn test_term_signature_multiword() {
        assert_eq!(term_signature("heart failure"), vec!["heart", "failur"]);
        assert_eq!(
            term_signature("heart  failures"),
            term_signature("heart failure")
        );
    }
}
