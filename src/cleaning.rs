// WHY: standalone text cleaning kept separate from matching so chunk text can be
// canonicalized once and reused for both annotation and JSONL output

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize raw chunk text for annotation and output.
///
/// Removes byte-order marks and zero-width characters, maps non-breaking
/// spaces to plain spaces, applies NFKC, unifies curly quotes and em/en
/// dashes, strips whitespace adjacent to hyphens (`"word - word"` →
/// `"word-word"`), collapses whitespace runs to single spaces and trims.
///
/// Pure and idempotent: `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    // First pass: drop invisibles and unify typographic variants.
    let unified: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{feff}' | '\u{200b}'))
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect::<String>()
        .nfkc()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2014}' | '\u{2013}' => '-',
            other => other,
        })
        .collect();

    // Second pass: collapse whitespace, keeping none next to hyphens.
    let mut cleaned = String::with_capacity(unified.len());
    let mut pending_space = false;
    for ch in unified.chars() {
        if ch.is_whitespace() {
            // WHY: deferring the space until the next non-space char both
            // collapses runs and trims leading/trailing whitespace for free
            pending_space = !cleaned.is_empty();
            continue;
        }
        if ch == '-' {
            pending_space = false;
            cleaned.push('-');
            continue;
        }
        if pending_space {
            if !cleaned.ends_with('-') {
                cleaned.push(' ');
            }
            pending_space = false;
        }
        cleaned.push(ch);
    }
    cleaned
}

/// Reduce text to a diacritic-free lowercase form for similarity scoring.
///
/// Decomposes accented characters (NFKD), drops combining marks and
/// lowercases. Used only for comparisons, never for stored output text.
pub fn normalize_for_matching(text: &str) -> String {
    text.nfkd()
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .filter(|&c| canonical_combining_class(c) == 0)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_invisibles_removed() {
        let input = "\u{feff}Patients\u{200b} were\u{a0}enrolled";
        assert_eq!(clean_text(input), "Patients were enrolled");
    }

    #[test]
    fn test_clean_text_quotes_and_dashes() {
        let input = "\u{201c}insulin\u{201d} \u{2014} a peptide \u{2013} hormone";
        assert_eq!(clean_text(input), "\"insulin\"-a peptide-hormone");
    }

    #[test]
    fn test_clean_text_hyphen_adjacent_whitespace() {
        assert_eq!(clean_text("type - 2 diabetes"), "type-2 diabetes");
        assert_eq!(clean_text("pre- treatment"), "pre-treatment");
        assert_eq!(clean_text("post -operative"), "post-operative");
    }

    #[test]
    fn test_clean_text_whitespace_collapse_and_trim() {
        let input = "  multiple\t\nspaces \r\n here  ";
        assert_eq!(clean_text(input), "multiple spaces here");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let samples = [
            "  BRCA1 \u{2014} expression\u{a0}levels ",
            "type - 2 diabetes\n mellitus",
            "already clean text",
            "",
        ];
        for raw in samples {
            let once = clean_text(raw);
            assert_eq!(clean_text(&once), once, "re-cleaning changed {raw:?}");
        }
    }

    #[test]
    fn test_clean_text_preserves_unicode_content() {
        assert_eq!(clean_text("síndrome   metabólico"), "síndrome metabólico");
    }

    #[test]
    fn test_normalize_for_matching_strips_accents() {
        assert_eq!(normalize_for_matching("Síndrome"), "sindrome");
        assert_eq!(normalize_for_matching("Glucósido"), "glucosido");
    }

    #[test]
    fn test_normalize_for_matching_apostrophe() {
        assert_eq!(normalize_for_matching("Crohn\u{2019}s"), "crohn's");
    }
}
