//! # Ingredient Text Normalizer
//!
//! Deterministic cleaning of free-text ingredient phrases into the canonical
//! token strings used both as matching keys and as embedding input.
//!
//! ## Passes
//!
//! Each pass runs over the whole string and later passes assume the earlier
//! ones already ran:
//!
//! 1. Lowercase
//! 2. Drop parenthesized asides: `"(dried fenugreek leaves)"`
//! 3. Drop whole-word units: `g, kg, gram, grams, ml, l, cup, cups, tbsp, tsp, ounce, oz, clove, slice`
//! 4. Drop quantities: integers and simple fractions (`\d+(/\d+)?`)
//! 5. Drop remaining punctuation
//! 6. Collapse whitespace and trim
//!
//! ```rust
//! use pantry_match::normalizer::clean;
//!
//! assert_eq!(clean("2 cups Basmati Rice, washed"), "basmati rice washed");
//! assert_eq!(clean("1 tsp Kasuri methi (dried fenugreek leaves)"), "kasuri methi");
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

/// Unit vocabulary stripped as whole words
pub const UNIT_VOCABULARY: &[&str] = &[
    "g", "kg", "gram", "grams", "ml", "l", "cup", "cups", "tbsp", "tsp", "ounce", "oz", "clove",
    "slice",
];

lazy_static! {
    static ref PARENTHESIZED: Regex =
        Regex::new(r"\([^)]*\)").expect("Parenthesized aside pattern should be valid");
    static ref UNITS: Regex = Regex::new(&format!(r"\b(?:{})\b", UNIT_VOCABULARY.join("|")))
        .expect("Unit vocabulary pattern should be valid");
    static ref QUANTITY: Regex =
        Regex::new(r"\d+(?:/\d+)?").expect("Quantity pattern should be valid");
    static ref PUNCTUATION: Regex =
        Regex::new(r"[^\w\s]").expect("Punctuation pattern should be valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Whitespace pattern should be valid");
}

/// Upper bound on pass-sequence repetitions; real input settles in two
const MAX_PASSES: usize = 4;

/// Clean a single ingredient phrase into its canonical token string
///
/// The pass sequence is repeated until the output stops changing, so a unit
/// glued to a quantity (`"500g"`) that only becomes a whole word once the
/// quantity is gone is stripped as well. This keeps `clean` idempotent.
pub fn clean(phrase: &str) -> String {
    let mut current = run_passes(phrase);
    for _ in 1..MAX_PASSES {
        let next = run_passes(&current);
        if next == current {
            break;
        }
        current = next;
    }

    trace!(input = %phrase, output = %current, "Normalized ingredient phrase");
    current
}

fn run_passes(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let without_asides = PARENTHESIZED.replace_all(&lowered, " ");
    let without_units = UNITS.replace_all(&without_asides, " ");
    let without_quantities = QUANTITY.replace_all(&without_units, " ");
    let without_punctuation = PUNCTUATION.replace_all(&without_quantities, " ");
    WHITESPACE
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string()
}

/// Clean every phrase, preserving order and length
pub fn clean_list<S: AsRef<str>>(phrases: &[S]) -> Vec<String> {
    phrases.iter().map(|p| clean(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_and_quantities_removed() {
        assert_eq!(clean("500g Boneless chicken"), "boneless chicken");
        assert_eq!(clean("1/2 cup Heavy cream"), "heavy cream");
        assert_eq!(clean("3 tbsp Butter"), "butter");
    }

    #[test]
    fn test_units_only_removed_as_whole_words() {
        // "l" and "g" inside words must survive
        assert_eq!(clean("garlic"), "garlic");
        assert_eq!(clean("lentils"), "lentils");
        assert_eq!(clean("2 l milk"), "milk");
    }

    #[test]
    fn test_parenthesized_aside_removed() {
        assert_eq!(
            clean("1 tsp Kasuri methi (dried fenugreek leaves)"),
            "kasuri methi"
        );
    }

    #[test]
    fn test_punctuation_and_whitespace() {
        assert_eq!(clean("  Ginger-garlic   paste!! "), "ginger garlic paste");
        assert_eq!(clean(""), "");
        assert_eq!(clean("2 cups"), "");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for phrase in [
            "500g Boneless chicken, cut into pieces",
            "2cups flour",
            "1 tsp Kasuri methi (dried fenugreek leaves)",
            "Salt to taste",
            "((nested) aside) oil",
        ] {
            let once = clean(phrase);
            assert_eq!(clean(&once), once, "not idempotent for '{}'", phrase);
        }
    }

    #[test]
    fn test_clean_list_preserves_order_and_length() {
        let cleaned = clean_list(&["2 cups rice", "", "1 Onion"]);
        assert_eq!(cleaned, vec!["rice".to_string(), String::new(), "onion".to_string()]);
    }
}
