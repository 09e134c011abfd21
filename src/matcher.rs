//! # Ingredient Matcher
//!
//! Decides, for one recipe and one set of user ingredients, which recipe
//! ingredients are covered and how.
//!
//! Each recipe term `r` is checked in the recipe's declared order with this
//! precedence, stopping at the first hit:
//!
//! 1. **Direct overlap**: `r` and some user term `u` contain one another
//! 2. **Forward substitution**: `u` is a declared substitute of `r`
//!    (reported as `"r(sub->u)"` and recorded in `substitutions_used`)
//! 3. **Reverse substitution**: `r` is a declared substitute of `u`
//!
//! Steps 2 and 3 are tried together for each user term, in user order. The
//! first user term that satisfies a recipe term wins; there is no search for a
//! best candidate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::substitutions::SubstitutionIndex;

/// Prefix of the annotation appended to a term satisfied by forward substitution
const SUB_MARKER: &str = "(sub->";

/// Lexical part of a match: which recipe terms are present, which are missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientMatch {
    /// Recipe terms covered by the user, possibly annotated `"r(sub->u)"`
    pub present: Vec<String>,
    /// Recipe terms the user does not have
    pub missing: Vec<String>,
    /// Recipe term -> user term for forward substitutions
    pub substitutions_used: BTreeMap<String, String>,
}

impl IngredientMatch {
    /// Number of covered recipe terms
    pub fn match_count(&self) -> usize {
        self.present.len()
    }

    /// Present terms with substitution annotations removed
    pub fn present_terms(&self) -> Vec<&str> {
        self.present.iter().map(|p| strip_annotation(p)).collect()
    }
}

/// Remove a trailing `"(sub->u)"` annotation from a present term
pub fn strip_annotation(term: &str) -> &str {
    match term.rfind(SUB_MARKER) {
        Some(idx) if term.ends_with(')') => &term[..idx],
        _ => term,
    }
}

fn annotate(recipe_term: &str, user_term: &str) -> String {
    format!("{}{}{})", recipe_term, SUB_MARKER, user_term)
}

fn overlaps(recipe_term: &str, user_term: &str) -> bool {
    recipe_term == user_term || user_term.contains(recipe_term) || recipe_term.contains(user_term)
}

/// Matches recipe ingredients against user ingredients through a substitution table
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    substitutions: &'a SubstitutionIndex,
}

impl Default for Matcher<'static> {
    fn default() -> Self {
        Self::new(SubstitutionIndex::builtin())
    }
}

impl<'a> Matcher<'a> {
    /// Create a matcher over the given substitution table
    pub fn new(substitutions: &'a SubstitutionIndex) -> Self {
        Self { substitutions }
    }

    /// Match cleaned user terms against cleaned recipe terms
    ///
    /// Every recipe term lands in exactly one of `present` or `missing`, in the
    /// recipe's order, so `present.len() + missing.len() == recipe_terms.len()`.
    ///
    /// ```rust
    /// use pantry_match::matcher::Matcher;
    ///
    /// let user = vec!["rice".to_string(), "yogurt".to_string()];
    /// let recipe = vec!["rice".to_string(), "curd".to_string(), "tomato".to_string()];
    /// let result = Matcher::default().match_ingredients(&user, &recipe);
    ///
    /// assert_eq!(result.present, vec!["rice", "curd(sub->yogurt)"]);
    /// assert_eq!(result.missing, vec!["tomato"]);
    /// assert_eq!(result.substitutions_used["curd"], "yogurt");
    /// ```
    pub fn match_ingredients<U, R>(&self, user_terms: &[U], recipe_terms: &[R]) -> IngredientMatch
    where
        U: AsRef<str>,
        R: AsRef<str>,
    {
        let mut result = IngredientMatch::default();

        'recipe: for recipe_term in recipe_terms.iter().map(AsRef::as_ref) {
            if user_terms
                .iter()
                .any(|u| overlaps(recipe_term, u.as_ref()))
            {
                result.present.push(recipe_term.to_string());
                continue;
            }

            for user_term in user_terms.iter().map(AsRef::as_ref) {
                if self.substitutions.is_substitute(recipe_term, user_term) {
                    result.present.push(annotate(recipe_term, user_term));
                    result
                        .substitutions_used
                        .insert(recipe_term.to_string(), user_term.to_string());
                    continue 'recipe;
                }
                if self.substitutions.is_substitute(user_term, recipe_term) {
                    result.present.push(recipe_term.to_string());
                    continue 'recipe;
                }
            }

            result.missing.push(recipe_term.to_string());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_overlap_both_directions() {
        let matcher = Matcher::default();
        let result = matcher.match_ingredients(
            &terms(&["red onion", "salt"]),
            &terms(&["onion", "sea salt", "tomato"]),
        );
        assert_eq!(result.present, terms(&["onion", "sea salt"]));
        assert_eq!(result.missing, terms(&["tomato"]));
        assert!(result.substitutions_used.is_empty());
    }

    #[test]
    fn test_forward_substitution_is_annotated() {
        let matcher = Matcher::default();
        let result = matcher.match_ingredients(&terms(&["yogurt"]), &terms(&["curd"]));
        assert_eq!(result.present, terms(&["curd(sub->yogurt)"]));
        assert_eq!(result.substitutions_used.get("curd"), Some(&"yogurt".to_string()));
    }

    #[test]
    fn test_reverse_substitution_is_not_annotated() {
        // "cheese" has no declared substitutes, but paneer -> cheese exists,
        // so a recipe asking for cheese is covered by a user holding paneer.
        let matcher = Matcher::default();
        let result = matcher.match_ingredients(&terms(&["paneer"]), &terms(&["cheese"]));
        assert_eq!(result.present, terms(&["cheese"]));
        assert!(result.substitutions_used.is_empty());
    }

    #[test]
    fn test_direct_overlap_takes_precedence() {
        let matcher = Matcher::default();
        let result = matcher.match_ingredients(&terms(&["yogurt", "curd"]), &terms(&["curd"]));
        assert_eq!(result.present, terms(&["curd"]));
        assert!(result.substitutions_used.is_empty());
    }

    #[test]
    fn test_first_user_term_wins() {
        let matcher = Matcher::default();
        let result = matcher.match_ingredients(&terms(&["dahi", "yogurt"]), &terms(&["curd"]));
        assert_eq!(result.substitutions_used.get("curd"), Some(&"dahi".to_string()));
    }

    #[test]
    fn test_custom_table() {
        let entries: &[(&str, &[&str])] = &[("butter", &["margarine"])];
        let index = SubstitutionIndex::from_entries(entries);
        let matcher = Matcher::new(&index);
        let result = matcher.match_ingredients(&terms(&["margarine"]), &terms(&["butter", "curd"]));
        assert_eq!(result.present, terms(&["butter(sub->margarine)"]));
        assert_eq!(result.missing, terms(&["curd"]));
    }

    #[test]
    fn test_strip_annotation() {
        assert_eq!(strip_annotation("curd(sub->yogurt)"), "curd");
        assert_eq!(strip_annotation("curd"), "curd");
    }

    #[test]
    fn test_empty_inputs() {
        let matcher = Matcher::default();
        let none: Vec<String> = Vec::new();
        let result = matcher.match_ingredients(&none, &terms(&["rice"]));
        assert!(result.present.is_empty());
        assert_eq!(result.missing, terms(&["rice"]));

        let result = matcher.match_ingredients(&terms(&["rice"]), &none);
        assert_eq!(result, IngredientMatch::default());
    }
}
