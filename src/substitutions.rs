//! # Substitution Index
//!
//! Static mapping from a canonical ingredient name to the names a cook may use
//! in its place. The table is hand-curated and deliberately not symmetric: an
//! entry `paneer -> cheese` does not imply `cheese -> paneer`. The matcher runs
//! its own reverse lookup instead of relying on symmetry, so entries are kept
//! exactly as declared.

use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;

use crate::normalizer::clean;

/// Declared substitutions, in authoring order
pub const SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("curd", &["yogurt", "dahi"]),
    ("capsicum", &["bell pepper"]),
    ("maida", &["all purpose flour", "flour"]),
    ("paneer", &["cottage cheese", "cheese"]),
    ("cottage cheese", &["paneer"]),
    ("coriander", &["cilantro"]),
    ("cream", &["milk", "malai"]),
    ("sugar", &["jaggery", "gur"]),
    ("yogurt", &["curd", "dahi"]),
    ("dahi", &["yogurt", "curd"]),
    ("ghee", &["clarified butter", "butter"]),
    ("clarified butter", &["ghee"]),
    ("atta", &["whole wheat flour", "wheat flour"]),
    ("besan", &["gram flour", "chickpea flour"]),
    ("gram flour", &["besan", "chickpea flour"]),
    ("jeera", &["cumin", "cumin seeds"]),
    ("cumin", &["jeera", "cumin seeds"]),
    ("haldi", &["turmeric", "turmeric powder"]),
    ("turmeric", &["haldi", "turmeric powder"]),
    ("dhaniya", &["coriander", "cilantro"]),
    ("methi", &["fenugreek"]),
    ("hing", &["asafoetida"]),
    ("ajwain", &["carom seeds"]),
];

lazy_static! {
    static ref DEFAULT_INDEX: SubstitutionIndex = SubstitutionIndex::from_entries(SUBSTITUTIONS);
}

/// Read-only lookup over a substitution table
#[derive(Debug, Clone, Default)]
pub struct SubstitutionIndex {
    entries: HashMap<String, Vec<String>>,
}

impl SubstitutionIndex {
    /// Build an index from literal entries; later duplicates of a key replace earlier ones
    pub fn from_entries(entries: &[(&str, &[&str])]) -> Self {
        let entries = entries
            .iter()
            .map(|(key, subs)| {
                (
                    key.to_string(),
                    subs.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// The process-wide table built from [`SUBSTITUTIONS`]
    pub fn builtin() -> &'static SubstitutionIndex {
        &DEFAULT_INDEX
    }

    /// Declared substitutes of `term`, looked up by its cleaned form
    pub fn substitutes_of(&self, term: &str) -> BTreeSet<String> {
        self.declared(&clean(term))
            .iter()
            .cloned()
            .collect()
    }

    /// Declared substitutes of an already-cleaned term, in authoring order
    pub fn declared(&self, clean_term: &str) -> &[String] {
        self.entries
            .get(clean_term)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `candidate` is declared as a substitute for the cleaned term
    pub fn is_substitute(&self, clean_term: &str, candidate: &str) -> bool {
        self.declared(clean_term).iter().any(|s| s == candidate)
    }

    /// Number of declared keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Declared substitutes of `term` in the built-in table
pub fn substitutes_of(term: &str) -> BTreeSet<String> {
    SubstitutionIndex::builtin().substitutes_of(term)
}
