//! # Corpus Store
//!
//! Loads recipe records once at startup and keeps them immutable afterwards.
//!
//! The source file is either a JSON array of objects or JSON Lines (one object
//! per line). Every document must be an object; everything else degrades
//! gracefully and the record is kept:
//!
//! - A missing or non-scalar `name` becomes an empty name.
//! - `ingredients` may be a JSON list, a string holding a list literal
//!   (`"['2 cups rice', 'salt']"` or JSON), or a comma-separated string.
//!   Anything else yields an empty list and the record is kept.
//! - Rows carrying `course` and `flavor_profile` get the tag string
//!   `"course, flavor_profile, diet"` and cuisine `Indian`.
//! - Otherwise `tags` may be a list (joined with `", "`) or a string, and a
//!   missing `cuisine` is inferred from tag keywords.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{error_logging, AppError, AppResult};
use crate::normalizer::clean_list;

/// Tag keywords checked in order when a record has no cuisine
const CUISINE_KEYWORDS: &[(&[&str], &str)] = &[
    (&["italian"], "Italian"),
    (&["mexican"], "Mexican"),
    (&["asian", "chinese", "japanese"], "Asian"),
    (&["indian"], "Indian"),
    (&["french"], "French"),
    (&["american"], "American"),
];

/// One recipe, immutable after load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Display name
    pub name: String,
    /// Ingredient phrases as written in the source
    pub raw_ingredients: Vec<String>,
    /// Cleaned ingredient terms, index-aligned with `raw_ingredients`
    pub clean_ingredients: Vec<String>,
    /// Cuisine label, given or inferred
    pub cuisine: Option<String>,
    /// Free-form tag string
    pub tags: Option<String>,
}

impl RecipeRecord {
    /// Build a record, cleaning every raw ingredient
    pub fn new(
        name: impl Into<String>,
        raw_ingredients: Vec<String>,
        cuisine: Option<String>,
        tags: Option<String>,
    ) -> Self {
        let clean_ingredients = clean_list(&raw_ingredients);
        Self {
            name: name.into(),
            raw_ingredients,
            clean_ingredients,
            cuisine,
            tags,
        }
    }

    /// Text embedded for this recipe: cleaned terms joined with `", "`
    pub fn embedding_text(&self) -> String {
        self.clean_ingredients.join(", ")
    }
}

/// Ordered, read-only collection of recipe records
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<RecipeRecord>,
    source: Option<PathBuf>,
}

impl Corpus {
    /// Wrap already-built records
    pub fn from_records(records: Vec<RecipeRecord>) -> Self {
        Self {
            records,
            source: None,
        }
    }

    /// Load a corpus file, keeping only the first `limit` records when `limit > 0`
    pub fn load(path: impl AsRef<Path>, limit: usize) -> AppResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let _span = crate::observability::corpus_span("load", &path_str).entered();
        let start = Instant::now();

        let content = std::fs::read_to_string(path).map_err(|e| {
            error_logging::log_corpus_error(&e, "read_corpus_file", Some(&path_str), None);
            AppError::FileSystem(format!("cannot read corpus file {}: {}", path_str, e))
        })?;

        let values = parse_documents(&content).map_err(|e| {
            error_logging::log_corpus_error(&e, "parse_corpus_file", Some(&path_str), None);
            e
        })?;
        let records_read = values.len();

        let mut corpus = Self::from_values(values, limit)?;
        corpus.source = Some(path.to_path_buf());

        let without_ingredients = corpus
            .records
            .iter()
            .filter(|r| r.raw_ingredients.is_empty())
            .count();
        crate::observability::record_corpus_load_metrics(
            start.elapsed(),
            records_read,
            corpus.len(),
            without_ingredients,
        );
        tracing::info!(
            path = %path_str,
            records_read,
            records_kept = corpus.len(),
            without_ingredients,
            duration_ms = start.elapsed().as_millis(),
            "Corpus loaded"
        );
        Ok(corpus)
    }

    /// Parse corpus content held in memory
    pub fn parse_str(content: &str, limit: usize) -> AppResult<Self> {
        Self::from_values(parse_documents(content)?, limit)
    }

    fn from_values(values: Vec<Value>, limit: usize) -> AppResult<Self> {
        let take = if limit > 0 { limit } else { values.len() };
        let records = values
            .iter()
            .take(take)
            .enumerate()
            .map(|(index, value)| record_from_value(index, value))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self::from_records(records))
    }

    /// All records in load order
    pub fn records(&self) -> &[RecipeRecord] {
        &self.records
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&RecipeRecord> {
        self.records.get(index)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// File the corpus was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Embedding text of every record, in corpus order
    pub fn embedding_texts(&self) -> Vec<String> {
        self.records.iter().map(RecipeRecord::embedding_text).collect()
    }

    /// Case-insensitive substring search over names, in corpus order
    ///
    /// An empty query matches nothing.
    pub fn search_by_name(&self, query: &str, limit: usize) -> Vec<&RecipeRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

/// Split file content into JSON documents: one array, or one object per line
fn parse_documents(content: &str) -> AppResult<Vec<Value>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(trimmed)? {
            Value::Array(items) => Ok(items),
            _ => Err(AppError::Corpus("expected a JSON array of recipes".to_string())),
        };
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|e| {
                AppError::Corpus(format!("invalid JSON on line {}: {}", line_no + 1, e))
            })
        })
        .collect()
}

fn record_from_value(index: usize, value: &Value) -> AppResult<RecipeRecord> {
    let object = value.as_object().ok_or_else(|| {
        AppError::Corpus(format!("record {} is not a JSON object", index))
    })?;

    let name = match object.get("name").and_then(value_to_text) {
        Some(name) => name,
        None => {
            tracing::warn!(record_index = index, "Record has no usable name, keeping it unnamed");
            String::new()
        }
    };

    let raw_ingredients = match object.get("ingredients") {
        Some(value) => parse_ingredients(value),
        None => Vec::new(),
    };
    if raw_ingredients.is_empty() {
        tracing::debug!(record_index = index, name = %name, "Record has no usable ingredients");
    }

    let (tags, cuisine) = if object.contains_key("course") && object.contains_key("flavor_profile")
    {
        (Some(dataset_tags(object)), Some("Indian".to_string()))
    } else {
        let tags = object.get("tags").and_then(parse_tags);
        let cuisine = object
            .get("cuisine")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .or_else(|| tags.as_deref().and_then(infer_cuisine));
        (tags, cuisine)
    };

    Ok(RecipeRecord::new(name, raw_ingredients, cuisine, tags))
}

/// Interpret an ingredient field; malformed input yields an empty list
pub fn parse_ingredients(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(text) => parse_ingredient_text(text),
        _ => Vec::new(),
    }
}

fn parse_ingredient_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with('[') {
        if let Some(items) = parse_list_literal(trimmed) {
            return items;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a list literal of quoted strings, accepting JSON or single-quoted items
fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return Some(items.iter().filter_map(value_to_text).collect());
    }

    let mut chars = text.chars().peekable();
    if chars.next()? != '[' {
        return None;
    }

    let mut items = Vec::new();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next()? {
            ']' => break,
            quote @ ('\'' | '"') => {
                let mut item = String::new();
                loop {
                    match chars.next()? {
                        '\\' => item.push(chars.next()?),
                        c if c == quote => break,
                        c => item.push(c),
                    }
                }
                items.push(item);
            }
            _ => return None,
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next()? {
            ',' => continue,
            ']' => break,
            _ => return None,
        }
    }

    if chars.any(|c| !c.is_whitespace()) {
        return None;
    }
    Some(items)
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_tags(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::String(text) => Some(
            parse_list_literal(text.trim())
                .map(|items| items.join(", "))
                .unwrap_or_else(|| text.clone()),
        ),
        Value::Null => None,
        other => value_to_text(other),
    }
}

fn dataset_tags(object: &Map<String, Value>) -> String {
    let field = |key: &str| {
        object
            .get(key)
            .and_then(value_to_text)
            .unwrap_or_default()
    };
    format!(
        "{}, {}, {}",
        field("course"),
        field("flavor_profile"),
        field("diet")
    )
}

/// Cuisine label implied by tag keywords, first match wins
pub fn infer_cuisine(tags: &str) -> Option<String> {
    let lower = tags.to_lowercase();
    CUISINE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, cuisine)| cuisine.to_string())
}
