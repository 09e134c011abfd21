//! # Enrichment
//!
//! Downstream annotators that attach supplementary fields to ranked recipes.
//! An [`Enricher`] sees the ranked [`MatchResult`] read-only and may only
//! write into the recipe's `extras` map, so enrichment never changes which
//! recipes were returned or in what order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppResult;
use crate::nutrition;
use crate::ranker::MatchResult;

/// Indian regional cuisines, checked before international ones
const INDIAN_REGIONS: &[(&str, &str)] = &[
    ("north indian", "North India"),
    ("punjabi", "Punjab"),
    ("delhi", "Delhi"),
    ("rajasthani", "Rajasthan"),
    ("kashmiri", "Kashmir"),
    ("south indian", "South India"),
    ("tamil", "Tamil Nadu"),
    ("kerala", "Kerala"),
    ("andhra", "Andhra Pradesh"),
    ("karnataka", "Karnataka"),
    ("bengali", "West Bengal"),
    ("kolkata", "West Bengal"),
    ("maharashtrian", "Maharashtra"),
    ("mumbai", "Maharashtra"),
    ("gujarati", "Gujarat"),
    ("goan", "Goa"),
    ("hyderabadi", "Telangana"),
    ("bihari", "Bihar"),
    ("awadhi", "Uttar Pradesh"),
    ("lucknow", "Uttar Pradesh"),
];

const INTERNATIONAL_REGIONS: &[(&str, &str)] = &[
    ("italian", "Italy"),
    ("chinese", "China"),
    ("thai", "Thailand"),
    ("mexican", "Mexico"),
    ("japanese", "Japan"),
    ("french", "France"),
    ("greek", "Greece"),
    ("spanish", "Spain"),
    ("american", "USA"),
    ("korean", "South Korea"),
    ("vietnamese", "Vietnam"),
    ("lebanese", "Lebanon"),
    ("turkish", "Turkey"),
    ("moroccan", "Morocco"),
    ("brazilian", "Brazil"),
];

const DISH_REGIONS: &[(&str, &str)] = &[
    ("dosa", "South India"),
    ("idli", "South India"),
    ("uttapam", "South India"),
    ("sambar", "South India"),
    ("paneer", "North India"),
    ("chole", "Punjab"),
    ("bhature", "Punjab"),
    ("tikka", "Punjab"),
    ("tandoori", "Punjab"),
    ("rogan josh", "Kashmir"),
    ("dhokla", "Gujarat"),
    ("thepla", "Gujarat"),
    ("vada pav", "Maharashtra"),
    ("pav bhaji", "Maharashtra"),
    ("misal pav", "Maharashtra"),
    ("rasgulla", "West Bengal"),
    ("sandesh", "West Bengal"),
    ("litti chokha", "Bihar"),
];

/// A ranked recipe plus supplementary fields from enrichers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedRecipe {
    #[serde(flatten)]
    pub result: MatchResult,
    /// Public score, equal to the boosted score
    pub score: f32,
    pub match_percentage: u32,
    /// Fields added by enrichers, serialized next to the match fields
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl From<MatchResult> for RecommendedRecipe {
    fn from(result: MatchResult) -> Self {
        Self {
            score: result.boosted_score,
            match_percentage: result.match_percentage(),
            result,
            extras: Map::new(),
        }
    }
}

/// Attaches supplementary data to a ranked recipe
pub trait Enricher: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Write fields for `recipe` into `extras`
    fn enrich(&self, recipe: &MatchResult, extras: &mut Map<String, Value>) -> AppResult<()>;
}

/// Adds `nutrition` (summed calories) and `nutrition_profile` (macro heuristics)
#[derive(Debug, Default, Clone, Copy)]
pub struct NutritionEnricher;

impl Enricher for NutritionEnricher {
    fn name(&self) -> &str {
        "nutrition"
    }

    fn enrich(&self, recipe: &MatchResult, extras: &mut Map<String, Value>) -> AppResult<()> {
        let estimate = nutrition::estimate(&recipe.ingredients);
        extras.insert("nutrition".to_string(), serde_json::to_value(estimate)?);
        let profile = nutrition::nutrition_profile(&recipe.name);
        extras.insert("nutrition_profile".to_string(), serde_json::to_value(profile)?);
        Ok(())
    }
}

/// Adds `image_prompt` for an external image generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ImagePromptEnricher;

impl Enricher for ImagePromptEnricher {
    fn name(&self) -> &str {
        "image_prompt"
    }

    fn enrich(&self, recipe: &MatchResult, extras: &mut Map<String, Value>) -> AppResult<()> {
        let prompt = image_prompt(&recipe.name, &recipe.ingredients, recipe.cuisine.as_deref());
        extras.insert("image_prompt".to_string(), Value::String(prompt));
        Ok(())
    }
}

/// Adds `region` when one can be inferred
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionEnricher;

impl Enricher for RegionEnricher {
    fn name(&self) -> &str {
        "region"
    }

    fn enrich(&self, recipe: &MatchResult, extras: &mut Map<String, Value>) -> AppResult<()> {
        if let Some(region) = infer_region(recipe.cuisine.as_deref(), &recipe.name) {
            extras.insert("region".to_string(), Value::String(region));
        }
        Ok(())
    }
}

/// The enrichers attached to every recommendation by default
pub fn default_enrichers() -> Vec<Box<dyn Enricher>> {
    vec![
        Box::new(NutritionEnricher),
        Box::new(ImagePromptEnricher),
        Box::new(RegionEnricher),
    ]
}

/// Run every enricher over every result
///
/// A failing enricher is logged and skipped; the recipe is still returned.
pub fn enrich_all(results: Vec<MatchResult>, enrichers: &[Box<dyn Enricher>]) -> Vec<RecommendedRecipe> {
    results
        .into_iter()
        .map(|result| {
            let mut recipe = RecommendedRecipe::from(result);
            for enricher in enrichers {
                if let Err(e) = enricher.enrich(&recipe.result, &mut recipe.extras) {
                    tracing::warn!(
                        enricher = enricher.name(),
                        recipe = %recipe.result.name,
                        error = %e,
                        "Enricher failed, continuing without its fields"
                    );
                }
            }
            recipe
        })
        .collect()
}

/// Prompt describing the dish for an image generator
///
/// ```rust
/// use pantry_match::enrichment::image_prompt;
///
/// let ingredients = ["rice", "onion", "tomato", "salt", "oil"];
/// assert_eq!(
///     image_prompt("Tomato Rice", &ingredients, Some("Indian")),
///     "photorealistic image of Tomato Rice, made with rice, onion, tomato, salt, Indian cuisine, warm lighting, high detail"
/// );
/// ```
pub fn image_prompt<S: AsRef<str>>(name: &str, ingredients: &[S], cuisine: Option<&str>) -> String {
    let main = ingredients
        .iter()
        .take(4)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "photorealistic image of {}, made with {}, {} cuisine, warm lighting, high detail",
        name,
        main,
        cuisine.unwrap_or("unknown")
    )
}

/// Region implied by cuisine keywords, then dish-name keywords
///
/// Falls back to `India` when the cuisine mentions "indian" without a
/// more specific match.
pub fn infer_region(cuisine: Option<&str>, name: &str) -> Option<String> {
    let cuisine = cuisine.unwrap_or_default().to_lowercase();
    let title = name.to_lowercase();

    let by_cuisine = INDIAN_REGIONS
        .iter()
        .chain(INTERNATIONAL_REGIONS)
        .find(|(key, _)| cuisine.contains(key))
        .map(|(_, region)| region.to_string());
    if by_cuisine.is_some() {
        return by_cuisine;
    }

    if title.contains("biryani") {
        let region = if title.contains("hyderabadi") {
            "Hyderabad (Telangana)"
        } else {
            "India"
        };
        return Some(region.to_string());
    }

    if let Some((_, region)) = DISH_REGIONS.iter().find(|(dish, _)| title.contains(dish)) {
        return Some(region.to_string());
    }

    cuisine.contains("indian").then(|| "India".to_string())
}
