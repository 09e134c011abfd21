//! # Nutrition Estimator
//!
//! Two rough estimates, neither of which touches ranking:
//!
//! - [`estimate`] sums per-keyword calorie values over cleaned ingredients
//! - [`nutrition_profile`] picks a macro profile from dish-name keywords

use serde::{Deserialize, Serialize};

use crate::normalizer::clean;

/// Calories contributed by an ingredient containing the keyword
pub const CALORIE_TABLE: &[(&str, u32)] = &[
    ("rice", 130),
    ("onion", 40),
    ("tomato", 18),
    ("paneer", 265),
    ("ghee", 112),
    ("milk", 42),
    ("yogurt", 59),
    ("curd", 59),
    ("flour", 364),
    ("wheat", 340),
    ("potato", 77),
    ("carrot", 41),
    ("chicken", 165),
    ("mutton", 294),
    ("fish", 206),
    ("egg", 155),
    ("lentil", 116),
    ("dal", 116),
    ("chickpea", 164),
    ("gram", 164),
];

/// Calorie estimate for an ingredient list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    /// Summed calories
    pub calories: u32,
}

/// Sum the calories of every table keyword found in each cleaned ingredient
///
/// Matches are additive: an ingredient containing two keywords counts both.
///
/// ```rust
/// use pantry_match::nutrition::estimate;
///
/// assert_eq!(estimate(&["2 cups rice", "1 onion"]).calories, 170);
/// ```
pub fn estimate<S: AsRef<str>>(ingredients: &[S]) -> NutritionEstimate {
    let calories = ingredients
        .iter()
        .map(|ingredient| {
            let cleaned = clean(ingredient.as_ref());
            CALORIE_TABLE
                .iter()
                .filter(|(keyword, _)| cleaned.contains(keyword))
                .map(|(_, calories)| calories)
                .sum::<u32>()
        })
        .sum();
    NutritionEstimate { calories }
}

/// Heuristic per-serving macro profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionProfile {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
    pub fiber: u32,
    pub sodium: u32,
}

impl Default for NutritionProfile {
    fn default() -> Self {
        Self {
            calories: 350,
            protein: 12,
            carbs: 45,
            fat: 15,
            fiber: 6,
            sodium: 800,
        }
    }
}

const HIGH_PROTEIN: &[&str] = &["paneer", "chicken", "mutton", "fish", "egg", "dal", "rajma"];
const STARCHY: &[&str] = &["biryani", "pulao", "rice", "naan", "roti", "paratha"];
const FRIED: &[&str] = &["pakora", "samosa", "bhature", "puri", "tikki"];
const SWEET: &[&str] = &["gulab", "jamun", "kheer", "halwa", "ladoo", "barfi"];
const LIGHT: &[&str] = &["salad", "raita", "chutney"];

/// Macro profile for a dish, adjusted by keywords in its name
///
/// Adjustments apply in a fixed order (protein, starch, fried, sweet, light)
/// and later ones overwrite fields set by earlier ones.
pub fn nutrition_profile(recipe_name: &str) -> NutritionProfile {
    let name = recipe_name.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| name.contains(w));
    let mut profile = NutritionProfile::default();

    if has_any(HIGH_PROTEIN) {
        profile.protein = 20;
        profile.calories = 400;
    }
    if has_any(STARCHY) {
        profile.carbs = 60;
        profile.calories = 450;
    }
    if has_any(FRIED) {
        profile.fat = 25;
        profile.calories = 500;
    }
    if has_any(SWEET) {
        profile.carbs = 70;
        profile.fat = 18;
        profile.calories = 450;
        profile.protein = 5;
    }
    if has_any(LIGHT) {
        profile.calories = 150;
        profile.fat = 8;
        profile.carbs = 20;
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_is_additive() {
        // "chicken egg curry" hits both chicken and egg
        assert_eq!(estimate(&["chicken egg curry"]).calories, 165 + 155);
        assert_eq!(estimate(&["paneer", "ghee"]).calories, 265 + 112);
    }

    #[test]
    fn test_estimate_cleans_before_lookup() {
        assert_eq!(estimate(&["200g Potato (boiled)"]).calories, 77);
        assert_eq!(estimate(&["saffron"]).calories, 0);
        let empty: [&str; 0] = [];
        assert_eq!(estimate(&empty).calories, 0);
    }

    #[test]
    fn test_profile_defaults_and_overrides() {
        assert_eq!(nutrition_profile("Mystery Stew"), NutritionProfile::default());

        let protein = nutrition_profile("Chicken Curry");
        assert_eq!((protein.protein, protein.calories), (20, 400));

        // sweet overrides the protein bump
        let sweet = nutrition_profile("Paneer Kheer");
        assert_eq!(sweet.protein, 5);
        assert_eq!(sweet.calories, 450);

        let light = nutrition_profile("Cucumber Raita");
        assert_eq!((light.calories, light.fat, light.carbs), (150, 8, 20));
    }
}
