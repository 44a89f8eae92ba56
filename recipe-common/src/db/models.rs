//! Database models
//!
//! Row structs map column names one to one (snake_case); JSON uses the
//! camelCase names the web client submits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned when none is supplied
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Recipe row (summary form, children not populated)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    /// Minutes
    pub prep_time: i64,
    /// Minutes
    pub cook_time: i64,
    pub servings: i64,
    /// Public path of the stored image (`/uploads/<file>`)
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i64,
    pub recipe_id: String,
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub id: i64,
    pub recipe_id: String,
    pub step_number: i64,
    pub description: String,
}

/// Recipe with its ingredients and ordered instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    /// Ordered by step number ascending
    pub instructions: Vec<Instruction>,
}

/// Ingredient as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewIngredient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: None,
            unit: None,
        }
    }
}

/// Complete data for a recipe write
///
/// Instructions are plain descriptions; the step number of each is its
/// 1-based position in the vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeData {
    pub title: String,
    pub description: String,
    pub category: String,
    pub prep_time: i64,
    pub cook_time: i64,
    pub servings: i64,
    /// On update, `None` keeps the stored image path
    pub image_path: Option<String>,
    pub ingredients: Vec<NewIngredient>,
    pub instructions: Vec<String>,
}

impl RecipeData {
    /// Data with the given title and every other field at its default
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            prep_time: 0,
            cook_time: 0,
            servings: 0,
            image_path: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
        }
    }
}

/// Optional restrictions for recipe listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    /// Exact category match
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring of title or description
    #[serde(default)]
    pub search: Option<String>,
}
