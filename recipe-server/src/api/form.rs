//! Recipe request schema
//!
//! Create and update requests arrive as `multipart/form-data`: scalar text
//! fields, the ingredient and instruction collections as JSON text, and an
//! optional `image` file. [`RecipeForm`] is the typed view of that body; it
//! is built once at the boundary and turned into [`RecipeData`] for the
//! repository.
//!
//! Field rules:
//! - `title` is required on create; on update an absent title keeps the
//!   stored one, a blank one is rejected
//! - numeric fields: absent or blank → default (0, or the stored value on
//!   update); unparsable or negative → 0
//! - collections: absent → default (empty, or the stored children on
//!   update); unparsable → empty

use axum::extract::Multipart;
use recipe_common::db::{NewIngredient, RecipeData, RecipeDetail, DEFAULT_CATEGORY};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::uploads::ImageUpload;

/// Typed recipe request body
#[derive(Debug, Default)]
pub struct RecipeForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
    pub ingredients: Option<Vec<NewIngredient>>,
    pub instructions: Option<Vec<String>>,
    pub image: Option<ImageUpload>,
}

impl RecipeForm {
    /// Read every part of a multipart body
    ///
    /// Unknown fields are ignored. An `image` part without a file name or
    /// with an empty body counts as "no image".
    pub async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = RecipeForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                match file_name {
                    Some(file_name) if !file_name.is_empty() && !bytes.is_empty() => {
                        form.image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                    _ => debug!("Ignoring empty image part"),
                }
                continue;
            }

            let text = field.text().await?;
            form.set_text_field(&name, text);
        }

        Ok(form)
    }

    /// Apply one text field
    pub fn set_text_field(&mut self, name: &str, text: String) {
        match name {
            "title" => self.title = Some(text),
            "description" => self.description = Some(text),
            "category" => self.category = Some(text),
            "prepTime" => self.prep_time = parse_count(&text),
            "cookTime" => self.cook_time = parse_count(&text),
            "servings" => self.servings = parse_count(&text),
            "ingredients" => self.ingredients = parse_ingredients(&text),
            "instructions" => self.instructions = parse_instructions(&text),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    /// Data for a new recipe; fails without a title
    pub fn to_create_data(&self) -> ApiResult<RecipeData> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

        Ok(RecipeData {
            title: title.to_string(),
            description: self.description.clone().unwrap_or_default(),
            category: non_blank(self.category.as_deref())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            prep_time: self.prep_time.unwrap_or(0),
            cook_time: self.cook_time.unwrap_or(0),
            servings: self.servings.unwrap_or(0),
            image_path: None,
            ingredients: self.ingredients.clone().unwrap_or_default(),
            instructions: self.instructions.clone().unwrap_or_default(),
        })
    }

    /// Data for replacing `existing`; absent fields keep their stored value
    ///
    /// `image_path` is left `None` so the repository keeps the stored path
    /// unless the caller sets a new one.
    pub fn to_update_data(&self, existing: &RecipeDetail) -> ApiResult<RecipeData> {
        let title = match self.title.as_deref().map(str::trim) {
            None => existing.recipe.title.clone(),
            Some("") => return Err(ApiError::BadRequest("Title cannot be empty".to_string())),
            Some(title) => title.to_string(),
        };

        let stored = &existing.recipe;

        Ok(RecipeData {
            title,
            description: self
                .description
                .clone()
                .or_else(|| stored.description.clone())
                .unwrap_or_default(),
            category: non_blank(self.category.as_deref())
                .unwrap_or(&stored.category)
                .to_string(),
            prep_time: self.prep_time.unwrap_or(stored.prep_time),
            cook_time: self.cook_time.unwrap_or(stored.cook_time),
            servings: self.servings.unwrap_or(stored.servings),
            image_path: None,
            ingredients: self.ingredients.clone().unwrap_or_else(|| {
                existing
                    .ingredients
                    .iter()
                    .map(|i| NewIngredient {
                        name: i.name.clone(),
                        quantity: i.quantity.clone(),
                        unit: i.unit.clone(),
                    })
                    .collect()
            }),
            instructions: self.instructions.clone().unwrap_or_else(|| {
                existing
                    .instructions
                    .iter()
                    .map(|i| i.description.clone())
                    .collect()
            }),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Minutes or servings: blank → None, otherwise a non-negative count (0 if invalid)
fn parse_count(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let value = text
        .parse::<i64>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        })
        .filter(|v| *v >= 0);

    Some(value.unwrap_or_else(|| {
        warn!(value = text, "Unparsable count, using 0");
        0
    }))
}

/// JSON array of `{name, quantity?, unit?}` (plain strings are names)
///
/// Blank text → None; anything that is not an array → empty list.
/// Entries without a usable name are dropped.
fn parse_ingredients(text: &str) -> Option<Vec<NewIngredient>> {
    let items = parse_json_array(text, "ingredients")?;

    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => non_blank(Some(name.as_str())).map(NewIngredient::new),
                Value::Object(map) => {
                    let name = map.get("name").and_then(scalar_text)?;
                    let name = non_blank(Some(name.as_str()))?.to_string();
                    Some(NewIngredient {
                        name,
                        quantity: map.get("quantity").and_then(scalar_text),
                        unit: map.get("unit").and_then(scalar_text),
                    })
                }
                _ => None,
            })
            .collect(),
    )
}

/// JSON array of step descriptions (strings or `{description}` objects)
fn parse_instructions(text: &str) -> Option<Vec<String>> {
    let items = parse_json_array(text, "instructions")?;

    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(step) => Some(step.clone()),
                Value::Object(map) => map.get("description").and_then(scalar_text),
                _ => None,
            })
            .filter(|step| !step.trim().is_empty())
            .collect(),
    )
}

fn parse_json_array(text: &str, field: &str) -> Option<Vec<Value>> {
    if text.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        Ok(_) | Err(_) => {
            warn!(field, "Field is not a JSON array, treating as empty");
            Some(Vec::new())
        }
    }
}

/// String value of a JSON string or number; null and others → None
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recipe_common::db::{Ingredient, Instruction, Recipe};

    fn form(fields: &[(&str, &str)]) -> RecipeForm {
        let mut form = RecipeForm::default();
        for (name, text) in fields {
            form.set_text_field(name, text.to_string());
        }
        form
    }

    fn stored() -> RecipeDetail {
        RecipeDetail {
            recipe: Recipe {
                id: "r1".into(),
                title: "Soup".into(),
                description: Some("Warm".into()),
                category: "Starter".into(),
                prep_time: 10,
                cook_time: 20,
                servings: 4,
                image_path: Some("/uploads/recipe-1-1.png".into()),
                created_at: Utc::now(),
            },
            ingredients: vec![Ingredient {
                id: 1,
                recipe_id: "r1".into(),
                name: "Salt".into(),
                quantity: Some("1".into()),
                unit: Some("tsp".into()),
            }],
            instructions: vec![Instruction {
                id: 1,
                recipe_id: "r1".into(),
                step_number: 1,
                description: "Boil water".into(),
            }],
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("  "), None);
        assert_eq!(parse_count("15"), Some(15));
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count("2.5"), Some(2));
        assert_eq!(parse_count("abc"), Some(0));
        assert_eq!(parse_count("-3"), Some(0));
    }

    #[test]
    fn test_parse_ingredients() {
        let parsed = parse_ingredients(
            r#"[{"name":"Salt"},{"name":"Flour","quantity":2,"unit":"cups"},{"name":"  "},"Pepper",7]"#,
        )
        .unwrap();

        assert_eq!(
            parsed,
            vec![
                NewIngredient::new("Salt"),
                NewIngredient {
                    name: "Flour".into(),
                    quantity: Some("2".into()),
                    unit: Some("cups".into()),
                },
                NewIngredient::new("Pepper"),
            ]
        );

        assert_eq!(parse_ingredients(""), None);
        assert_eq!(parse_ingredients("not json"), Some(vec![]));
        assert_eq!(parse_ingredients(r#"{"name":"Salt"}"#), Some(vec![]));
    }

    #[test]
    fn test_parse_instructions() {
        let parsed =
            parse_instructions(r#"["Boil water",{"description":"Add salt"}," ",null]"#).unwrap();
        assert_eq!(parsed, vec!["Boil water", "Add salt"]);
        assert_eq!(parse_instructions("[oops"), Some(vec![]));
    }

    #[test]
    fn test_create_requires_title() {
        assert!(form(&[]).to_create_data().is_err());
        assert!(form(&[("title", "   ")]).to_create_data().is_err());
    }

    #[test]
    fn test_create_defaults() {
        let data = form(&[("title", " Soup "), ("prepTime", "x")]).to_create_data().unwrap();
        assert_eq!(data.title, "Soup");
        assert_eq!(data.description, "");
        assert_eq!(data.category, "Uncategorized");
        assert_eq!((data.prep_time, data.cook_time, data.servings), (0, 0, 0));
        assert!(data.ingredients.is_empty());
        assert!(data.instructions.is_empty());
        assert!(data.image_path.is_none());
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let data = form(&[("cookTime", "45")]).to_update_data(&stored()).unwrap();
        assert_eq!(data.title, "Soup");
        assert_eq!(data.description, "Warm");
        assert_eq!(data.category, "Starter");
        assert_eq!((data.prep_time, data.cook_time, data.servings), (10, 45, 4));
        assert_eq!(data.ingredients.len(), 1);
        assert_eq!(data.ingredients[0].unit.as_deref(), Some("tsp"));
        assert_eq!(data.instructions, vec!["Boil water"]);
        assert!(data.image_path.is_none());
    }

    #[test]
    fn test_update_replaces_supplied_fields() {
        let data = form(&[
            ("title", "Stew"),
            ("description", ""),
            ("instructions", r#"["Chop","Simmer"]"#),
            ("ingredients", "[]"),
        ])
        .to_update_data(&stored())
        .unwrap();

        assert_eq!(data.title, "Stew");
        assert_eq!(data.description, "");
        assert!(data.ingredients.is_empty());
        assert_eq!(data.instructions, vec!["Chop", "Simmer"]);
    }

    #[test]
    fn test_update_rejects_blank_title() {
        assert!(form(&[("title", "")]).to_update_data(&stored()).is_err());
    }
}
