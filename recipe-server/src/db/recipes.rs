//! Recipe repository
//!
//! Translates recipes to and from rows. Writes that touch more than one row
//! run in a single transaction; each statement is awaited before the next is
//! issued and commit happens only after all of them succeeded. Returning
//! early with `?` drops the transaction, which rolls it back.

use recipe_common::db::{Ingredient, Instruction, Recipe, RecipeData, RecipeDetail, RecipeFilter};
use recipe_common::{time, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

const RECIPE_COLUMNS: &str =
    "id, title, description, category, prep_time, cook_time, servings, image_path, created_at";

/// Repository over the `recipes`, `ingredients` and `instructions` tables
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All recipes, newest first, without children
    pub async fn list_all(&self) -> Result<Vec<Recipe>> {
        self.list(&RecipeFilter::default()).await
    }

    /// Recipes matching the filter, newest first, without children
    ///
    /// Blank filter values are ignored. The search term matches title or
    /// description case-insensitively (ASCII).
    pub async fn list(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        let category = non_blank(filter.category.as_deref());
        let pattern =
            non_blank(filter.search.as_deref()).map(|term| format!("%{}%", escape_like(term)));

        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes
             WHERE (? IS NULL OR category = ?)
               AND (? IS NULL OR title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')
             ORDER BY created_at DESC, rowid DESC"
        );

        let recipes = sqlx::query_as::<_, Recipe>(&sql)
            .bind(category)
            .bind(category)
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .fetch_all(&self.pool)
            .await?;

        debug!(
            count = recipes.len(),
            category = ?category,
            search = ?filter.search,
            "Listed recipes"
        );

        Ok(recipes)
    }

    /// Distinct non-empty categories in use, sorted
    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM recipes WHERE trim(category) <> '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// One recipe with ingredients and ordered instructions
    ///
    /// `None` when no recipe has this id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<RecipeDetail>> {
        // Read all three tables from one snapshot
        let mut tx = self.pool.begin().await?;
        let detail = fetch_detail(&mut tx, id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Insert a recipe with all of its children atomically
    pub async fn create(&self, data: &RecipeData) -> Result<RecipeDetail> {
        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO recipes ({RECIPE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.category)
            .bind(data.prep_time)
            .bind(data.cook_time)
            .bind(data.servings)
            .bind(data.image_path.as_deref())
            .bind(time::now())
            .execute(&mut *tx)
            .await?;

        insert_children(&mut tx, &id, data).await?;

        let detail = fetch_detail(&mut tx, &id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Recipe {} missing after insert", id)))?;

        tx.commit().await?;

        info!(
            recipe_id = %id,
            ingredients = data.ingredients.len(),
            instructions = data.instructions.len(),
            "Created recipe"
        );

        Ok(detail)
    }

    /// Replace a recipe's fields and children atomically
    ///
    /// The stored image path is kept when `data.image_path` is `None`.
    /// Returns `None` (and writes nothing) when the recipe does not exist.
    pub async fn update(&self, id: &str, data: &RecipeData) -> Result<Option<RecipeDetail>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET title = ?, description = ?, category = ?,
                prep_time = ?, cook_time = ?, servings = ?,
                image_path = COALESCE(?, image_path)
            WHERE id = ?
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(data.prep_time)
        .bind(data.cook_time)
        .bind(data.servings)
        .bind(data.image_path.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(recipe_id = id, "Update skipped, recipe not found");
            return Ok(None);
        }

        sqlx::query("DELETE FROM ingredients WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM instructions WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_children(&mut tx, id, data).await?;

        let detail = fetch_detail(&mut tx, id).await?;

        tx.commit().await?;

        info!(
            recipe_id = id,
            ingredients = data.ingredients.len(),
            instructions = data.instructions.len(),
            image_replaced = data.image_path.is_some(),
            "Updated recipe"
        );

        Ok(detail)
    }

    /// Delete a recipe; children go with it through the cascade constraint
    ///
    /// Returns the deleted row, or `None` when the id did not exist.
    pub async fn delete(&self, id: &str) -> Result<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?");
        let existing = sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(recipe) = existing else {
            tx.rollback().await?;
            debug!(recipe_id = id, "Delete skipped, recipe not found");
            return Ok(None);
        };

        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(recipe_id = id, "Deleted recipe");

        Ok(Some(recipe))
    }
}

/// Insert ingredients, then instructions numbered from 1 in vector order
async fn insert_children(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    data: &RecipeData,
) -> Result<()> {
    for ingredient in &data.ingredients {
        sqlx::query(
            "INSERT INTO ingredients (recipe_id, name, quantity, unit) VALUES (?, ?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(&ingredient.name)
        .bind(ingredient.quantity.as_deref())
        .bind(ingredient.unit.as_deref())
        .execute(&mut *conn)
        .await?;
    }

    for (index, description) in data.instructions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO instructions (recipe_id, step_number, description) VALUES (?, ?, ?)",
        )
        .bind(recipe_id)
        .bind(index as i64 + 1)
        .bind(description)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> Result<Option<RecipeDetail>> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?");
    let Some(recipe) = sqlx::query_as::<_, Recipe>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let ingredients = sqlx::query_as::<_, Ingredient>(
        "SELECT id, recipe_id, name, quantity, unit FROM ingredients
         WHERE recipe_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let instructions = sqlx::query_as::<_, Instruction>(
        "SELECT id, recipe_id, step_number, description FROM instructions
         WHERE recipe_id = ? ORDER BY step_number",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(RecipeDetail {
        recipe,
        ingredients,
        instructions,
    }))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escape LIKE wildcards so the term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
