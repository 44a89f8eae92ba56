//! Recipe endpoints
//!
//! | Verb   | Path                      |
//! |--------|---------------------------|
//! | GET    | /api/recipes              |
//! | GET    | /api/recipes/categories   |
//! | GET    | /api/recipes/:id          |
//! | POST   | /api/recipes              |
//! | PUT    | /api/recipes/:id          |
//! | DELETE | /api/recipes/:id          |
//!
//! Image files are written before the database transaction and removed
//! afterwards; neither is rolled back with the transaction.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use recipe_common::db::{Recipe, RecipeDetail, RecipeFilter};
use serde::Serialize;
use tracing::{debug, info};

use super::form::RecipeForm;
use crate::{ApiError, ApiResult, AppState};

/// Response for a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

/// GET /api/recipes
///
/// Summaries (no ingredients or instructions), newest first. Optional
/// `category` and `search` query parameters narrow the list.
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
) -> ApiResult<Json<Vec<Recipe>>> {
    let recipes = state.recipes.list(&filter).await?;
    Ok(Json(recipes))
}

/// GET /api/recipes/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.recipes.categories().await?))
}

/// GET /api/recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecipeDetail>> {
    state
        .recipes
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| recipe_not_found(&id))
}

/// POST /api/recipes
///
/// **Errors:**
/// - 400 Bad Request: missing title, non-image attachment, oversize image
/// - 500 Internal Server Error: store or filesystem failure
pub async fn create_recipe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RecipeDetail>)> {
    let mut form = RecipeForm::from_multipart(multipart).await?;

    // Validate before anything is written
    let mut data = form.to_create_data()?;

    let stored_image = match form.image.take() {
        Some(upload) => Some(state.images.save(&upload).await?),
        None => None,
    };
    data.image_path = stored_image.clone();

    match state.recipes.create(&data).await {
        Ok(detail) => {
            info!(
                recipe_id = %detail.recipe.id,
                title = %detail.recipe.title,
                "Recipe created via API"
            );
            Ok((StatusCode::CREATED, Json(detail)))
        }
        Err(e) => {
            if let Some(path) = stored_image {
                state.images.remove(&path).await;
            }
            Err(e.into())
        }
    }
}

/// PUT /api/recipes/:id
///
/// Fields left out of the form keep their stored values. Without an
/// attached image the stored image is kept; with one, the previous file is
/// removed once the update has committed.
///
/// **Errors:**
/// - 404 Not Found: no recipe with this id
/// - 400 Bad Request: blank title, non-image attachment, oversize image
/// - 500 Internal Server Error: store or filesystem failure
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<RecipeDetail>> {
    let mut form = RecipeForm::from_multipart(multipart).await?;

    let existing = state
        .recipes
        .get_by_id(&id)
        .await?
        .ok_or_else(|| recipe_not_found(&id))?;

    let mut data = form.to_update_data(&existing)?;

    let stored_image = match form.image.take() {
        Some(upload) => Some(state.images.save(&upload).await?),
        None => None,
    };
    data.image_path = stored_image.clone();

    let result = state.recipes.update(&id, &data).await;

    match (result, stored_image) {
        (Ok(Some(detail)), new_image) => {
            if let (Some(new_path), Some(old_path)) = (new_image, existing.recipe.image_path) {
                if new_path != old_path {
                    state.images.remove(&old_path).await;
                }
            }
            info!(recipe_id = %id, "Recipe updated via API");
            Ok(Json(detail))
        }
        (Ok(None), new_image) => {
            // Deleted between the existence check and the update
            if let Some(path) = new_image {
                state.images.remove(&path).await;
            }
            Err(recipe_not_found(&id))
        }
        (Err(e), new_image) => {
            if let Some(path) = new_image {
                state.images.remove(&path).await;
            }
            Err(e.into())
        }
    }
}

/// DELETE /api/recipes/:id
///
/// Removes the recipe, its children, and its stored image file.
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let deleted = state
        .recipes
        .delete(&id)
        .await?
        .ok_or_else(|| recipe_not_found(&id))?;

    if let Some(path) = deleted.image_path.as_deref() {
        state.images.remove(path).await;
    }

    info!(recipe_id = %id, "Recipe deleted via API");

    Ok(Json(DeleteResponse {
        message: "Recipe deleted successfully".to_string(),
        id,
    }))
}

fn recipe_not_found(id: &str) -> ApiError {
    debug!(recipe_id = id, "Recipe not found");
    ApiError::NotFound(format!("Recipe not found: {}", id))
}

/// Build recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route("/api/recipes/categories", get(list_categories))
        .route(
            "/api/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}
