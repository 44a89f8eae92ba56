//! HTTP API handlers for recipe-server

pub mod form;
pub mod health;
pub mod recipes;

pub use form::RecipeForm;
pub use health::health_routes;
pub use recipes::{
    create_recipe, delete_recipe, get_recipe, list_categories, list_recipes, recipe_routes,
    update_recipe,
};
