//! Database access layer for recipe-server

pub mod recipes;

pub use recipes::RecipeRepository;
