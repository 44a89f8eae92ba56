//! # Recipe Manager Common Library
//!
//! Shared code for the recipe manager service and its tooling:
//! - Database bootstrap and schema
//! - Recipe, ingredient and instruction models
//! - Configuration loading and root folder resolution
//! - Utility functions

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
