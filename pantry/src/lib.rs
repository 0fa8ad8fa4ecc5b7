pub mod basic_models;
pub mod ingredients;

pub use basic_models::{Recipe, RecipeImage};
pub use ingredients::IngredientList;
