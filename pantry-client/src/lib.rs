pub mod generation;
pub mod kitchen;

pub use generation::{GeminiClient, GeminiConfig, GenerationError, RecipeGenerator};
pub use kitchen::{Kitchen, KitchenError};
