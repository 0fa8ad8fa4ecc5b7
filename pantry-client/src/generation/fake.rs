//! A scripted generator for tests and offline demos.
//!
//! It never touches the network, and counts how often each step was called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pantry::{Recipe, RecipeImage};

use super::{GenerationError, RecipeGenerator};

/// How a scripted step should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    /// The model answered with nothing.
    Empty,
    /// The API refused the request.
    Api,
}

impl FakeFailure {
    fn to_error(self) -> GenerationError {
        match self {
            FakeFailure::Empty => GenerationError::EmptyResponse,
            FakeFailure::Api => GenerationError::Api {
                status: 503,
                message: "The model is overloaded.".into(),
            },
        }
    }
}

#[derive(Debug)]
pub struct FakeGenerator {
    recipe: Result<Recipe, FakeFailure>,
    image: Result<Option<RecipeImage>, FakeFailure>,
    delay: Option<Duration>,
    recipe_calls: AtomicUsize,
    image_calls: AtomicUsize,
    last_ingredients: Mutex<Option<Vec<String>>>,
}

impl FakeGenerator {
    /// Always returns `recipe`, with no photo.
    pub fn cooking(recipe: Recipe) -> Self {
        Self {
            recipe: Ok(recipe),
            image: Ok(None),
            delay: None,
            recipe_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            last_ingredients: Mutex::new(None),
        }
    }

    /// Fails the recipe step.
    pub fn failing(failure: FakeFailure) -> Self {
        Self {
            recipe: Err(failure),
            ..Self::cooking(sample_recipe())
        }
    }

    pub fn with_image(mut self, image: RecipeImage) -> Self {
        self.image = Ok(Some(image));
        self
    }

    pub fn with_failing_image(mut self, failure: FakeFailure) -> Self {
        self.image = Err(failure);
        self
    }

    /// Take `delay` to think before answering the recipe step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn recipe_calls(&self) -> usize {
        self.recipe_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn last_ingredients(&self) -> Option<Vec<String>> {
        self.last_ingredients
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecipeGenerator for FakeGenerator {
    async fn generate_recipe(&self, ingredients: &[String]) -> Result<Recipe, GenerationError> {
        self.recipe_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_ingredients.lock() {
            *last = Some(ingredients.to_vec());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.recipe.clone().map_err(FakeFailure::to_error)
    }

    async fn generate_recipe_image(
        &self,
        _recipe_name: &str,
        _description: &str,
    ) -> Result<Option<RecipeImage>, GenerationError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image.clone().map_err(FakeFailure::to_error)
    }
}

/// A plausible recipe for the default staples.
pub fn sample_recipe() -> Recipe {
    Recipe {
        name: "Sweet Cream Pancakes".into(),
        description: "Fluffy pancakes enriched with cream.".into(),
        prep_time: "10 minutes".into(),
        cook_time: "15 minutes".into(),
        servings: "4 servings".into(),
        ingredients: vec![
            "1 cup corn flour".into(),
            "2 eggs".into(),
            "1/2 cup cream".into(),
            "2 tbsp sugar".into(),
            "1 pinch salt".into(),
        ],
        instructions: vec![
            "Whisk the eggs, cream and sugar.".into(),
            "Fold in the flour and salt.".into(),
            "Fry ladlefuls in a little oil until golden.".into(),
        ],
    }
}

/// A tiny stand-in JPEG payload.
pub fn sample_image() -> RecipeImage {
    RecipeImage {
        mime_type: "image/jpeg".into(),
        content_bytes: vec![0xff, 0xd8, 0xff, 0xe0],
    }
}
