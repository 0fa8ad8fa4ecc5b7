//! One visitor's screen session: their ingredients, the last recipe, its
//! photo and whatever went wrong.

use pantry::{IngredientList, Recipe, RecipeImage};

use crate::generation::{GenerationError, RecipeGenerator};

pub const NO_INGREDIENTS_MESSAGE: &str = "Please add some ingredients first.";
pub const EMPTY_RECIPE_MESSAGE: &str = "Failed to generate a recipe. The model returned no content.";
pub const RECIPE_FAILED_MESSAGE: &str = "Failed to generate recipe from Gemini API.";

/// What the user gets told when the recipe step fails.
pub fn failure_message(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::EmptyResponse => EMPTY_RECIPE_MESSAGE,
        _ => RECIPE_FAILED_MESSAGE,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum KitchenError {
    #[error("{}", NO_INGREDIENTS_MESSAGE)]
    NoIngredients,
    #[error("A recipe is already being generated.")]
    Busy,
    #[error("{}", failure_message(.0))]
    Generation(#[source] GenerationError),
}

/// A recipe and, if the image model cooperated, its photo.
#[derive(Debug, Clone)]
pub struct Generated {
    pub recipe: Recipe,
    pub image: Option<RecipeImage>,
}

/// Run the recipe step, then the photo step.
///
/// A failed photo is logged and dropped; only the recipe step can fail the whole run.
pub async fn run_generation(
    generator: &dyn RecipeGenerator,
    ingredients: &[String],
) -> Result<Generated, GenerationError> {
    let recipe = generate_recipe_only(generator, ingredients).await?;
    let image = illustrate(generator, &recipe).await;
    Ok(Generated { recipe, image })
}

/// Run the recipe step alone. The image model is never called.
pub async fn run_generation_without_image(
    generator: &dyn RecipeGenerator,
    ingredients: &[String],
) -> Result<Generated, GenerationError> {
    let recipe = generate_recipe_only(generator, ingredients).await?;
    Ok(Generated { recipe, image: None })
}

async fn generate_recipe_only(
    generator: &dyn RecipeGenerator,
    ingredients: &[String],
) -> Result<Recipe, GenerationError> {
    let recipe = generator.generate_recipe(ingredients).await.map_err(|err| {
        tracing::error!("Error generating recipe: {}", err);
        err
    })?;
    tracing::info!("Generated recipe {:?}", recipe.name);
    Ok(recipe)
}

async fn illustrate(generator: &dyn RecipeGenerator, recipe: &Recipe) -> Option<RecipeImage> {
    match generator
        .generate_recipe_image(&recipe.name, &recipe.description)
        .await
    {
        Ok(image) => image,
        Err(err) => {
            tracing::warn!("Error generating recipe image, continuing without one: {}", err);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct Kitchen {
    ingredients: IngredientList,
    recipe: Option<Recipe>,
    image: Option<RecipeImage>,
    error: Option<String>,
    busy: bool,
    with_image: bool,
}

impl Default for Kitchen {
    fn default() -> Self {
        Self::new()
    }
}

impl Kitchen {
    /// A fresh session, pre-stocked with the usual staples.
    pub fn new() -> Self {
        Self::with_ingredients(IngredientList::with_staples())
    }

    pub fn with_ingredients(ingredients: IngredientList) -> Self {
        Self {
            ingredients,
            recipe: None,
            image: None,
            error: None,
            busy: false,
            with_image: true,
        }
    }

    /// Skip the photo step; only the recipe is requested.
    pub fn without_image(mut self) -> Self {
        self.with_image = false;
        self
    }

    pub fn ingredients(&self) -> &IngredientList {
        &self.ingredients
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn image(&self) -> Option<&RecipeImage> {
        self.image.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the Generate action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.ingredients.is_empty()
    }

    pub fn add_ingredient(&mut self, raw: &str) -> bool {
        self.ingredients.add(raw)
    }

    pub fn remove_ingredient(&mut self, value: &str) -> bool {
        self.ingredients.remove(value)
    }

    /// Start a generation: validate, mark busy and clear the previous result.
    ///
    /// Returns the ingredients to send. Nothing may be sent when this fails.
    pub fn begin(&mut self) -> Result<Vec<String>, KitchenError> {
        if self.busy {
            return Err(KitchenError::Busy);
        }
        if self.ingredients.is_empty() {
            self.error = Some(NO_INGREDIENTS_MESSAGE.into());
            return Err(KitchenError::NoIngredients);
        }
        self.busy = true;
        self.error = None;
        self.recipe = None;
        self.image = None;
        Ok(self.ingredients.as_slice().to_vec())
    }

    /// Record the outcome of a generation started with [`Kitchen::begin`].
    pub fn finish(&mut self, outcome: Result<Generated, GenerationError>) -> Result<(), KitchenError> {
        self.busy = false;
        match outcome {
            Ok(Generated { recipe, image }) => {
                self.recipe = Some(recipe);
                self.image = image;
                Ok(())
            }
            Err(err) => {
                self.recipe = None;
                self.image = None;
                self.error = Some(failure_message(&err).into());
                Err(KitchenError::Generation(err))
            }
        }
    }

    /// The whole round trip for callers that can hold the kitchen across the awaits.
    pub async fn generate(&mut self, generator: &dyn RecipeGenerator) -> Result<(), KitchenError> {
        let ingredients = self.begin()?;
        let outcome = if self.with_image {
            run_generation(generator, &ingredients).await
        } else {
            run_generation_without_image(generator, &ingredients).await
        };
        self.finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fake::{sample_image, sample_recipe, FakeFailure, FakeGenerator};

    #[tokio::test]
    async fn empty_list_never_calls_out() {
        let generator = FakeGenerator::cooking(sample_recipe());
        let mut kitchen = Kitchen::with_ingredients(IngredientList::new());

        let err = kitchen.generate(&generator).await.unwrap_err();
        assert!(matches!(err, KitchenError::NoIngredients));
        assert_eq!(kitchen.error(), Some(NO_INGREDIENTS_MESSAGE));
        assert_eq!(generator.recipe_calls(), 0);
        assert_eq!(generator.image_calls(), 0);
        assert!(!kitchen.is_busy());
    }

    #[tokio::test]
    async fn success_shows_recipe_as_returned() {
        let generator = FakeGenerator::cooking(sample_recipe()).with_image(sample_image());
        let mut kitchen = Kitchen::new();

        kitchen.generate(&generator).await.unwrap();
        assert_eq!(kitchen.recipe(), Some(&sample_recipe()));
        assert_eq!(kitchen.image(), Some(&sample_image()));
        assert_eq!(kitchen.error(), None);
        assert_eq!(
            generator.last_ingredients().unwrap(),
            IngredientList::with_staples().as_slice()
        );
        assert_eq!(generator.image_calls(), 1);
    }

    #[tokio::test]
    async fn image_failure_keeps_the_recipe() {
        let generator = FakeGenerator::cooking(sample_recipe()).with_failing_image(FakeFailure::Api);
        let mut kitchen = Kitchen::new();

        kitchen.generate(&generator).await.unwrap();
        assert_eq!(kitchen.recipe(), Some(&sample_recipe()));
        assert!(kitchen.image().is_none());
        assert_eq!(kitchen.error(), None);
    }

    #[tokio::test]
    async fn recipe_failure_clears_previous_result() {
        let mut kitchen = Kitchen::new();
        let good = FakeGenerator::cooking(sample_recipe()).with_image(sample_image());
        kitchen.generate(&good).await.unwrap();
        assert!(kitchen.recipe().is_some());

        let bad = FakeGenerator::failing(FakeFailure::Api);
        let err = kitchen.generate(&bad).await.unwrap_err();
        assert_eq!(err.to_string(), RECIPE_FAILED_MESSAGE);
        assert!(kitchen.recipe().is_none());
        assert!(kitchen.image().is_none());
        assert_eq!(kitchen.error(), Some(RECIPE_FAILED_MESSAGE));
        assert_eq!(bad.image_calls(), 0);
    }

    #[tokio::test]
    async fn empty_model_output_has_its_own_message() {
        let mut kitchen = Kitchen::new();
        let generator = FakeGenerator::failing(FakeFailure::Empty);
        kitchen.generate(&generator).await.unwrap_err();
        assert_eq!(kitchen.error(), Some(EMPTY_RECIPE_MESSAGE));
    }

    #[test]
    fn no_reentrant_submission() {
        let mut kitchen = Kitchen::new();
        kitchen.begin().unwrap();
        assert!(kitchen.is_busy());
        assert!(!kitchen.can_submit());
        assert!(matches!(kitchen.begin(), Err(KitchenError::Busy)));

        kitchen.finish(Ok(Generated { recipe: sample_recipe(), image: None })).unwrap();
        assert!(kitchen.can_submit());
    }

    #[tokio::test]
    async fn without_image_skips_the_photo_call() {
        let generator = FakeGenerator::cooking(sample_recipe()).with_image(sample_image());
        let mut kitchen = Kitchen::new().without_image();

        kitchen.generate(&generator).await.unwrap();
        assert_eq!(kitchen.recipe(), Some(&sample_recipe()));
        assert!(kitchen.image().is_none());
        assert_eq!(generator.recipe_calls(), 1);
        assert_eq!(generator.image_calls(), 0);
    }

    #[test]
    fn default_kitchen_has_the_staples() {
        let kitchen = Kitchen::default();
        assert_eq!(kitchen.ingredients(), Kitchen::new().ingredients());
        assert_eq!(kitchen.ingredients(), &IngredientList::with_staples());
        assert!(kitchen.can_submit());
    }

    #[test]
    fn begin_clears_the_old_error() {
        let mut kitchen = Kitchen::with_ingredients(IngredientList::new());
        kitchen.begin().unwrap_err();
        assert!(kitchen.error().is_some());

        kitchen.add_ingredient("Rice");
        assert_eq!(kitchen.begin().unwrap(), vec!["rice".to_string()]);
        assert_eq!(kitchen.error(), None);
    }
}
