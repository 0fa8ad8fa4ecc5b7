use pantry::Recipe;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{fill_prompt, GeminiClient, GenerationError};

/// The structured output the text model must produce.
/// Every property is required so a partial recipe is never returned.
pub fn recipe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recipeName": { "type": "STRING", "description": "The name of the recipe." },
            "description": { "type": "STRING", "description": "A short, enticing description of the dish." },
            "prepTime": { "type": "STRING", "description": "Preparation time, e.g., '15 minutes'." },
            "cookTime": { "type": "STRING", "description": "Cooking time, e.g., '25 minutes'." },
            "servings": { "type": "STRING", "description": "Number of servings, e.g., '4 servings'." },
            "ingredients": {
                "type": "ARRAY",
                "description": "List of ingredients required for the recipe, including quantities.",
                "items": { "type": "STRING" }
            },
            "instructions": {
                "type": "ARRAY",
                "description": "Step-by-step instructions to prepare the dish.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["recipeName", "description", "prepTime", "cookTime", "servings", "ingredients", "instructions"],
    })
}

pub fn recipe_prompt(ingredients: &[String]) -> String {
    fill_prompt(
        include_str!("../prompts/recipe.md"),
        &[("ingredients", &ingredients.join(", "))],
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// All the text parts of the first candidate, glued together.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    /// Ask the text model for one recipe built around `ingredients`.
    pub async fn create_recipe(&self, ingredients: &[String]) -> Result<Recipe, GenerationError> {
        tracing::info!("Generating a recipe from {} ingredients", ingredients.len());
        let prompt = recipe_prompt(ingredients);
        tracing::debug!("Prompt: {}", prompt);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": recipe_schema(),
                "temperature": 0.8,
                "topP": 0.9,
            }
        });
        let response: GenerateContentResponse = self
            .call_model(&self.config.text_model, "generateContent", &body)
            .await?;
        let text = response.text();
        let json_text = text.trim();
        if json_text.is_empty() {
            tracing::error!("Gemini returned an empty response for recipe generation.");
            return Err(GenerationError::EmptyResponse);
        }
        serde_json::from_str(json_text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}
