//! Calls out to the hosted Gemini models: one text call for the recipe, one
//! image call for its photo.

use async_trait::async_trait;
use pantry::{Recipe, RecipeImage};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod fake;
pub mod illustrate;
pub mod llm;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("Request to Gemini failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gemini returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Gemini returned an empty response")]
    EmptyResponse,
    #[error("Could not understand Gemini's response: {0}")]
    Malformed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("API_KEY environment variable is not set.")]
    MissingApiKey,
}

/// Substitute `{key}` placeholders in one pass over the template.
///
/// Substituted text is never scanned again, so a value that itself contains
/// `{key}` is left as written.
pub fn fill_prompt(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        filled.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find_map(|(key, value)| {
            let placeholder_len = key.len() + 2;
            let matches = tail.len() >= placeholder_len
                && tail[1..].starts_with(key)
                && tail[1 + key.len()..].starts_with('}');
            matches.then_some((placeholder_len, *value))
        });
        match hit {
            Some((len, value)) => {
                filled.push_str(value);
                rest = &tail[len..];
            }
            None => {
                filled.push('{');
                rest = &tail[1..];
            }
        }
    }
    filled.push_str(rest);
    filled
}

/// Anything that can turn ingredients into a recipe and a recipe into a photo.
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate_recipe(&self, ingredients: &[String]) -> Result<Recipe, GenerationError>;

    async fn generate_recipe_image(
        &self,
        recipe_name: &str,
        description: &str,
    ) -> Result<Option<RecipeImage>, GenerationError>;
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
        }
    }

    /// Read the configuration from the environment (and `.env`, if present).
    ///
    /// `API_KEY` is required. `GEMINI_BASE_URL`, `GEMINI_TEXT_MODEL` and
    /// `GEMINI_IMAGE_MODEL` override the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| dotenvy::var(name).ok())
    }

    /// Build the configuration from any source of named variables.
    /// A blank `API_KEY` counts as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = lookup("GEMINI_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = lookup("GEMINI_IMAGE_MODEL") {
            config.image_model = model;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Client for the Gemini REST API.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    /// POST a JSON body to a model endpoint and decode the JSON reply.
    async fn call_model<B, R>(&self, model: &str, method: &str, body: &B) -> Result<R, GenerationError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.model_url(model, method))
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl RecipeGenerator for GeminiClient {
    async fn generate_recipe(&self, ingredients: &[String]) -> Result<Recipe, GenerationError> {
        self.create_recipe(ingredients).await
    }

    async fn generate_recipe_image(
        &self,
        recipe_name: &str,
        description: &str,
    ) -> Result<Option<RecipeImage>, GenerationError> {
        self.illustrate_recipe(recipe_name, description).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_urls() {
        let client = GeminiClient::new(GeminiConfig::new("k").with_base_url("http://localhost:9/"));
        assert_eq!(
            client.model_url("gemini-2.5-flash", "generateContent"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn fill_prompt_is_single_pass() {
        let filled = fill_prompt(
            "Photo of {name}. {description}. {unknown}",
            &[("name", "{description} Pie"), ("description", "Has {name} inside")],
        );
        assert_eq!(filled, "Photo of {description} Pie. Has {name} inside. {unknown}");
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn missing_or_blank_key_is_refused() {
        assert!(matches!(
            GeminiConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            GeminiConfig::from_lookup(lookup(&[("API_KEY", " \t")])),
            Err(ConfigError::MissingApiKey)
        ));
        assert_eq!(
            ConfigError::MissingApiKey.to_string(),
            "API_KEY environment variable is not set."
        );
    }

    #[test]
    fn overrides_replace_the_defaults() {
        let config = GeminiConfig::from_lookup(lookup(&[
            ("API_KEY", "k"),
            ("GEMINI_TEXT_MODEL", "gemini-test"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.text_model, "gemini-test");
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn config_debug_hides_the_key() {
        let shown = format!("{:?}", GeminiConfig::new("super-secret"));
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains(DEFAULT_TEXT_MODEL));
    }
}
