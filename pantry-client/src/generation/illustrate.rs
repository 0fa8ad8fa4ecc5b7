use pantry::basic_models::DEFAULT_IMAGE_MIME;
use pantry::RecipeImage;
use serde::Deserialize;
use serde_json::json;

use super::{fill_prompt, GeminiClient, GenerationError};

pub fn photo_prompt(recipe_name: &str, description: &str) -> String {
    fill_prompt(
        include_str!("../prompts/photo.md").trim(),
        &[
            ("name", recipe_name),
            ("description", description.trim().trim_end_matches('.')),
        ],
    )
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

impl GeminiClient {
    /// Ask the image model for a single 16:9 photo of the finished dish.
    ///
    /// `Ok(None)` means the model answered but produced no image.
    pub async fn illustrate_recipe(
        &self,
        recipe_name: &str,
        description: &str,
    ) -> Result<Option<RecipeImage>, GenerationError> {
        tracing::info!("Generating a photo of {}", recipe_name);
        let prompt = photo_prompt(recipe_name, description);
        tracing::debug!("Prompt: {}", prompt);
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "16:9",
                "outputOptions": { "mimeType": DEFAULT_IMAGE_MIME },
            }
        });
        let response: PredictResponse = self
            .call_model(&self.config.image_model, "predict", &body)
            .await?;
        let Some(prediction) = response.predictions.into_iter().next() else {
            return Ok(None);
        };
        let Some(encoded) = prediction.bytes_base64_encoded else {
            return Ok(None);
        };
        let image = RecipeImage::from_base64(prediction.mime_type.as_deref(), &encoded)
            .map_err(|e| GenerationError::Malformed(format!("image bytes: {}", e)))?;
        Ok(Some(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GeminiConfig;
    use httpmock::prelude::*;

    const PATH: &str = "/v1beta/models/imagen-4.0-generate-001:predict";

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.base_url()))
    }

    #[test]
    fn prompt_embeds_name_and_description() {
        let prompt = photo_prompt("Lemon Tart", "Bright and buttery.");
        assert!(prompt.starts_with(
            "A vibrant, high-quality, professional food photograph of \"Lemon Tart\". Bright and buttery. "
        ));
        assert!(prompt.ends_with("epic detail."));
    }

    #[test]
    fn placeholders_inside_the_name_stay_literal() {
        let prompt = photo_prompt("The {description} Special", "Crisp and golden.");
        assert!(prompt.contains("photograph of \"The {description} Special\". Crisp and golden. "));
        assert_eq!(prompt.matches("Crisp and golden").count(), 1);
    }

    #[tokio::test]
    async fn decodes_the_first_prediction() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PATH)
                    .header("x-goog-api-key", "test-key")
                    .body_contains("Lemon Tart")
                    .json_body_partial(
                        r#"{
                            "parameters": {
                                "sampleCount": 1,
                                "aspectRatio": "16:9",
                                "outputOptions": { "mimeType": "image/jpeg" }
                            }
                        }"#,
                    );
                then.status(200).json_body(json!({
                    "predictions": [{ "bytesBase64Encoded": "/9j/4AAQ", "mimeType": "image/jpeg" }]
                }));
            })
            .await;

        let image = client(&server)
            .illustrate_recipe("Lemon Tart", "Bright and buttery.")
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[tokio::test]
    async fn no_predictions_means_no_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(200).json_body(json!({}));
            })
            .await;

        let image = client(&server)
            .illustrate_recipe("Lemon Tart", "Bright.")
            .await
            .unwrap();
        assert!(image.is_none());
    }

    #[tokio::test]
    async fn server_errors_surface() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(PATH);
                then.status(500).body("boom");
            })
            .await;

        let err = client(&server)
            .illustrate_recipe("Lemon Tart", "Bright.")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 500, .. }));
    }
}
