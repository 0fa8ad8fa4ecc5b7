use base64::Engine;
use serde::{Deserialize, Serialize};

/// A recipe as returned by the text model.
///
/// Every field is required on the wire, so a response missing any of them
/// fails to deserialize rather than producing a half-filled recipe.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "recipeName")]
    pub name: String,
    pub description: String,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// An illustrative photo of a finished recipe.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipeImage {
    pub mime_type: String,
    pub content_bytes: Vec<u8>,
}

impl std::fmt::Debug for RecipeImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeImage")
            .field("mime_type", &self.mime_type)
            .field("content_bytes", &self.content_bytes.len())
            .finish()
    }
}

impl RecipeImage {
    /// Decode base64 image bytes as handed back by the image model.
    pub fn from_base64(
        mime_type: Option<&str>,
        encoded: &str,
    ) -> Result<Self, base64::DecodeError> {
        let content_bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Ok(Self {
            mime_type: mime_type.unwrap_or(DEFAULT_IMAGE_MIME).to_string(),
            content_bytes,
        })
    }

    /// Render the image as a data URL, usable directly as an `<img src>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            // For the purpose of data urls, you do NOT need to use the URL_SAFE variant
            base64::engine::general_purpose::STANDARD.encode(&self.content_bytes)
        )
    }

    /// File extension matching the MIME type, for saving to disk.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}
