use base64::Engine as _;
use serde::Deserialize;

use crate::error::ExtractionError;
use crate::extractor::OcrEngine;

const ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Cloud Vision text-detection client. Only the full-text
/// annotation is consumed; word boxes are ignored.
pub struct GoogleVisionOcr {
    client: reqwest::blocking::Client,
    token: String,
}

impl GoogleVisionOcr {
    pub fn new(token: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            token: token.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct AnnotateResponse {
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Deserialize)]
struct ApiStatus {
    message: String,
}

impl OcrEngine for GoogleVisionOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "requests": [{
                "image": { "content": content },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        let response = self
            .client
            .post(ANNOTATE_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| ExtractionError::Ocr(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Ocr(format!("status {status}: {body}")));
        }

        let parsed: AnnotateResponse = response
            .json()
            .map_err(|e| ExtractionError::Ocr(e.to_string()))?;
        let image_response = parsed.responses.into_iter().next().unwrap_or_default();
        if let Some(err) = image_response.error {
            return Err(ExtractionError::Ocr(err.message));
        }

        // No annotations means no recognizable text, which is not a failure.
        Ok(image_response
            .text_annotations
            .into_iter()
            .next()
            .map(|a| a.description)
            .unwrap_or_default())
    }
}
