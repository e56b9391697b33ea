//! OCR collaborator: `POST multipart/form-data file=<png>` to an external
//! recognition microservice.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OcrError;

/// One OCR candidate: recognized text plus a confidence in `[0, 1]`.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrMatch {
    pub text: String,
    pub confidence: f64,
}

#[derive(Deserialize)]
struct OcrResponse {
    results: Vec<OcrMatch>,
    #[serde(default)]
    error: String,
}

/// External OCR microservice: `Recognize(image) -> [{text, confidence}]`.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Recognizes text in a PNG-encoded image.
    async fn recognize(&self, png_bytes: &[u8]) -> Result<Vec<OcrMatch>, OcrError>;

    /// Health check, called once at bootstrap so a misconfigured OCR
    /// endpoint is a fatal startup error rather than a per-cycle one.
    async fn health_check(&self) -> Result<(), OcrError>;
}

/// Default `OcrService` implementation over HTTP.
pub struct HttpOcrClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOcrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build OCR HTTP client"),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OcrService for HttpOcrClient {
    async fn recognize(&self, png_bytes: &[u8]) -> Result<Vec<OcrMatch>, OcrError> {
        let part = reqwest::multipart::Part::bytes(png_bytes.to_vec())
            .file_name("image.png")
            .mime_str("image/png")
            .expect("static mime string is valid");
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(OcrError::Status(resp.status().as_u16()));
        }

        let parsed: OcrResponse = resp.json().await?;
        if !parsed.error.is_empty() {
            return Err(OcrError::ServiceError(parsed.error));
        }

        Ok(parsed.results)
    }

    async fn health_check(&self) -> Result<(), OcrError> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(OcrError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}
