/// OCR client wrapping the OCR.space `parse/image` API
///
/// One multipart POST per scan: the stored upload plus the API key and
/// parse options. The call carries a 30-second timeout and is never
/// retried; the extracted text comes back whitespace-trimmed.

use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::ClientError;
use crate::config::OcrConfig;

const STAGE: &str = "OCR";

/// Client for the OCR.space text-extraction API
#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

/// Response envelope of the OCR.space parse endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    is_errored_on_processing: bool,

    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,

    /// String or array of strings depending on the failure
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceResponse {
    /// Trimmed text of the first parsed result, empty when nothing parsed
    fn extracted_text(&self) -> String {
        self.parsed_results
            .as_deref()
            .and_then(|results| results.first())
            .map(|r| r.parsed_text.trim().to_string())
            .unwrap_or_default()
    }

    fn error_text(&self) -> String {
        match &self.error_message {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(parts)) => parts
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "OCR processing failed".to_string(),
        }
    }
}

impl OcrClient {
    /// Creates a client from configuration
    ///
    /// The request timeout is applied at the client level, so every call
    /// through this client inherits it.
    pub fn new(config: &OcrConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("HTTP client construction failed");

        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Extracts text from a stored image file
    ///
    /// # Errors
    ///
    /// Returns `ClientError` when the file cannot be read, the request
    /// fails, or the service reports a processing error. An image that
    /// parses but contains no text yields `Ok` with an empty string; the
    /// caller decides what that means.
    pub async fn extract_text(&self, image_path: &Path) -> Result<String, ClientError> {
        debug!(path = %image_path.display(), "Submitting image to OCR service");

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| ClientError::Io { stage: STAGE, source })?;

        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("apikey", self.api_key.clone())
            .text("language", "eng")
            .text("isOverlayRequired", "false")
            .text("detectOrientation", "true")
            .text("scale", "true");

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport { stage: STAGE, source })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Service {
                stage: STAGE,
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let body: OcrSpaceResponse = response
            .json()
            .await
            .map_err(|source| ClientError::Transport { stage: STAGE, source })?;

        if body.is_errored_on_processing {
            return Err(ClientError::Service {
                stage: STAGE,
                message: body.error_text(),
            });
        }

        Ok(body.extracted_text())
    }
}
