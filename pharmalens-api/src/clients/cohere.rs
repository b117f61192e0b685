/// AI analysis client wrapping the Cohere `generate` API
///
/// One POST per scan with a fixed Indonesian-language prompt embedding
/// the OCR text. The completion is bounded (1000 tokens) and
/// low-temperature (0.3) so the six informational sections come back in
/// a stable shape. No retries.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::ClientError;
use crate::config::AiConfig;

const STAGE: &str = "AI analysis";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.3;

/// Client for the Cohere text-generation API
#[derive(Debug, Clone)]
pub struct CohereClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

/// Builds the fixed analysis prompt around the OCR text
///
/// The template asks for six sections, always in Indonesian: drug name
/// and active ingredient, dosage and usage, benefits, contraindications
/// and warnings, side effects, and storage instructions.
pub fn build_prompt(ocr_text: &str) -> String {
    format!(
        r#"Analisis teks berikut yang diekstrak dari gambar kemasan obat/produk farmasi. Berikan informasi lengkap dan selalu gunakan dalam bahasa Indonesia tentang:

1. Nama Obat dan Kandungan Aktif: Identifikasi nama obat dan zat aktif utama (selalu gunakan bahasa indonesia)
2. Dosis dan Cara Penggunaan: Petunjuk dosis dan cara pemberian obat (selalu gunakan bahasa indonesia)
3. Manfaat: Manfaat dari obat ini (selalu gunakan bahasa indonesia)
4. Kontraindikasi dan Peringatan: Kondisi yang tidak boleh menggunakan obat ini (selalu gunakan bahasa indonesia)
5. Efek Samping: Kemungkinan efek samping yang dapat terjadi (selalu gunakan bahasa indonesia)
6. Cara Penyimpanan: Petunjuk penyimpanan yang benar (selalu gunakan bahasa indonesia)

Teks OCR: "{}"

PENTING:
- Jawab HANYA dalam bahasa Indonesia
- Gunakan format yang jelas dengan poin-poin
- Jika teks tidak jelas atau bukan dari kemasan obat, berikan penjelasan dan saran umum
- Berikan peringatan untuk selalu konsultasi dengan dokter atau apoteker
- Gunakan istilah medis yang mudah dipahami masyarakat Indonesia
"#,
        ocr_text
    )
}

impl CohereClient {
    /// Creates a client from configuration
    pub fn new(config: &AiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("HTTP client construction failed");

        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Generates the medicine analysis for extracted OCR text
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails, the service answers
    /// with an error status, or the response carries no generations.
    pub async fn analyze(&self, ocr_text: &str) -> Result<String, ClientError> {
        debug!(model = %self.model, "Requesting AI analysis");

        let prompt = build_prompt(ocr_text);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            k: 0,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
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

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|source| ClientError::Transport { stage: STAGE, source })?;

        let text = body
            .generations
            .first()
            .map(|g| g.text.trim().to_string())
            .ok_or_else(|| ClientError::Service {
                stage: STAGE,
                message: "Response contained no generations".to_string(),
            })?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_ocr_text() {
        let prompt = build_prompt("Paracetamol 500mg");
        assert!(prompt.contains(r#"Teks OCR: "Paracetamol 500mg""#));
    }

    #[test]
    fn test_prompt_has_six_sections() {
        let prompt = build_prompt("anything");

        for section in [
            "1. Nama Obat dan Kandungan Aktif",
            "2. Dosis dan Cara Penggunaan",
            "3. Manfaat",
            "4. Kontraindikasi dan Peringatan",
            "5. Efek Samping",
            "6. Cara Penyimpanan",
        ] {
            assert!(prompt.contains(section), "missing section: {}", section);
        }
    }

    #[test]
    fn test_parse_generation_response() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"generations": [{"text": "  1. Nama Obat: Paracetamol ...  "}]}"#,
        )
        .unwrap();

        assert_eq!(body.generations.len(), 1);
        assert_eq!(
            body.generations[0].text.trim(),
            "1. Nama Obat: Paracetamol ..."
        );
    }

    #[test]
    fn test_parse_empty_generations() {
        let body: GenerateResponse = serde_json::from_str(r#"{"generations": []}"#).unwrap();
        assert!(body.generations.is_empty());
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "command",
            prompt: "p",
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            k: 0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "command");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["k"], 0);
    }
}
