//! OpenAI-compatible gateway client implementing `VisionAnalyzer`.

use crate::error::{AnalyzerError, Result};
use crate::parse::{parse_model_json, ParsedResponse};
use crate::prompts;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use snapdoc_core::{AnalysisResult, CandidateRegion, Plan, Region, VisionAnalyzer};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// API key for the gateway.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Gateway base URL (an OpenAI-compatible `/chat/completions` host).
    pub base_url: String,
}

impl AnalyzerConfig {
    /// Read configuration from the environment.
    ///
    /// The key comes from `OPENROUTER_API_KEY`; a missing key is a
    /// construction-time error, not a pipeline outcome.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("OPENROUTER_API_KEY").map_err(|_| AnalyzerError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Remote multimodal analyzer against an OpenAI-compatible gateway.
///
/// Transport and parse failures never escape the trait boundary: they
/// degrade into `Plan`/`AnalysisResult` values carrying diagnostics.
pub struct GatewayAnalyzer {
    client: reqwest::Client,
    config: AnalyzerConfig,
}

impl GatewayAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AnalyzerError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("snapdoc/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AnalyzerConfig::from_env()?)
    }

    /// Send one chat completion and return the message text.
    async fn complete(&self, content: Value) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": 2048,
            "messages": [{ "role": "user", "content": content }],
        });
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(AnalyzerError::EmptyResponse)
    }

    /// Content parts for an image-plus-prompt message.
    fn image_content(image: &[u8], prompt: &str) -> Value {
        let media_type = sniff_media_type(image);
        let data_url = format!("data:{media_type};base64,{}", BASE64.encode(image));
        json!([
            { "type": "image_url", "image_url": { "url": data_url } },
            { "type": "text", "text": prompt },
        ])
    }
}

/// Media type from magic bytes; PNG when unrecognized.
fn sniff_media_type(image: &[u8]) -> &'static str {
    if image.len() >= 2 && image[..2] == [0xff, 0xd8] {
        "image/jpeg"
    } else if image.len() >= 12 && &image[..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Build a `Plan` from a raw model response, degrading on any parse
/// failure.
fn plan_from_response(raw: String) -> Plan {
    match parse_model_json(&raw) {
        ParsedResponse::Parsed(value) => match serde_json::from_value::<Plan>(value) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "plan shape mismatch, using defaults");
                Plan::degraded(raw, format!("plan shape mismatch: {e}"))
            }
        },
        ParsedResponse::Degraded { raw } => {
            warn!("unparseable plan response, using defaults");
            Plan::degraded(raw, "unparseable analyzer response")
        }
    }
}

/// Build an `AnalysisResult` from a raw locate response.
///
/// Candidate fields are coerced individually so one malformed region
/// does not discard the rest; confidence is clamped into [0, 1].
fn locate_from_response(raw: String) -> AnalysisResult {
    match parse_model_json(&raw) {
        ParsedResponse::Parsed(value) => {
            let regions = value["regions"]
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| CandidateRegion {
                            label: entry["label"].as_str().unwrap_or_default().to_string(),
                            region: Region::new(
                                entry["left"].as_i64().unwrap_or(0) as i32,
                                entry["top"].as_i64().unwrap_or(0) as i32,
                                entry["width"].as_i64().unwrap_or(0).max(0) as u32,
                                entry["height"].as_i64().unwrap_or(0).max(0) as u32,
                            ),
                            confidence: entry["confidence"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0),
                        })
                        .collect()
                })
                .unwrap_or_default();
            AnalysisResult {
                description: value["description"].as_str().unwrap_or_default().to_string(),
                regions,
                raw_response: raw,
                metadata: json!({ "found": value["found"].as_bool().unwrap_or(false) }),
            }
        }
        ParsedResponse::Degraded { raw } => AnalysisResult {
            raw_response: raw,
            metadata: json!({ "error": "unparseable analyzer response" }),
            ..Default::default()
        },
    }
}

#[async_trait]
impl VisionAnalyzer for GatewayAnalyzer {
    async fn plan_from_text(&self, instruction: &str) -> Plan {
        let content = Value::String(prompts::plan_prompt(instruction));
        match self.complete(content).await {
            Ok(raw) => {
                debug!(bytes = raw.len(), "plan response received");
                plan_from_response(raw)
            }
            Err(e) => {
                warn!(error = %e, "plan request failed, using defaults");
                Plan::degraded(e.to_string(), format!("analyzer request failed: {e}"))
            }
        }
    }

    async fn locate(
        &self,
        image: &[u8],
        target: &str,
        image_width: u32,
        image_height: u32,
    ) -> AnalysisResult {
        let prompt = prompts::locate_prompt(target, image_width, image_height);
        match self.complete(Self::image_content(image, &prompt)).await {
            Ok(raw) => {
                debug!(bytes = raw.len(), "locate response received");
                locate_from_response(raw)
            }
            Err(e) => {
                warn!(error = %e, "locate request failed");
                AnalysisResult {
                    metadata: json!({ "error": e.to_string() }),
                    ..Default::default()
                }
            }
        }
    }

    async fn describe(&self, image: &[u8], question: &str) -> AnalysisResult {
        let prompt = if question.is_empty() {
            prompts::DESCRIBE_DEFAULT
        } else {
            question
        };
        match self.complete(Self::image_content(image, prompt)).await {
            Ok(raw) => AnalysisResult {
                description: raw.clone(),
                raw_response: raw,
                ..Default::default()
            },
            Err(e) => {
                warn!(error = %e, "describe request failed");
                AnalysisResult {
                    metadata: json!({ "error": e.to_string() }),
                    ..Default::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_media_type() {
        assert_eq!(sniff_media_type(&[0xff, 0xd8, 0xff, 0xe0]), "image/jpeg");
        assert_eq!(
            sniff_media_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            "image/webp"
        );
        assert_eq!(sniff_media_type(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(sniff_media_type(b""), "image/png");
    }

    #[test]
    fn test_plan_from_clean_response() {
        let raw = r#"{"needs_screenshot": true, "target_element": "DCF table",
            "target_document": "report.docx", "reasoning": "capture the model"}"#;
        let plan = plan_from_response(raw.to_string());
        assert!(!plan.is_degraded());
        assert_eq!(plan.target_element.as_deref(), Some("DCF table"));
        assert_eq!(plan.target_document, "report.docx");
    }

    #[test]
    fn test_plan_from_fenced_response() {
        let raw = "Sure!\n```json\n{\"target_document\": \"notes.md\"}\n```";
        let plan = plan_from_response(raw.to_string());
        assert!(!plan.is_degraded());
        assert_eq!(plan.target_document, "notes.md");
        // Unstated fields fall back to their defaults.
        assert!(plan.needs_screenshot);
    }

    #[test]
    fn test_plan_from_garbage_degrades() {
        let plan = plan_from_response("no json here".to_string());
        assert!(plan.is_degraded());
        assert_eq!(plan.target_document, "output.docx");
        assert_eq!(plan.degraded.as_deref(), Some("no json here"));
    }

    #[test]
    fn test_locate_response_parses_regions() {
        let raw = r#"{"found": true, "description": "a chart",
            "regions": [
                {"label": "chart", "left": 100, "top": 50, "width": 640, "height": 480, "confidence": 0.92},
                {"label": "legend", "left": 700, "top": 50, "width": 120, "height": 200, "confidence": 0.4}
            ]}"#;
        let result = locate_from_response(raw.to_string());
        assert_eq!(result.regions.len(), 2);
        assert_eq!(result.metadata["found"], true);
        let best = result.best_region().unwrap();
        assert_eq!(best.label, "chart");
        assert_eq!(best.region, Region::new(100, 50, 640, 480));
    }

    #[test]
    fn test_locate_coerces_hostile_values() {
        // Negative sizes, out-of-range confidence, missing label.
        let raw = r#"{"regions": [
            {"left": -20, "top": 10, "width": -5, "height": 100, "confidence": 1.7}
        ]}"#;
        let result = locate_from_response(raw.to_string());
        let candidate = &result.regions[0];
        assert_eq!(candidate.region.width, 0);
        assert_eq!(candidate.region.left, -20);
        assert_eq!(candidate.confidence, 1.0);
        assert_eq!(candidate.label, "");
    }

    #[test]
    fn test_locate_unparseable_keeps_raw() {
        let result = locate_from_response("I see nothing".to_string());
        assert!(result.regions.is_empty());
        assert_eq!(result.raw_response, "I see nothing");
        assert_eq!(result.metadata["error"], "unparseable analyzer response");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = GatewayAnalyzer::new(AnalyzerConfig::new("")).err().unwrap();
        assert!(matches!(err, AnalyzerError::MissingApiKey));
    }
}
