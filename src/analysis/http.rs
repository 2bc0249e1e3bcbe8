//! HTTP client for the post-call analysis service.
//!
//! `POST {base_url}/api/post-call-analysis` carries the conversation, the
//! detected pattern, and the confidence score; the service responds with a
//! narrated explanation and optional synthesized audio. Failures here are
//! non-fatal to the caller: call teardown proceeds with the local
//! explanation instead.

use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Explanation, ExplanationGenerator};
use crate::call::DetectionSummary;
use crate::config::AnalysisConfig;

// ── Wire format ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PostCallAnalysisRequest<'a> {
    conversation: &'a str,
    pattern: &'a str,
    confidence: u32,
}

#[derive(Debug, Deserialize)]
struct PostCallAnalysisResponse {
    explanation: String,
    #[serde(default)]
    audio_base64: Option<String>,
    #[serde(default)]
    context_used: String,
    pattern: String,
    confidence: u32,
    success: bool,
}

// ── Client ────────────────────────────────────────────────────────

/// Client for the post-call analysis service.
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisClient {
    /// Build a client from analysis settings.
    pub fn new(config: &AnalysisConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build analysis HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe the service health endpoint.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ExplanationGenerator for HttpAnalysisClient {
    async fn explain(&self, summary: &DetectionSummary) -> anyhow::Result<Explanation> {
        let url = format!("{}/api/post-call-analysis", self.base_url);
        let request = PostCallAnalysisRequest {
            conversation: &summary.transcript,
            pattern: &summary.pattern,
            confidence: summary.confidence,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("analysis service request failed")?;

        if !response.status().is_success() {
            bail!("analysis service returned {}", response.status());
        }

        let body: PostCallAnalysisResponse = response
            .json()
            .await
            .context("invalid analysis service response")?;

        let audio = match body.audio_base64 {
            Some(b64) => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(b64.as_bytes())
                    .context("invalid audio payload in analysis response")?,
            ),
            None => None,
        };

        Ok(Explanation {
            text: body.explanation,
            audio,
            context_used: body.context_used,
            pattern: body.pattern,
            confidence: body.confidence,
            success: body.success,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summary() -> DetectionSummary {
        DetectionSummary {
            pattern: "IT Support Credential Harvesting".into(),
            confidence: 85,
            transcript: "hello verify your password".into(),
            matched_phrases: vec!["password".into()],
        }
    }

    fn client_for(server: &MockServer) -> HttpAnalysisClient {
        HttpAnalysisClient::new(&AnalysisConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            enabled: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_summary_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/post-call-analysis"))
            .and(body_json(serde_json::json!({
                "conversation": "hello verify your password",
                "pattern": "IT Support Credential Harvesting",
                "confidence": 85,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "explanation": "You were targeted by a credential harvesting attempt.",
                "audio_base64": null,
                "context_used": "redis",
                "pattern": "IT Support Credential Harvesting",
                "confidence": 85,
                "success": true,
            })))
            .mount(&server)
            .await;

        let explanation = client_for(&server).explain(&summary()).await.unwrap();
        assert_eq!(
            explanation.text,
            "You were targeted by a credential harvesting attempt."
        );
        assert!(explanation.audio.is_none());
        assert_eq!(explanation.context_used, "redis");
        assert!(explanation.success);
    }

    #[tokio::test]
    async fn audio_payload_is_decoded() {
        let server = MockServer::start().await;
        let b64 = base64::engine::general_purpose::STANDARD.encode(b"RIFFdata");
        Mock::given(method("POST"))
            .and(path("/api/post-call-analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "explanation": "explained",
                "audio_base64": b64,
                "context_used": "redis",
                "pattern": "Tech Support Scam",
                "confidence": 60,
                "success": true,
            })))
            .mount(&server)
            .await;

        let explanation = client_for(&server).explain(&summary()).await.unwrap();
        assert_eq!(explanation.audio.as_deref(), Some(b"RIFFdata".as_slice()));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/post-call-analysis"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client_for(&server).explain(&summary()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn health_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client_for(&server).health().await);

        let dead = MockServer::start().await;
        // No /health mock mounted: wiremock answers 404.
        assert!(!client_for(&dead).health().await);
    }

    #[test]
    fn trailing_slash_normalized() {
        let client = HttpAnalysisClient::new(&AnalysisConfig {
            base_url: "http://localhost:5000/".into(),
            timeout_secs: 5,
            enabled: true,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
