//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ExtractionError;
use crate::extract::CompletionModel;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

// ── Wire types ──

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

/// Concatenated text of the first candidate.
fn response_text(resp: GenerateResponse) -> Result<String, ExtractionError> {
    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        warn!(reason = %reason, "prompt blocked by model");
    }
    if let Some(tokens) = resp.usage.and_then(|u| u.total_token_count) {
        debug!(tokens, "model usage");
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or(ExtractionError::EmptyResponse)?;
    if let Some(reason) = candidate.finish_reason.as_deref()
        && reason != "STOP"
    {
        warn!(reason, "model stopped early");
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    Ok(text)
}

/// Text-in/text-out Gemini client for one model.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ExtractionError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), api_key, model, timeout)
    }

    /// `base_url` should be like `https://generativelanguage.googleapis.com/v1beta`.
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling model");
        let resp = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = serde_json::from_str(&resp.text().await?)?;
        response_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request,
    /// headers and body.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            let header_end = loop {
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers ended");
                request.extend_from_slice(&buf[..n]);
            };
            let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);
            while request.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/v1beta"), handle)
    }

    fn client(base_url: String) -> GeminiClient {
        GeminiClient::with_base_url(
            base_url,
            "gem-key".into(),
            "gemini-2.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn parse(body: &str) -> Result<String, ExtractionError> {
        response_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn generate_url_for_model() {
        let client = GeminiClient::with_base_url(
            "http://localhost:9000/v1beta/".into(),
            "key".into(),
            "models/gemini-2.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn text_parts_are_concatenated() {
        let text = parse(
            r#"{
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "[{\"a\":" }, { "text": "1}]" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "totalTokenCount": 42 }
            }"#,
        )
        .unwrap();
        assert_eq!(text, r#"[{"a":1}]"#);
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let err = parse(r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyResponse));
    }

    #[test]
    fn candidate_without_text_is_empty_response() {
        let err = parse(r#"{ "candidates": [{ "finishReason": "MAX_TOKENS" }] }"#).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyResponse));
    }

    #[tokio::test]
    async fn complete_posts_prompt_with_key() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"[]"}]},"finishReason":"STOP"}]}"#,
        )
        .await;

        let text = client(base_url).complete("Classify these").await.unwrap();
        assert_eq!(text, "[]");

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(lower.starts_with("post /v1beta/models/gemini-2.5-flash:generatecontent "));
        assert!(lower.contains("x-goog-api-key: gem-key"));
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Classify these");
        assert_eq!(json["generationConfig"]["temperature"], 0.0);
    }

    #[tokio::test]
    async fn complete_maps_error_status() {
        let (base_url, server) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"code":429,"message":"Resource exhausted"}}"#,
        )
        .await;

        let err = client(base_url).complete("Classify these").await.unwrap_err();
        match err {
            ExtractionError::Server { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("Resource exhausted"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn complete_rejects_undecodable_body() {
        let (base_url, server) = serve_once("200 OK", "not json").await;
        let err = client(base_url).complete("Classify these").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Json(_)));
        server.await.unwrap();
    }
}
