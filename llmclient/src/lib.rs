//! Minimal client for schema-constrained JSON generation.
//!
//! Two hosted model APIs are supported behind one interface: Google's
//! Gemini `generateContent` endpoint and the OpenRouter chat-completions
//! endpoint. A [`SchemaRequest`] carries the prompt plus the response
//! schema in both dialects the providers expect, and [`Client::complete`]
//! returns the model's raw JSON text. One call is one attempt; retry and
//! validation policy belong to the caller.
//!
//! ```no_run
//! use llmclient::{Client, Provider, SchemaRequest};
//!
//! # async fn demo() -> Result<(), llmclient::Error> {
//! let client = Client::from_env(Provider::Gemini)?;
//! let request = SchemaRequest::new(
//!     "inventory",
//!     serde_json::json!({"type": "object"}),
//!     serde_json::json!({"type": "OBJECT"}),
//! )
//! .with_user("List the items mentioned in this text: ...");
//! let raw = client.complete(&request).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const OPENROUTER_DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// App name reported to OpenRouter via the `X-Title` header.
const APP_TITLE: &str = "chargraph";

/// Generous timeout: a full-book prompt can take minutes to answer.
const REQUEST_TIMEOUT_SECS: u64 = 600;
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur when talking to a provider.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured: set the {0} environment variable")]
    NoApiKey(&'static str),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse response envelope: {0}")]
    Parse(String),

    #[error("response contained no generated content")]
    Empty,
}

/// Which hosted API serves the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenRouter,
}

impl Provider {
    /// Environment variable holding the API key for this provider.
    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    /// Model used when the caller does not override one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => GEMINI_DEFAULT_MODEL,
            Provider::OpenRouter => OPENROUTER_DEFAULT_MODEL,
        }
    }
}

/// A single structured-output request.
///
/// The two schema fields describe the same document: `json_schema` in the
/// lowercase JSON-Schema dialect OpenRouter's `response_format` takes, and
/// `gemini_schema` in the uppercase OpenAPI style Gemini's `responseSchema`
/// field requires. The client picks whichever its provider needs.
#[derive(Debug, Clone)]
pub struct SchemaRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub schema_name: String,
    pub json_schema: Value,
    pub gemini_schema: Value,
}

impl SchemaRequest {
    pub fn new(schema_name: impl Into<String>, json_schema: Value, gemini_schema: Value) -> Self {
        Self {
            system: String::new(),
            user: String::new(),
            temperature: 1.0,
            schema_name: schema_name.into(),
            json_schema,
            gemini_schema,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Client for one provider and one model.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    provider: Provider,
    model: String,
}

impl Client {
    /// Create a client with an explicit API key.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            provider,
            model: provider.default_model().to_string(),
        }
    }

    /// Create a client reading the key from the provider's environment
    /// variable (`GEMINI_API_KEY` or `OPENROUTER_API_KEY`).
    pub fn from_env(provider: Provider) -> Result<Self, Error> {
        let api_key =
            std::env::var(provider.key_var()).map_err(|_| Error::NoApiKey(provider.key_var()))?;
        Ok(Self::new(provider, api_key))
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one request and return the model's raw text output.
    ///
    /// The text is expected to be a JSON document conforming to the
    /// request's schema, but no validation happens here; truncated or
    /// malformed output is returned as-is for the caller to judge.
    pub async fn complete(&self, request: &SchemaRequest) -> Result<String, Error> {
        match self.provider {
            Provider::Gemini => self.complete_gemini(request).await,
            Provider::OpenRouter => self.complete_openrouter(request).await,
        }
    }

    async fn complete_gemini(&self, request: &SchemaRequest) -> Result<String, Error> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);

        let system_instruction = (!request.system.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: &request.system,
            }],
        });
        let body = GenerateRequest {
            system_instruction,
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: &request.user,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: "application/json",
                response_schema: &request.gemini_schema,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_generate_body(&text)
    }

    async fn complete_openrouter(&self, request: &SchemaRequest) -> Result<String, Error> {
        let mut messages = Vec::new();
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    strict: true,
                    schema: &request.json_schema,
                },
            },
        };

        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        parse_chat_body(&text)
    }
}

// ====== Gemini wire types ======

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiTextPart>,
}

#[derive(Deserialize)]
struct GeminiTextPart {
    #[serde(default)]
    text: String,
}

/// Extract the generated text from a Gemini response body.
fn parse_generate_body(body: &str) -> Result<String, Error> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::Parse(format!("invalid JSON body: {e}")))?;
    if let Some(error) = value.get("error") {
        return Err(api_error_from_value(error));
    }

    let response: GenerateResponse =
        serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;
    let candidate = response.candidates.into_iter().next().ok_or(Error::Empty)?;
    let text: String = candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect();
    if text.is_empty() {
        return Err(Error::Empty);
    }
    Ok(text)
}

// ====== OpenRouter wire types ======

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Extract the generated text from an OpenRouter response body.
///
/// OpenRouter can return HTTP 200 with an `error` object instead of
/// choices, so the body is inspected before deserializing the envelope.
fn parse_chat_body(body: &str) -> Result<String, Error> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| Error::Parse(format!("invalid JSON body: {e}")))?;
    if let Some(error) = value.get("error") {
        return Err(api_error_from_value(error));
    }

    let response: ChatResponse =
        serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;
    let choice = response.choices.into_iter().next().ok_or(Error::Empty)?;
    match choice.message.content {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(Error::Empty),
    }
}

fn api_error_from_value(error: &Value) -> Error {
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .unwrap_or_default() as u16;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Error::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> SchemaRequest {
        SchemaRequest::new(
            "characters",
            json!({"type": "object"}),
            json!({"type": "OBJECT"}),
        )
    }

    #[test]
    fn provider_key_vars() {
        assert_eq!(Provider::Gemini.key_var(), "GEMINI_API_KEY");
        assert_eq!(Provider::OpenRouter.key_var(), "OPENROUTER_API_KEY");
    }

    #[test]
    fn client_uses_provider_default_model() {
        let client = Client::new(Provider::Gemini, "test-key");
        assert_eq!(client.model(), GEMINI_DEFAULT_MODEL);

        let client = Client::new(Provider::OpenRouter, "test-key");
        assert_eq!(client.model(), OPENROUTER_DEFAULT_MODEL);
    }

    #[test]
    fn with_model_overrides_default() {
        let client = Client::new(Provider::Gemini, "test-key").with_model("gemini-1.5-pro");
        assert_eq!(client.model(), "gemini-1.5-pro");
        assert_eq!(client.provider(), Provider::Gemini);
    }

    #[test]
    fn request_builder_sets_fields() {
        let request = request()
            .with_system("You are a test.")
            .with_user("Hello")
            .with_temperature(0.3);
        assert_eq!(request.system, "You are a test.");
        assert_eq!(request.user, "Hello");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.schema_name, "characters");
    }

    #[test]
    fn chat_request_serializes_response_format() {
        let request = request().with_system("sys").with_user("usr");
        let body = ChatRequest {
            model: "google/gemini-2.0-flash-exp:free",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    strict: true,
                    schema: &request.json_schema,
                },
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "characters");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert_eq!(value["messages"][0]["role"], "system");
    }

    #[test]
    fn generate_request_serializes_generation_config() {
        let request = request().with_system("sys").with_user("usr");
        let body = GenerateRequest {
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &request.system,
                }],
            }),
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart {
                    text: &request.user,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                response_mime_type: "application/json",
                response_schema: &request.gemini_schema,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn parse_chat_body_extracts_content() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
        })
        .to_string();
        assert_eq!(parse_chat_body(&body).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn parse_chat_body_surfaces_embedded_error() {
        let body = json!({
            "error": {"code": 429, "message": "rate limited"}
        })
        .to_string();
        match parse_chat_body(&body) {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_body_empty_choices() {
        let body = json!({"choices": []}).to_string();
        assert!(matches!(parse_chat_body(&body), Err(Error::Empty)));
    }

    #[test]
    fn parse_generate_body_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"characters\""}, {"text": ": []}"}]}
            }]
        })
        .to_string();
        assert_eq!(parse_generate_body(&body).unwrap(), "{\"characters\": []}");
    }

    #[test]
    fn parse_generate_body_no_candidates() {
        let body = json!({"candidates": []}).to_string();
        assert!(matches!(parse_generate_body(&body), Err(Error::Empty)));
    }
}
