use super::{ChatMessage, CompletionRequest, CompletionResponse, GroundingSource, LLMConfig, LLMProvider, LLM};
use crate::error::{InterpreterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

fn build_client(config: &LLMConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?;
    Ok(client)
}

async fn ensure_success(provider: LLMProvider, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(InterpreterError::llm(provider, format!("API error {}: {}", status, text)))
}

/// Gemini provider implementation
pub struct GeminiProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    title: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    total_token_count: u32,
}

impl GeminiProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(InterpreterError::Configuration("Gemini API key required".to_string()));
        }

        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let text_content = |role: Option<&str>, text: &str| GeminiContent {
            role: role.map(str::to_string),
            parts: vec![GeminiPart { text: text.to_string() }],
        };

        GeminiRequest {
            contents: vec![text_content(Some("user"), &request.prompt)],
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|s| text_content(None, s)),
            tools: if request.grounded {
                vec![GeminiTool { google_search: GoogleSearch {} }]
            } else {
                Vec::new()
            },
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// Pull text and web citations out of a Gemini response
fn parse_gemini_response(response: GeminiResponse) -> CompletionResponse {
    let tokens_used = response.usage_metadata.map(|u| u.total_token_count);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return CompletionResponse {
            tokens_used,
            ..CompletionResponse::default()
        };
    };

    let text = candidate
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<String>();

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    let uri = web.uri?;
                    Some(GroundingSource {
                        title: web.title.filter(|t| !t.is_empty()).unwrap_or_else(|| "Source".to_string()),
                        uri,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    CompletionResponse {
        text: if text.trim().is_empty() { None } else { Some(text) },
        sources,
        tokens_used,
    }
}

#[async_trait]
impl LLM for GeminiProvider {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| InterpreterError::Configuration("Gemini API key not configured".to_string()))?;

        let base = self.config.endpoint.as_deref().unwrap_or(GEMINI_BASE_URL);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            base.trim_end_matches('/'),
            self.config.model,
            api_key
        );

        debug!(grounded = request.grounded, temperature = request.temperature, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&self.build_request(&request))
            .send()
            .await?;
        let response = ensure_success(LLMProvider::Gemini, response).await?;

        let gemini_response: GeminiResponse = response.json().await?;
        let parsed = parse_gemini_response(gemini_response);
        debug!("Gemini response: {} sources, tokens: {:?}", parsed.sources.len(), parsed.tokens_used);

        Ok(parsed)
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl ChatCompletionResponse {
    fn into_completion(self) -> CompletionResponse {
        let text = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|t| !t.trim().is_empty());

        CompletionResponse {
            text,
            sources: Vec::new(),
            tokens_used: self.usage.map(|u| u.total_tokens),
        }
    }
}

/// LMStudio provider implementation
pub struct LMStudioProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl LMStudioProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for LMStudioProvider {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| InterpreterError::Configuration("LMStudio endpoint not configured".to_string()))?;

        if request.grounded {
            debug!("LMStudio does not support search grounding, sending ungrounded request");
        }

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.to_messages(),
            max_tokens: self.config.max_tokens,
            temperature: request.temperature,
        };

        debug!("Sending request to LMStudio at {}", endpoint);

        let response = self.client.post(endpoint).json(&body).send().await?;
        let response = ensure_success(LLMProvider::LMStudio, response).await?;

        let chat_response: ChatCompletionResponse = response.json().await?;
        Ok(chat_response.into_completion())
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::LMStudio
    }
}

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(InterpreterError::Configuration("OpenAI API key required".to_string()));
        }

        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for OpenAIProvider {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| InterpreterError::Configuration("OpenAI API key not configured".to_string()))?;

        if request.grounded {
            debug!("OpenAI chat completions do not support search grounding, sending ungrounded request");
        }

        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: request.to_messages(),
            max_tokens: self.config.max_tokens,
            temperature: request.temperature,
        };

        let url = self.config.endpoint.as_deref().unwrap_or(OPENAI_URL);

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(LLMProvider::OpenAI, response).await?;

        let chat_response: ChatCompletionResponse = response.json().await?;
        Ok(chat_response.into_completion())
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::OpenAI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini() -> GeminiProvider {
        GeminiProvider::new(LLMConfig {
            api_key: Some("test-key".to_string()),
            ..LLMConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = CompletionRequest::new("what happens here?")
            .with_system_instruction("ROLE: analyst")
            .with_grounding()
            .with_temperature(0.4);

        let json = serde_json::to_value(gemini().build_request(&request)).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "what happens here?");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "ROLE: analyst");
        assert!(json["tools"][0]["googleSearch"].is_object());
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_gemini_request_without_grounding_omits_tools() {
        let request = CompletionRequest::new("list chapters");
        let json = serde_json::to_value(gemini().build_request(&request)).unwrap();

        assert!(json.get("tools").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_gemini_grounding_sources() {
        let raw = r###"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "## Core"}, {"text": " Concepts"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.com/a", "title": "Example A"}},
                        {"web": {"uri": "https://example.com/b"}},
                        {"retrievedContext": {}}
                    ]
                }
            }],
            "usageMetadata": {"totalTokenCount": 321}
        }"###;

        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let parsed = parse_gemini_response(response);

        assert_eq!(parsed.text.as_deref(), Some("## Core Concepts"));
        assert_eq!(parsed.tokens_used, Some(321));
        assert_eq!(
            parsed.sources,
            vec![
                GroundingSource { title: "Example A".to_string(), uri: "https://example.com/a".to_string() },
                GroundingSource { title: "Source".to_string(), uri: "https://example.com/b".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_gemini_empty_candidates() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let parsed = parse_gemini_response(response);
        assert!(parsed.text.is_none());
        assert!(parsed.sources.is_empty());
    }

    #[test]
    fn test_chat_completion_blank_text_is_none() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "   "}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(response.into_completion().text.is_none());
    }
}
