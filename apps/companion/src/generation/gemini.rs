//! Gemini REST client.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use study_core::{Difficulty, QuizSession, StudyGuide};

use super::schema;
use super::{ChatChunk, ChatRole, ChatStream, ChatTurn, Citation, ContentGenerator, GenerationError};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection and model settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub voice: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
                inline_data: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl GenerateContentRequest {
    fn prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::text(Some("user"), text)],
            system_instruction: None,
            generation_config: None,
            tools: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.first_candidate()?.content.as_ref()?;
        Some(
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect(),
        )
    }

    fn inline_data(&self) -> Option<&InlineData> {
        self.first_candidate()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }

    fn citations(&self) -> Vec<Citation> {
        self.first_candidate()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|g| {
                g.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| {
                        Some(Citation {
                            uri: web.uri.clone()?,
                            title: web.title.clone().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Gemini-backed content generator.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: GeminiConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    async fn send(
        &self,
        url: &str,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::Response, GenerationError> {
        if self.config.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, message });
        }

        Ok(resp)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = self.endpoint(model, "generateContent");
        self.send(&url, request)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    /// Request JSON output conforming to `schema` and decode it.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        system_instruction: Option<&str>,
        schema: Value,
    ) -> Result<T, GenerationError> {
        let request = GenerateContentRequest {
            system_instruction: system_instruction.map(|s| Content::text(None, s)),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema),
                ..Default::default()
            }),
            ..GenerateContentRequest::prompt(prompt)
        };

        let response = self.generate(&self.config.text_model, &request).await?;
        let text = response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;
        serde_json::from_str(&text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    async fn generate_inline_data(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<Vec<u8>, GenerationError> {
        let response = self.generate(model, request).await?;
        let data = response.inline_data().ok_or(GenerationError::EmptyResponse)?;
        decode_base64(&data.data)
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, GenerationError> {
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| GenerationError::Malformed(format!("invalid base64 payload: {}", e)))
}

/// Parse one server-sent-events line of a streamed response.
fn parse_sse_line(line: &str) -> Option<Result<ChatChunk, GenerationError>> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<GenerateContentResponse>(payload)
            .map(|response| ChatChunk {
                text: response.text().unwrap_or_default(),
                citations: response.citations(),
            })
            .map_err(|e| GenerationError::Malformed(e.to_string())),
    )
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_study_content(&self, topic: &str) -> Result<StudyGuide, GenerationError> {
        tracing::debug!(topic, "requesting study guide");
        self.generate_json(
            schema::study_prompt(topic),
            Some(schema::EDUCATOR_INSTRUCTION),
            schema::study_guide_schema(),
        )
        .await
    }

    async fn generate_quiz_questions(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<QuizSession, GenerationError> {
        tracing::debug!(topic, difficulty = difficulty.as_str(), "requesting quiz");
        let session: QuizSession = self
            .generate_json(
                schema::quiz_prompt(topic, difficulty),
                None,
                schema::quiz_schema(),
            )
            .await?;

        if session.questions.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(session)
    }

    async fn generate_diagram_image(
        &self,
        topic: &str,
        section_title: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        let request = GenerateContentRequest::prompt(schema::diagram_prompt(topic, section_title));
        self.generate_inline_data(&self.config.image_model, &request)
            .await
    }

    async fn generate_speech_audio(&self, text: &str) -> Result<Vec<u8>, GenerationError> {
        let request = GenerateContentRequest {
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(json!({
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": self.config.voice } }
                })),
                ..Default::default()
            }),
            ..GenerateContentRequest::prompt(text)
        };
        self.generate_inline_data(&self.config.tts_model, &request)
            .await
    }

    async fn stream_chat_reply(
        &self,
        topic: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChatStream, GenerationError> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "model",
                };
                Content::text(Some(role), turn.text.clone())
            })
            .collect();
        contents.push(Content::text(Some("user"), message));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(None, schema::tutor_instruction(topic))),
            generation_config: None,
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        let url = format!(
            "{}?alt=sse",
            self.endpoint(&self.config.text_model, "streamGenerateContent")
        );
        let resp = self.send(&url, &request).await?;
        let mut bytes = Box::pin(resp.bytes_stream());

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(GenerationError::Network(e.to_string()));
                        break;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(event) = parse_sse_line(&String::from_utf8_lossy(&line)) {
                        yield event;
                    }
                }
            }

            if let Some(event) = parse_sse_line(&String::from_utf8_lossy(&buffer)) {
                yield event;
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(None, "be brief")),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
            ..GenerateContentRequest::prompt("hello")
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert!(value.get("tools").is_none());
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_search_tool_serializes_as_empty_object() {
        let tool = Tool {
            google_search: GoogleSearch {},
        };
        assert_eq!(serde_json::to_value(&tool).unwrap(), json!({ "googleSearch": {} }));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), None);
        assert!(response.inline_data().is_none());
    }

    #[test]
    fn test_inline_data_decodes() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your diagram" },
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } }
                ]}
            }]
        }))
        .unwrap();

        let data = response.inline_data().unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(decode_base64(&data.data).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            decode_base64("not base64!"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_sse_line_with_citations() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"The SA node"}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://example.org/sa","title":"SA node"}},{"retrievedContext":{}}]}}]}"#;

        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.text, "The SA node");
        assert_eq!(
            chunk.citations,
            vec![Citation {
                title: "SA node".to_string(),
                uri: "https://example.org/sa".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_sse_line_ignores_non_data() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("data: ").is_none());
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Some(Err(GenerationError::Malformed(_)))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://localhost:8080/v1beta/".to_string(),
            ..GeminiConfig::new("key")
        });
        assert_eq!(
            client.endpoint("gemini-2.5-flash", "generateContent"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let client = GeminiClient::new(GeminiConfig::new(""));
        let result = client.generate_study_content("Cranial Nerves").await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }
}
