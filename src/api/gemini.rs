use crate::config::Settings;
use crate::error::{Result, VideoError};
use crate::idea::{GeneratedScript, IdeasResponse, VideoIdea};
use crate::prompts::{self, Avatar};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const MAX_ERROR_BODY_CHARS: usize = 2048;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: Settings,
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// A generated thumbnail image.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Handle to a long-running video generation job.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    generated_samples: Option<Vec<GeneratedSample>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedSample {
    video: Option<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoFile {
    uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// URI of the first generated video, if the job produced one.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .as_ref()?
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
    }
}

impl GeminiClient {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.settings.base_url, model, method)
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.settings.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Run a structured-output generateContent call and parse the JSON reply.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        contents: &str,
        system_instruction: &str,
        schema: Value,
        temperature: f64,
        top_p: Option<f64>,
    ) -> Result<T> {
        let mut generation_config = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
            "temperature": temperature,
        });
        if let Some(top_p) = top_p {
            generation_config["topP"] = json!(top_p);
        }

        let request_body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": contents }] }
            ],
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "generationConfig": generation_config,
        });

        let url = self.model_url(&self.settings.text_model, "generateContent");
        let response = self.post_json(&url, &request_body).await?;
        let response = ensure_success(response, "Gemini API").await?;

        let reply: GenerateContentResponse = response.json().await?;
        let text = extract_text(reply)?;
        debug!("Generated text: {}", text);

        serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| VideoError::ApiError(format!("Failed to parse model JSON: {}", e)))
    }

    /// Ask the text model for three video ideas about `topic`.
    pub async fn generate_ideas(&self, topic: &str) -> Result<IdeasResponse> {
        if topic.trim().is_empty() {
            return Err(VideoError::EmptyTopic);
        }
        info!("Generating video ideas for topic: {}", topic.trim());

        let ideas: IdeasResponse = self
            .generate_json(
                &prompts::ideas_prompt(topic),
                prompts::IDEAS_SYSTEM_INSTRUCTION,
                prompts::ideas_schema(),
                0.8,
                Some(0.9),
            )
            .await?;

        info!("Received {} ideas", ideas.video_ideas.len());
        Ok(ideas)
    }

    /// Write a single-scene script for `idea`.
    pub async fn generate_script(&self, idea: &VideoIdea) -> Result<GeneratedScript> {
        info!("Generating script for: {}", idea.title);

        let script: GeneratedScript = self
            .generate_json(
                &prompts::script_prompt(idea),
                prompts::SCRIPT_SYSTEM_INSTRUCTION,
                prompts::script_schema(),
                0.7,
                None,
            )
            .await?;

        if script.script.is_empty() {
            return Err(VideoError::SceneError(
                "The AI returned a script without scenes".to_string(),
            ));
        }
        Ok(script)
    }

    pub async fn generate_thumbnail(&self, suggestion: &str) -> Result<Thumbnail> {
        info!("Generating thumbnail for: {}", suggestion);

        let request_body = json!({
            "instances": [{ "prompt": prompts::thumbnail_prompt(suggestion) }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "16:9",
                "outputOptions": { "mimeType": "image/jpeg" },
            }
        });

        let url = self.model_url(&self.settings.image_model, "predict");
        let response = self.post_json(&url, &request_body).await?;
        let response = ensure_success(response, "Image generation API").await?;

        let reply: PredictResponse = response.json().await?;
        let prediction = reply
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or_else(|| VideoError::ApiError("No image in response".to_string()))?;

        let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
        let bytes = STANDARD.decode(encoded.trim())?;

        Ok(Thumbnail {
            bytes,
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| "image/jpeg".to_string()),
        })
    }

    /// Submit the video job. Returns the operation handle to poll.
    pub async fn start_video(
        &self,
        idea: &VideoIdea,
        script: &GeneratedScript,
        language: &str,
        avatar: Avatar,
    ) -> Result<Operation> {
        info!(
            "Submitting video generation for \"{}\" (language: {}, avatar: {})",
            idea.title, language, avatar
        );

        let request_body = json!({
            "instances": [{ "prompt": prompts::video_prompt(idea, script, language, avatar) }],
            "parameters": { "sampleCount": 1 }
        });

        let url = self.model_url(&self.settings.video_model, "predictLongRunning");
        let response = self.post_json(&url, &request_body).await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            if is_quota_error(status, &body) {
                return Err(VideoError::QuotaExceeded);
            }
            return Err(VideoError::ApiError(format!(
                "Failed to start the video generation process (HTTP {}): {}",
                status, body
            )));
        }

        let operation: Operation = response.json().await?;
        info!("Video operation started: {}", operation.name);
        Ok(operation)
    }

    pub async fn get_operation(&self, operation: &Operation) -> Result<Operation> {
        let url = format!("{}/{}", self.settings.base_url, operation.name);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .send()
            .await?;
        let response = ensure_success(response, "Operation status").await?;

        Ok(response.json().await?)
    }

    pub async fn download_video(&self, uri: &str) -> Result<Vec<u8>> {
        info!("Downloading video from: {}", uri);

        let response = self
            .client
            .get(uri)
            .query(&[("key", self.settings.api_key.as_str())])
            .send()
            .await?;
        let response = ensure_success(response, "Video download").await?;

        Ok(response.bytes().await?.to_vec())
    }
}

async fn read_error_body(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    if text.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...(truncated)", truncated)
    } else {
        text
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_error_body(response).await;
    Err(VideoError::ApiError(format!(
        "{} error (HTTP {}): {}",
        what, status, body
    )))
}

fn is_quota_error(status: StatusCode, body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("quota")
        || body.contains("resource_exhausted")
}

fn extract_text(reply: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = reply.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(VideoError::ApiError(format!("Prompt was blocked: {}", reason)));
    }

    let text: String = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(VideoError::ApiError(
            "Failed to extract generated text".to_string(),
        ));
    }
    Ok(text)
}

/// Models sometimes wrap JSON in a markdown fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idea::tests::{sample_idea, sample_script};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GeminiClient {
        let settings = Settings::new("test-key".to_string()).with_base_url(server.uri());
        GeminiClient::new(settings).unwrap()
    }

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
    }

    fn ideas_json() -> String {
        json!({
            "videoIdeas": [{
                "title": "Babies Read the News",
                "hook": "Breaking: this baby has opinions",
                "description": "Funny talking babies",
                "scriptOutline": ["Cold open", "The anchor baby", "Sign-off"],
                "targetAudience": "Parents",
                "thumbnailSuggestion": "Baby in a suit at a news desk"
            }]
        })
        .to_string()
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn quota_detection() {
        assert!(is_quota_error(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_quota_error(StatusCode::FORBIDDEN, "RESOURCE_EXHAUSTED"));
        assert!(is_quota_error(StatusCode::BAD_REQUEST, "Quota exceeded for project"));
        assert!(!is_quota_error(StatusCode::BAD_REQUEST, "invalid argument"));
    }

    #[test]
    fn operation_video_uri() {
        let done: Operation = serde_json::from_value(json!({
            "name": "models/veo/operations/abc",
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": "https://example.com/files/v:download?alt=media" } }
            ] } }
        }))
        .unwrap();
        assert!(done.done);
        assert_eq!(
            done.video_uri(),
            Some("https://example.com/files/v:download?alt=media")
        );

        let pending: Operation =
            serde_json::from_value(json!({ "name": "models/veo/operations/abc" })).unwrap();
        assert!(!pending.done);
        assert_eq!(pending.video_uri(), None);
    }

    #[tokio::test]
    async fn generate_ideas_parses_structured_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("Retro Gaming"))
            .and(body_string_contains("\"responseMimeType\":\"application/json\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(&ideas_json())))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ideas = client.generate_ideas("Retro Gaming").await.unwrap();

        assert_eq!(ideas.video_ideas.len(), 1);
        assert_eq!(ideas.video_ideas[0].title, "Babies Read the News");
        assert_eq!(ideas.video_ideas[0].script_outline.len(), 3);
    }

    #[tokio::test]
    async fn generate_ideas_accepts_fenced_reply() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", ideas_json());

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(&fenced)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let ideas = client.generate_ideas("anything").await.unwrap();
        assert_eq!(ideas.video_ideas[0].target_audience, "Parents");
    }

    #[tokio::test]
    async fn empty_topic_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_ideas("   ").await.unwrap_err();
        assert!(matches!(err, VideoError::EmptyTopic));
    }

    #[tokio::test]
    async fn http_error_becomes_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_ideas("topic").await.unwrap_err();
        match err {
            VideoError::ApiError(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("backend exploded"));
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_model_json_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("not json at all")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_ideas("topic").await.unwrap_err();
        assert!(matches!(err, VideoError::ApiError(_)));
    }

    #[tokio::test]
    async fn blocked_prompt_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_ideas("topic").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn generate_script_returns_single_scene() {
        let server = MockServer::start().await;
        let reply = json!({
            "title": "Babies Read the News",
            "script": [{ "scene": 1, "visualDescription": "A baby anchor", "voiceover": "Good evening." }]
        })
        .to_string();

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(body_string_contains("professional screenwriter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(&reply)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let script = client
            .generate_script(&sample_idea("Babies Read the News"))
            .await
            .unwrap();

        assert_eq!(script.script.len(), 1);
        assert_eq!(script.script[0].voiceover, "Good evening.");
    }

    #[tokio::test]
    async fn script_without_scenes_is_rejected() {
        let server = MockServer::start().await;
        let reply = json!({ "title": "T", "script": [] }).to_string();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(&reply)))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_script(&sample_idea("T")).await.unwrap_err();
        assert!(matches!(err, VideoError::SceneError(_)));
    }

    #[tokio::test]
    async fn generate_thumbnail_decodes_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/imagen-4.0-generate-001:predict"))
            .and(body_string_contains("\"aspectRatio\":\"16:9\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [{ "bytesBase64Encoded": "/9j/4A==", "mimeType": "image/jpeg" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let thumb = client.generate_thumbnail("A shocked cat").await.unwrap();

        assert_eq!(thumb.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(thumb.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn thumbnail_without_predictions_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "predictions": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.generate_thumbnail("anything").await.unwrap_err();
        assert!(matches!(err, VideoError::ApiError(_)));
    }

    #[tokio::test]
    async fn start_video_returns_operation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
            .and(body_string_contains("AI Director Final Execution Order"))
            .and(body_string_contains("Telugu"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "models/veo-2.0-generate-001/operations/op1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let op = client
            .start_video(&sample_idea("T"), &sample_script("T"), "Telugu", Avatar::Zen)
            .await
            .unwrap();

        assert_eq!(op.name, "models/veo-2.0-generate-001/operations/op1");
        assert!(!op.done);
    }

    #[tokio::test]
    async fn start_video_maps_quota_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .start_video(&sample_idea("T"), &sample_script("T"), "English", Avatar::VoiceOnly)
            .await
            .unwrap_err();

        assert!(matches!(err, VideoError::QuotaExceeded));
        assert!(err.to_string().starts_with("API Limit Reached"));
    }

    #[tokio::test]
    async fn get_operation_fetches_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models/veo/operations/op1"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "models/veo/operations/op1",
                "done": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let pending = Operation {
            name: "models/veo/operations/op1".to_string(),
            done: false,
            response: None,
            error: None,
        };
        let refreshed = client.get_operation(&pending).await.unwrap();
        assert!(refreshed.done);
    }

    #[tokio::test]
    async fn download_video_appends_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/files/vid:download"))
            .and(query_param("alt", "media"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4data".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let uri = format!("{}/files/vid:download?alt=media", server.uri());
        let bytes = client.download_video(&uri).await.unwrap();
        assert_eq!(bytes, b"mp4data");
    }
}
