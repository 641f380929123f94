//! Inference-backed selector.
//!
//! Sends the timestamped transcript and the user query to an
//! OpenAI-compatible chat-completions endpoint and parses the returned
//! conversation list. The service is an untrusted, best-effort oracle:
//! responses are parsed defensively and bounds-checked by the caller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clipsift_models::{parse_timestamp, render_transcript, SelectionCandidate, TranscriptSegment};

use crate::error::{SelectError, SelectResult};
use crate::Selector;

/// Default chat-completions endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

/// Request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat-completions client for segment selection.
pub struct InferenceSelector {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    model: String,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Expected payload inside the model's reply.
#[derive(Debug, Deserialize)]
struct ConversationsPayload {
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    start: TimeValue,
    end: TimeValue,
    #[serde(default)]
    reason: Option<String>,
}

/// The service replies with seconds as numbers or clock strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeValue {
    Seconds(f64),
    Clock(String),
}

impl TimeValue {
    fn as_seconds(&self) -> Option<f64> {
        match self {
            TimeValue::Seconds(s) => Some(*s),
            TimeValue::Clock(raw) => parse_timestamp(raw).ok(),
        }
    }
}

impl InferenceSelector {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build the editing prompt for a transcript and query.
    fn build_prompt(&self, transcript: &[TranscriptSegment], query: &str) -> String {
        format!(
            r#"You are an expert video editor who can read video transcripts and perform video editing. Given a transcript with segments, your task is to identify all the conversations related to a user query. Follow these guidelines when choosing conversations. A group of continuous segments in the transcript is a conversation.

Guidelines:
1. The conversation should be relevant to the user query. The conversation should include more than one segment to provide context and continuity.
2. Include all the before and after segments needed in a conversation to make it complete.
3. The conversation should not cut off in the middle of a sentence or idea.
4. Choose multiple conversations from the transcript that are relevant to the user query.
5. Match the start and end time of the conversations using the segment timestamps from the transcript.
6. The conversations should be a direct part of the video and should not be out of context.

Output format: {{ "conversations": [{{"start": "s1", "end": "e1", "reason": "r1"}}, {{"start": "s2", "end": "e2", "reason": "r2"}}] }}
Return ONLY that JSON object. Timestamps may be seconds or HH:MM:SS.

Transcript:
{transcript}

User query:
{query}"#,
            transcript = render_transcript(transcript),
            query = query,
        )
    }

    async fn call_service(&self, prompt: String) -> SelectResult<String> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: prompt,
            }],
            model: self.model.clone(),
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            stream: false,
        };

        let response = self
            .client
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SelectError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SelectError::malformed(format!("not a chat completion: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SelectError::malformed("response contained no choices"))
    }
}

#[async_trait::async_trait]
impl Selector for InferenceSelector {
    fn name(&self) -> &'static str {
        "inference"
    }

    async fn select(
        &self,
        transcript: &[TranscriptSegment],
        query: &str,
    ) -> SelectResult<Vec<SelectionCandidate>> {
        info!(model = %self.model, "Requesting segment selection from inference service");

        let prompt = self.build_prompt(transcript, query);
        let content = self.call_service(prompt).await?;
        let candidates = parse_conversations(&content)?;

        debug!(candidates = candidates.len(), "Inference service proposed ranges");
        Ok(candidates)
    }
}

/// Parse the model's reply into candidates, tolerating markdown fences
/// and per-tuple garbage (a tuple with unparseable times is skipped).
fn parse_conversations(content: &str) -> SelectResult<Vec<SelectionCandidate>> {
    let text = strip_code_fences(content);

    let payload: ConversationsPayload = serde_json::from_str(text)
        .map_err(|e| SelectError::malformed(format!("conversations JSON: {}", e)))?;

    Ok(payload
        .conversations
        .into_iter()
        .filter_map(|c| {
            let start = c.start.as_seconds()?;
            let end = c.end.as_seconds()?;
            Some(SelectionCandidate::new(
                start,
                end,
                c.reason.unwrap_or_default(),
            ))
        })
        .collect())
}

/// Strip a surrounding ```json ... ``` fence if present.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}
