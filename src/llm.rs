use crate::config::Config;
use anyhow::Result;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Events emitted during a streaming completion exchange
#[derive(Debug, Clone)]
pub enum LlmEvent {
    /// Text delta from the streaming response
    TextDelta(String),
    /// Full accumulated response text
    ResponseComplete(String),
    /// Stream finished cleanly
    StreamComplete,
    /// Error occurred; terminates the stream
    Error(String),
}

/// Role-tagged entry in a completion request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request sent to the completion endpoint
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// Client for an OpenAI-compatible streaming chat-completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    config: Config,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Open a token stream for the given request. Errors after this call
    /// arrive as `LlmEvent::Error` on the returned channel.
    pub async fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<mpsc::Receiver<LlmEvent>> {
        let (tx, rx) = mpsc::channel(1000);

        // A missing key is a stream error, not a setup failure.
        let Some(api_key) = self.config.get_api_key() else {
            let _ = tx
                .send(LlmEvent::Error(
                    "No API key configured. Run `chirp set-key` or set OPENAI_API_KEY.".to_string(),
                ))
                .await;
            return Ok(rx);
        };

        let client = self.client.clone();
        let base_url = self.config.base_url.clone();
        let model = self.config.model.clone();

        let tx_clone = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::stream_chat(client, base_url, model, api_key, request, tx).await {
                let _ = tx_clone.send(LlmEvent::Error(e.to_string())).await;
            }
        });

        Ok(rx)
    }

    async fn stream_chat(
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: String,
        request: CompletionRequest,
        tx: mpsc::Sender<LlmEvent>,
    ) -> Result<()> {
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

        let payload = serde_json::json!({
            "model": model,
            "messages": request.messages,
            "stream": true,
            "temperature": request.temperature.unwrap_or(0.7),
            "max_tokens": request.max_tokens.unwrap_or(1000)
        });

        let response = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Completion API error: {}", error_text));
        }

        Self::process_sse_stream(response, tx).await
    }

    /// Process the Server-Sent Events stream of the completions endpoint
    async fn process_sse_stream(
        response: reqwest::Response,
        tx: mpsc::Sender<LlmEvent>,
    ) -> Result<()> {
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut assistant_text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let text = String::from_utf8_lossy(&chunk);
            buffer.push_str(&text);

            // Process complete lines
            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].trim().to_string();
                buffer = buffer[newline_pos + 1..].to_string();

                match parse_sse_line(&line) {
                    SseLine::Delta(content) => {
                        assistant_text.push_str(&content);
                        let _ = tx.send(LlmEvent::TextDelta(content)).await;
                    }
                    SseLine::Finished => {
                        if !assistant_text.is_empty() {
                            let _ = tx
                                .send(LlmEvent::ResponseComplete(assistant_text.clone()))
                                .await;
                        }
                    }
                    SseLine::Done => {
                        if !assistant_text.is_empty() {
                            let _ = tx.send(LlmEvent::ResponseComplete(assistant_text)).await;
                        }
                        let _ = tx.send(LlmEvent::StreamComplete).await;
                        return Ok(());
                    }
                    SseLine::Ignore => {}
                }
            }
        }

        // Flush any remaining buffer line (without newline)
        if let SseLine::Delta(content) = parse_sse_line(buffer.trim()) {
            assistant_text.push_str(&content);
            let _ = tx.send(LlmEvent::TextDelta(content)).await;
        }

        if !assistant_text.is_empty() {
            let _ = tx.send(LlmEvent::ResponseComplete(assistant_text)).await;
        }
        let _ = tx.send(LlmEvent::StreamComplete).await;
        Ok(())
    }
}

/// One parsed line of the SSE stream
#[derive(Debug, Clone, PartialEq)]
enum SseLine {
    /// Non-empty text delta
    Delta(String),
    /// finish_reason = "stop"
    Finished,
    /// [DONE] sentinel
    Done,
    /// Comment, keep-alive, empty delta, or unparseable line
    Ignore,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data: ") else {
        return SseLine::Ignore;
    };
    if data == "[DONE]" {
        return SseLine::Done;
    }

    let Ok(chunk) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseLine::Ignore;
    };
    let Some(choice) = chunk.get("choices").and_then(|c| c.get(0)) else {
        return SseLine::Ignore;
    };

    if let Some(content) = choice
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
    {
        if !content.is_empty() {
            return SseLine::Delta(content.to_string());
        }
    }

    if choice.get("finish_reason").and_then(|v| v.as_str()) == Some("stop") {
        return SseLine::Finished;
    }

    SseLine::Ignore
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Delta("Hel".to_string()));
    }

    #[test]
    fn done_sentinel_terminates() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
    }

    #[test]
    fn finish_reason_stop_is_reported() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Finished);
    }

    #[test]
    fn empty_delta_and_noise_are_ignored() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#),
            SseLine::Ignore
        );
        assert_eq!(parse_sse_line(""), SseLine::Ignore);
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Ignore);
        assert_eq!(parse_sse_line("data: not json"), SseLine::Ignore);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Ignore
        );
    }
}
