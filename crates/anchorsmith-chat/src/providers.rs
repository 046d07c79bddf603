//! External LLM provider streaming.
//!
//! Each provider streams tokens via SSE. OpenAI and Groq share one format;
//! Anthropic uses its own event types.

use std::pin::Pin;

use anchorsmith_core::{Error, Result};
use futures::Stream;
use reqwest::Client;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, error, warn};

use crate::types::{ChatMessage, CompletionRequest, LLMProvider, ProviderTarget};

/// Boxed stream type for returning different stream implementations.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token or error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(String),
}

/// Stream a completion from the target's provider.
pub fn stream_llm(
    client: &Client,
    target: &ProviderTarget,
    messages: Vec<ChatMessage>,
    model: &str,
    temperature: f64,
    max_tokens: usize,
) -> BoxedStream {
    let call = ProviderCall {
        client: client.clone(),
        url: target.endpoint().to_string(),
        api_key: target.api_key.clone(),
        model: model.to_string(),
        temperature,
        max_tokens,
    };
    match target.provider {
        LLMProvider::OpenAI | LLMProvider::Groq => Box::pin(stream_openai_compat(call, messages)),
        LLMProvider::Anthropic => Box::pin(stream_anthropic(call, messages)),
    }
}

/// Run one request to completion, concatenating streamed tokens.
pub async fn collect_completion(
    client: &Client,
    target: &ProviderTarget,
    request: &CompletionRequest,
) -> Result<String> {
    let model = request.model.as_deref().unwrap_or(&target.model);
    let mut stream = stream_llm(
        client,
        target,
        vec![ChatMessage::user(request.prompt.clone())],
        model,
        request.temperature,
        request.max_tokens,
    );

    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            StreamChunk::Token(t) => text.push_str(&t),
            StreamChunk::Done { tokens_used } => {
                debug!("{} finished after {} chunks", target.provider, tokens_used);
                break;
            }
            StreamChunk::Error(e) => return Err(Error::Generation(e)),
        }
    }
    Ok(text)
}

struct ProviderCall {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: usize,
}

/// Split complete SSE lines off the front of `buffer`, returning `data:` payloads.
///
/// The buffer holds raw bytes; a line is decoded only once its `\n` has
/// arrived, so multi-byte characters split across network chunks survive.
fn drain_sse_data(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=line_end).collect();
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line.trim().to_string(),
            Err(e) => {
                warn!("Dropping SSE line with invalid UTF-8: {}", e);
                continue;
            }
        };

        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            payloads.push(data.trim().to_string());
        }
    }
    payloads
}

/// Stream from OpenAI-compatible APIs (OpenAI, Groq).
fn stream_openai_compat(
    call: ProviderCall,
    messages: Vec<ChatMessage>,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    let msgs: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    async_stream::stream! {
        let body = json!({
            "model": call.model,
            "messages": msgs,
            "temperature": call.temperature,
            "max_tokens": call.max_tokens,
            "stream": true,
        });

        debug!("Streaming from {} with model {}", call.url, call.model);

        let response = match call
            .client
            .post(&call.url)
            .header("Authorization", format!("Bearer {}", call.api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);

            for data in drain_sse_data(&mut buffer) {
                if data == "[DONE]" {
                    yield StreamChunk::Done { tokens_used: token_count };
                    return;
                }
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&data) {
                    if let Some(content) = parsed["choices"][0]["delta"]["content"].as_str() {
                        if !content.is_empty() {
                            token_count += 1;
                            yield StreamChunk::Token(content.to_string());
                        }
                    }
                }
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Stream from Anthropic's Messages API.
fn stream_anthropic(
    call: ProviderCall,
    messages: Vec<ChatMessage>,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    let system_msg: Option<String> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.clone());

    let conv_msgs: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    async_stream::stream! {
        let mut body = json!({
            "model": call.model,
            "messages": conv_msgs,
            "temperature": call.temperature,
            "max_tokens": call.max_tokens,
            "stream": true,
        });
        if let Some(sys) = system_msg {
            body["system"] = json!(sys);
        }

        debug!("Streaming from Anthropic with model {}", call.model);

        let response = match call
            .client
            .post(&call.url)
            .header("x-api-key", &call.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(format!("Request failed: {}", e));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            yield StreamChunk::Error(format!("API error {}: {}", status, body));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(format!("Stream read error: {}", e));
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);

            // "event:" lines are ignored; the data payload carries its own type
            for data in drain_sse_data(&mut buffer) {
                let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&data) else {
                    continue;
                };
                match parsed["type"].as_str() {
                    Some("content_block_delta") => {
                        if let Some(text) = parsed["delta"]["text"].as_str() {
                            if !text.is_empty() {
                                token_count += 1;
                                yield StreamChunk::Token(text.to_string());
                            }
                        }
                    }
                    Some("message_stop") => {
                        yield StreamChunk::Done { tokens_used: token_count };
                        return;
                    }
                    Some("error") => {
                        let msg = parsed["error"]["message"]
                            .as_str()
                            .unwrap_or("Unknown error");
                        error!("Anthropic error: {}", msg);
                        yield StreamChunk::Error(msg.to_string());
                        return;
                    }
                    _ => {}
                }
            }
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}
