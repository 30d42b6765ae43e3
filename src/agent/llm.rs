//! Gateway to the model backend.
//!
//! Pipeline stages talk to the model through [`LlmClient`]. The production
//! implementation calls Ollama's non-streaming chat endpoint.

use crate::agent::PipelineError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A single-turn chat completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system and a user prompt, return the model's reply text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PipelineError>;

    /// Name of the model answering the requests.
    fn model_name(&self) -> &str;
}

/// Configuration for the Ollama client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Show a spinner while waiting for a reply.
    pub show_progress: bool,
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client for Ollama's `/api/chat` endpoint.
pub struct OllamaClient {
    config: LlmConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        }
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("   {spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Waiting for {}...", self.config.model_name));
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }

    async fn send(&self, request: &OllamaChatRequest) -> Result<String, PipelineError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        debug!(
            "Sending chat request to {} ({} prompt bytes)",
            url,
            request.messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout {
                        seconds: self.config.timeout_seconds,
                    }
                } else if e.is_connect() {
                    PipelineError::Connection {
                        url: self.config.ollama_url.clone(),
                    }
                } else {
                    PipelineError::InvalidResponse(format!("Failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Backend { status, body });
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout {
                    seconds: self.config.timeout_seconds,
                }
            } else {
                PipelineError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
            }
        })?;

        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PipelineError> {
        let request = self.build_request(system_prompt, user_prompt);

        let spinner = self.spinner();
        let result = self.send(&request).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        result
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.1,
            timeout_seconds: 600,
            show_progress: false,
        }
    }

    #[test]
    fn test_request_shape() {
        let client = OllamaClient::new(test_config()).unwrap();
        let request = client.build_request("be a lawyer", "contract text");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be a lawyer");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "contract text");
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"model": "llama3.2", "message": {"role": "assistant", "content": "[]"}, "done": true}"#;
        let response: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.message.content, "[]");
    }
}
