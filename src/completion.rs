//! Chat completion client
//!
//! Sends the captured question to the OpenAI chat completions API and
//! validates the reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::{Error, Result};

/// Fixed system instruction for every request
const SYSTEM_PROMPT: &str = "You are a helpful voice assistant that gives concise answers.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Capability: generate a reply to the user's question
#[async_trait]
pub trait Complete {
    /// Generate a reply for the question.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrompt`] for a blank question,
    /// [`Error::Http`] for transport failures, [`Error::Completion`] for
    /// service errors, and [`Error::InvalidResponse`] when the service
    /// answers without a usable reply.
    async fn complete(&self, question: &str) -> Result<String>;
}

/// Chat completion client for the OpenAI API
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    /// Create a completion client from the assistant configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &AssistantConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl Complete for CompletionClient {
    async fn complete(&self, question: &str) -> Result<String> {
        let request = build_request(
            &self.model,
            self.temperature,
            self.max_tokens,
            question,
        )?;

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "chat completions error {status}: {body}"
            )));
        }

        let completion: ChatResponse = response.json().await?;
        validate_reply(completion)
    }
}

/// Build the two-message request: fixed system instruction, then the
/// user's question verbatim.
fn build_request<'a>(
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    question: &'a str,
) -> Result<ChatRequest<'a>> {
    if question.trim().is_empty() {
        return Err(Error::InvalidPrompt);
    }

    Ok(ChatRequest {
        model,
        temperature,
        max_tokens,
        messages: vec![
            Message {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            Message {
                role: "user",
                content: question,
            },
        ],
    })
}

/// Extract the reply text, rejecting responses with no choices or empty
/// content as invalid (distinct from transport failures).
fn validate_reply(completion: ChatResponse) -> Result<String> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidResponse("response did not contain any choices".to_string()))?;

    match choice.message.content {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(Error::InvalidResponse(
            "response contained an empty reply".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = build_request("gpt-4o", 0.9, 500, "Test prompt").unwrap();

        assert_eq!(request.model, "gpt-4o");
        assert!((request.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "Test prompt");
    }

    #[test]
    fn test_question_passed_verbatim() {
        // The question is not trimmed before being sent
        let request = build_request("gpt-3.5-turbo", 0.7, 400, "  2 + 2?  ").unwrap();
        assert_eq!(request.messages[1].content, "  2 + 2?  ");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert!(matches!(
            build_request("gpt-3.5-turbo", 0.7, 400, ""),
            Err(Error::InvalidPrompt)
        ));
        assert!(matches!(
            build_request("gpt-3.5-turbo", 0.7, 400, "   "),
            Err(Error::InvalidPrompt)
        ));
    }

    #[test]
    fn test_request_serialization() {
        let request = build_request("gpt-3.5-turbo", 0.7, 400, "hi").unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 400);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_no_choices_is_invalid_response() {
        let completion = ChatResponse { choices: vec![] };
        let err = validate_reply(completion).unwrap_err();

        assert!(matches!(err, Error::InvalidResponse(_)));
        assert!(err.to_string().contains("choices"));
    }

    #[test]
    fn test_empty_content_is_invalid_response() {
        let completion = ChatResponse {
            choices: vec![Choice {
                message: ChoiceMessage { content: None },
            }],
        };
        assert!(matches!(
            validate_reply(completion),
            Err(Error::InvalidResponse(_))
        ));

        let completion = ChatResponse {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some(String::new()),
                },
            }],
        };
        assert!(matches!(
            validate_reply(completion),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_valid_reply_extracted() {
        let completion = ChatResponse {
            choices: vec![Choice {
                message: ChoiceMessage {
                    content: Some("Four.".to_string()),
                },
            }],
        };
        assert_eq!(validate_reply(completion).unwrap(), "Four.");
    }
}
