//! Conversation types for OpenAI-compatible chat completion APIs.

use serde::{Deserialize, Serialize};

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token usage information from an API response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    /// Accumulate usage from another response.
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// A request to a chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub max_tokens: u32,
}

/// The message carried by a completion choice.
///
/// `content` is nullable on the wire (e.g. refusals or tool calls).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

/// One candidate reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A response from a chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Build a response with a single assistant choice.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage {
                    role: Role::Assistant,
                    content: Some(text.into()),
                },
                finish_reason: Some("stop".into()),
            }],
            usage: None,
        }
    }

    /// Text of the best (first) choice, if it carries any content.
    pub fn best_reply(&self) -> Option<&str> {
        self.choices
            .iter()
            .min_by_key(|c| c.index)
            .and_then(|c| c.message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::system("be nice")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be nice"}"#);
    }

    #[test]
    fn request_serializes_openai_shape() {
        let req = CompletionRequest {
            model: "m".into(),
            messages: vec![Turn::user("hi")],
            max_tokens: 400,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 400);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn response_parses_and_picks_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "qwen",
            "choices": [
                {"index": 1, "message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"},
                {"index": 0, "message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        }"#;
        let resp: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.best_reply(), Some("first"));
        assert_eq!(resp.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn null_content_has_no_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let resp: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.best_reply(), None);
    }

    #[test]
    fn empty_choices_has_no_reply() {
        let resp: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(resp.best_reply(), None);
    }

    #[test]
    fn usage_add() {
        let mut total = Usage::default();
        total.add(&Usage {
            prompt_tokens: 3,
            completion_tokens: 4,
            total_tokens: 7,
        });
        total.add(&Usage {
            prompt_tokens: 1,
            completion_tokens: 1,
            total_tokens: 2,
        });
        assert_eq!(total.total_tokens, 9);
        assert_eq!(total.prompt_tokens, 4);
    }
}
