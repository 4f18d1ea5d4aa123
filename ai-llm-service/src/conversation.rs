//! Chat history in, generated text out.
//!
//! [`Conversation`] is the ordered list of turns sent to a model; it serializes
//! directly as the `messages` array of the chat-completions protocol.
//! [`CompletionResult`] is what every backend hands back, success or not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved model id marking a failed completion.
///
/// No real model is called `error`, so downstream formatting can tell a usable
/// answer from an error message without any `Result` plumbing.
pub const ERROR_MODEL: &str = "error";

/// Placeholder content when the upstream answered without any text.
pub const NO_RESPONSE: &str = "No response generated";

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered, immutable chat history for a single request.
///
/// ```
/// use ai_llm_service::conversation::{Conversation, Role};
///
/// let conv = Conversation::new()
///     .system("You are a reviewer.")
///     .user("Review this diff.");
/// assert_eq!(conv.turns()[0].role, Role::System);
/// assert_eq!(conv.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn and returns the extended conversation.
    pub fn push(mut self, role: Role, content: impl Into<String>) -> Self {
        self.turns.push(Turn {
            role,
            content: content.into(),
        });
        self
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.push(Role::System, content)
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.push(Role::User, content)
    }

    pub fn assistant(self, content: impl Into<String>) -> Self {
        self.push(Role::Assistant, content)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Single prompt block: `"role: content"` per turn, separated by blank lines.
    pub fn flatten(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Outcome of one completion call.
///
/// `content` is always present. On failure it carries a human-readable,
/// backend-labelled error and `model` equals [`ERROR_MODEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    pub content: String,
    pub model: String,
}

impl CompletionResult {
    pub fn success(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: ERROR_MODEL.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.model == ERROR_MODEL
    }
}
