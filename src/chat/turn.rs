//! Conversation turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// The person asking.
    User,
    /// Usha.
    Assistant,
}

impl ChatRole {
    /// Stable string form used by the HTTP API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Role name expected by the generative-language endpoint.
    #[must_use]
    pub const fn wire_role(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "model",
        }
    }

    /// Inverse of [`Self::wire_role`].
    #[must_use]
    pub fn from_wire_role(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Self::User),
            "model" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" | "model" => Ok(Self::Assistant),
            _ => Err(value.to_string()),
        }
    }
}

/// One immutable message in a conversation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author.
    pub role: ChatRole,
    /// Message body.
    pub text: String,
}

impl ChatTurn {
    /// Build a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// Build an assistant turn.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}
