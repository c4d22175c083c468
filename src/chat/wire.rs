//! JSON shapes of the generative-language `generateContent` call.

use serde::{Deserialize, Serialize};

use super::turn::{ChatRole, ChatTurn};

/// Sampling temperature.
pub const TEMPERATURE: f32 = 0.2;
/// Top-k sampling bound.
pub const TOP_K: u32 = 40;
/// Nucleus sampling bound.
pub const TOP_P: f32 = 0.95;
/// Reply length cap.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// A text fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Fragment text.
    pub text: String,
}

/// One message in `contents`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`.
    pub role: String,
    /// Message fragments.
    pub parts: Vec<Part>,
}

impl Content {
    /// Single-part `user` message.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User.wire_role().to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

impl From<&ChatTurn> for Content {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.wire_role().to_string(),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        }
    }
}

impl TryFrom<&Content> for ChatTurn {
    type Error = String;

    fn try_from(content: &Content) -> Result<Self, Self::Error> {
        let role = ChatRole::from_wire_role(&content.role)
            .ok_or_else(|| format!("unsupported role {}", content.role))?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        Ok(Self { role, text })
    }
}

/// Dedicated `systemInstruction` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SystemInstruction {
    /// Instruction fragments.
    pub parts: Vec<Part>,
}

/// Fixed generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Top-p.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Output cap.
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_k: Some(TOP_K),
            top_p: Some(TOP_P),
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// Request body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Ordered conversation.
    pub contents: Vec<Content>,
    /// System prompt, when sent as a dedicated field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    /// Generation parameters.
    pub generation_config: GenerationConfig,
}

/// Success body. Every level is optional so that shape drift surfaces as
/// `None` from [`GenerateContentResponse::first_text`] instead of a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, when present and non-empty.
    #[must_use]
    pub fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}
