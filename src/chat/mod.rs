//! Usha chat: prompt construction, the upstream client and conversation state.

pub mod client;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod turn;
pub mod wire;

pub use client::{ChatService, GeminiClient};
pub use error::{ChatError, ChatResult, SessionError};
pub use prompt::{ASSISTANT_NAME, build_system_prompt};
pub use registry::{SessionId, SessionRegistry, SessionSnapshot};
pub use session::{ConversationContext, ConversationState, PendingRequest};
pub use turn::{ChatRole, ChatTurn};
