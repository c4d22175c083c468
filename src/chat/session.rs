//! Conversation state for one chat session.
//!
//! The user's turn is appended before the upstream call starts; the reply (or
//! the fallback turn) is appended only when the call resolves. A single-slot
//! pending token ties each resolution to the request that produced it, so a
//! reply that arrives after the context changed is dropped instead of being
//! written into the new conversation.

use serde::Serialize;

use crate::catalog::ElementRecord;

use super::error::{ChatError, ChatResult, SessionError};
use super::prompt::ASSISTANT_NAME;
use super::turn::ChatTurn;

/// What the conversation is scoped to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "element", rename_all = "snake_case")]
pub enum ConversationContext {
    /// General chemistry chat.
    #[default]
    General,
    /// Chat about one element.
    Element(ElementRecord),
}

impl ConversationContext {
    /// Scope to an element when one was found, general otherwise.
    #[must_use]
    pub fn from_lookup(element: Option<&ElementRecord>) -> Self {
        element.map_or(Self::General, |e| Self::Element(e.clone()))
    }

    /// The element, if any.
    #[must_use]
    pub const fn element(&self) -> Option<&ElementRecord> {
        match self {
            Self::General => None,
            Self::Element(element) => Some(element),
        }
    }

    /// Opening assistant turn for this context.
    #[must_use]
    pub fn greeting(&self) -> ChatTurn {
        match self {
            Self::General => ChatTurn::assistant(format!(
                "Hello! I'm {ASSISTANT_NAME}. How can I assist you with your chemistry questions today?"
            )),
            Self::Element(element) => ChatTurn::assistant(format!(
                "Hello! I'm {ASSISTANT_NAME}. What would you like to know about {} ({})?",
                element.name, element.symbol
            )),
        }
    }
}

/// Everything needed to perform one upstream call outside the session lock.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    request_id: u64,
    /// New user text.
    pub text: String,
    /// Turns that preceded the new user turn.
    pub prior_turns: Vec<ChatTurn>,
    /// Context at the time of sending.
    pub context: Option<ElementRecord>,
}

impl PendingRequest {
    /// Identifier of the request within its session.
    #[must_use]
    pub const fn request_id(&self) -> u64 {
        self.request_id
    }
}

/// Append-only turns scoped to one context.
#[derive(Clone, Debug)]
pub struct ConversationState {
    context: ConversationContext,
    turns: Vec<ChatTurn>,
    pending: Option<u64>,
    next_request_id: u64,
}

impl ConversationState {
    /// Start a conversation seeded with the context's greeting.
    #[must_use]
    pub fn open(context: ConversationContext) -> Self {
        let turns = vec![context.greeting()];
        Self {
            context,
            turns,
            pending: None,
            next_request_id: 1,
        }
    }

    /// Clear the conversation and re-seed it for a new context. Any request in
    /// flight is orphaned.
    pub fn switch_context(&mut self, context: ConversationContext) {
        if let Some(request_id) = self.pending.take() {
            tracing::debug!(request_id, "Context switched with a request in flight");
        }
        self.turns.clear();
        self.turns.push(context.greeting());
        self.context = context;
    }

    /// Append the user turn and hand out the token for the upstream call.
    ///
    /// # Errors
    /// `EmptyMessage` for blank text, `RequestPending` while a reply is outstanding.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingRequest, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.pending.is_some() {
            return Err(SessionError::RequestPending);
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some(request_id);

        let prior_turns = self.turns.clone();
        self.turns.push(ChatTurn::user(text));

        Ok(PendingRequest {
            request_id,
            text: text.to_string(),
            prior_turns,
            context: self.context.element().cloned(),
        })
    }

    /// Apply the outcome of a request. Returns the appended assistant turn, or
    /// `None` when the token no longer matches and the outcome was discarded.
    pub fn complete(
        &mut self,
        request: &PendingRequest,
        outcome: ChatResult<String>,
    ) -> Option<ChatTurn> {
        if self.pending != Some(request.request_id) {
            tracing::info!(
                request_id = request.request_id,
                "Discarding reply for a superseded request"
            );
            return None;
        }
        self.pending = None;

        let turn = match outcome {
            Ok(text) => ChatTurn::assistant(text),
            Err(err) => {
                match &err {
                    ChatError::UpstreamUnavailable { status, .. } => {
                        tracing::warn!(?status, "Chat upstream unavailable: {err}");
                    }
                    ChatError::MalformedResponse(_) => {
                        tracing::warn!("Chat upstream replied with an unexpected shape: {err}");
                    }
                }
                ChatTurn::assistant(ChatError::USER_FALLBACK)
            }
        };

        self.turns.push(turn.clone());
        Some(turn)
    }

    /// Current context.
    #[must_use]
    pub const fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Turns in chronological order.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// True while a reply is outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ElementCatalog;
    use crate::chat::turn::ChatRole;

    fn element(name: &str) -> ConversationContext {
        let catalog = ElementCatalog::bundled().unwrap();
        ConversationContext::from_lookup(catalog.lookup_by_name(name))
    }

    #[test]
    fn opens_with_single_greeting() {
        let state = ConversationState::open(ConversationContext::General);
        assert_eq!(state.turns().len(), 1);
        assert_eq!(state.turns()[0].role, ChatRole::Assistant);
        assert!(state.turns()[0].text.starts_with("Hello! I'm Usha."));
        assert!(!state.is_pending());
    }

    #[test]
    fn missing_element_falls_back_to_general() {
        assert_eq!(element("Unobtainium"), ConversationContext::General);
    }

    #[test]
    fn switching_context_resets_to_element_greeting() {
        let mut state = ConversationState::open(element("Hydrogen"));
        let request = state.begin_send("Tell me more").unwrap();
        state.complete(&request, Ok("More.".to_string()));
        assert_eq!(state.turns().len(), 3);

        state.switch_context(element("Oxygen"));
        assert_eq!(state.turns().len(), 1);
        assert!(state.turns()[0].text.contains("Oxygen"));
        assert_eq!(state.context().element().unwrap().symbol, "O");
    }

    #[test]
    fn user_turn_is_appended_before_reply() {
        let mut state = ConversationState::open(ConversationContext::General);
        let request = state.begin_send("What is an isotope?").unwrap();

        assert_eq!(request.prior_turns.len(), 1);
        assert_eq!(state.turns().len(), 2);
        assert_eq!(state.turns()[1], ChatTurn::user("What is an isotope?"));
        assert!(state.is_pending());

        let reply = state.complete(&request, Ok("An isotope is...".to_string()));
        assert_eq!(reply, Some(ChatTurn::assistant("An isotope is...")));
        assert_eq!(state.turns().len(), 3);
        assert!(!state.is_pending());
    }

    #[test]
    fn second_send_is_rejected_while_pending() {
        let mut state = ConversationState::open(ConversationContext::General);
        let _first = state.begin_send("one").unwrap();
        assert_eq!(state.begin_send("two").unwrap_err(), SessionError::RequestPending);
        assert_eq!(state.begin_send("   ").unwrap_err(), SessionError::EmptyMessage);
    }

    #[test]
    fn failure_appends_fallback_turn() {
        let mut state = ConversationState::open(ConversationContext::General);
        let request = state.begin_send("hi").unwrap();
        let turn = state
            .complete(
                &request,
                Err(ChatError::MalformedResponse("no candidates".to_string())),
            )
            .unwrap();
        assert_eq!(turn.text, ChatError::USER_FALLBACK);

        // The conversation stays usable.
        assert!(state.begin_send("again").is_ok());
    }

    #[test]
    fn reply_after_context_switch_is_discarded() {
        let mut state = ConversationState::open(element("Helium"));
        let request = state.begin_send("Why is it inert?").unwrap();

        state.switch_context(element("Neon"));
        assert_eq!(state.complete(&request, Ok("stale".to_string())), None);
        assert_eq!(state.turns().len(), 1);
        assert!(state.turns()[0].text.contains("Neon"));

        let fresh = state.begin_send("And neon?").unwrap();
        assert_ne!(fresh.request_id(), request.request_id());
        assert!(state.complete(&fresh, Ok("Also inert.".to_string())).is_some());
    }
}
