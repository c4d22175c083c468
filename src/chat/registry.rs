//! Live chat sessions keyed by identifier.
//!
//! Entries are locked only for the synchronous part of a send. The upstream
//! call itself runs without any lock held; its outcome is applied afterwards
//! through the pending token, so a session that was switched or closed in the
//! meantime simply drops the reply.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::ChatService;
use super::error::SessionError;
use super::session::{ConversationContext, ConversationState};
use super::turn::ChatTurn;

#[inline]
#[must_use]
fn uuid_time_ordered() -> Uuid {
    #[cfg(feature = "uuid_v7")]
    {
        Uuid::now_v7()
    }
    #[cfg(not(feature = "uuid_v7"))]
    {
        Uuid::new_v4()
    }
}

/// Identifier for a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionId {
    /// Create a new identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid_time_ordered())
    }

    /// Borrow the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

struct Session {
    state: ConversationState,
    opened_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    fn snapshot(&self, id: SessionId) -> SessionSnapshot {
        SessionSnapshot {
            id,
            context: self.state.context().clone(),
            turns: self.state.turns().to_vec(),
            pending: self.state.is_pending(),
            opened_at: self.opened_at,
            last_active: self.last_active,
        }
    }
}

/// Read-only copy of a session.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: SessionId,
    /// Current context.
    pub context: ConversationContext,
    /// Turns in chronological order.
    pub turns: Vec<ChatTurn>,
    /// True while a reply is outstanding.
    pub pending: bool,
    /// Creation time.
    pub opened_at: DateTime<Utc>,
    /// Last time the session was touched.
    pub last_active: DateTime<Utc>,
}

/// Concurrent session store with a capacity bound.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    max_sessions: usize,
}

impl SessionRegistry {
    /// Create an empty registry holding at most `max_sessions` sessions.
    #[must_use]
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Open a session for `context`, evicting the least recently used one
    /// when full.
    pub fn open(&self, context: ConversationContext) -> SessionSnapshot {
        while self.sessions.len() >= self.max_sessions {
            if !self.evict_oldest() {
                break;
            }
        }

        let id = SessionId::new();
        let now = Utc::now();
        let session = Session {
            state: ConversationState::open(context),
            opened_at: now,
            last_active: now,
        };
        let snapshot = session.snapshot(id);
        self.sessions.insert(id, session);

        tracing::debug!(session = %id, live = self.sessions.len(), "Chat session opened");
        snapshot
    }

    /// Copy of a session.
    ///
    /// # Errors
    /// `UnknownSession` when the id is not live.
    pub fn get(&self, id: SessionId) -> Result<SessionSnapshot, SessionError> {
        self.sessions
            .get(&id)
            .map(|s| s.snapshot(id))
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Reset a session to a new context.
    ///
    /// # Errors
    /// `UnknownSession` when the id is not live.
    pub fn switch_context(
        &self,
        id: SessionId,
        context: ConversationContext,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        session.state.switch_context(context);
        session.last_active = Utc::now();
        Ok(session.snapshot(id))
    }

    /// Send a user message through `chat` and record the outcome.
    ///
    /// Upstream failures are not errors here: they produce the fallback
    /// assistant turn.
    ///
    /// # Errors
    /// `UnknownSession`, `EmptyMessage` or `RequestPending` before sending;
    /// `UnknownSession` or `Superseded` when the session was closed or
    /// switched while the call was in flight.
    pub async fn send(
        &self,
        id: SessionId,
        text: &str,
        chat: &dyn ChatService,
    ) -> Result<ChatTurn, SessionError> {
        let request = {
            let mut session = self
                .sessions
                .get_mut(&id)
                .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
            session.last_active = Utc::now();
            session.state.begin_send(text)?
        };

        let outcome = chat
            .send_message(&request.text, &request.prior_turns, request.context.as_ref())
            .await;

        let Some(mut session) = self.sessions.get_mut(&id) else {
            tracing::info!(session = %id, "Session closed before the reply arrived");
            return Err(SessionError::UnknownSession(id.to_string()));
        };
        session.last_active = Utc::now();
        session
            .state
            .complete(&request, outcome)
            .ok_or(SessionError::Superseded)
    }

    /// Drop a session. Returns whether it existed.
    pub fn close(&self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "Chat session closed");
        }
        removed
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_active)
            .map(|entry| *entry.key());

        match oldest {
            Some(id) => {
                self.sessions.remove(&id);
                tracing::info!(session = %id, "Evicted least recently used chat session");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::catalog::{ElementCatalog, ElementRecord};
    use crate::chat::error::{ChatError, ChatResult};

    struct Echo;

    #[async_trait]
    impl ChatService for Echo {
        async fn send_message(
            &self,
            text: &str,
            prior_turns: &[ChatTurn],
            context: Option<&ElementRecord>,
        ) -> ChatResult<String> {
            let about = context.map_or("chemistry", |e| e.name.as_str());
            Ok(format!("{about}: {text} ({} prior)", prior_turns.len()))
        }
    }

    struct Down;

    #[async_trait]
    impl ChatService for Down {
        async fn send_message(
            &self,
            _text: &str,
            _prior_turns: &[ChatTurn],
            _context: Option<&ElementRecord>,
        ) -> ChatResult<String> {
            Err(ChatError::UpstreamUnavailable {
                status: Some(503),
                message: "unavailable".to_string(),
            })
        }
    }

    /// Waits until released, so tests can act while a send is in flight.
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatService for Gate {
        async fn send_message(
            &self,
            _text: &str,
            _prior_turns: &[ChatTurn],
            _context: Option<&ElementRecord>,
        ) -> ChatResult<String> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("late".to_string())
        }
    }

    fn element(name: &str) -> ConversationContext {
        let catalog = ElementCatalog::bundled().unwrap();
        ConversationContext::from_lookup(catalog.lookup_by_name(name))
    }

    #[tokio::test]
    async fn send_appends_user_and_reply() {
        let registry = SessionRegistry::new(8);
        let opened = registry.open(element("Carbon"));

        let reply = registry.send(opened.id, "Allotropes?", &Echo).await.unwrap();
        assert_eq!(reply.text, "Carbon: Allotropes? (1 prior)");

        let snapshot = registry.get(opened.id).unwrap();
        assert_eq!(snapshot.turns.len(), 3);
        assert!(!snapshot.pending);
    }

    #[tokio::test]
    async fn upstream_failure_becomes_fallback_turn() {
        let registry = SessionRegistry::new(8);
        let opened = registry.open(ConversationContext::General);

        let reply = registry.send(opened.id, "hi", &Down).await.unwrap();
        assert_eq!(reply.text, ChatError::USER_FALLBACK);
        assert_eq!(registry.get(opened.id).unwrap().turns.len(), 3);
    }

    #[tokio::test]
    async fn switch_during_flight_discards_reply() {
        let registry = Arc::new(SessionRegistry::new(8));
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let opened = registry.open(element("Sodium"));

        let task = {
            let registry = Arc::clone(&registry);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { registry.send(opened.id, "Reactivity?", &*gate).await })
        };

        gate.entered.notified().await;
        assert_eq!(
            registry.send(opened.id, "again", &Echo).await.unwrap_err(),
            SessionError::RequestPending
        );
        registry.switch_context(opened.id, element("Potassium")).unwrap();
        gate.release.notify_one();

        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.unwrap_err(), SessionError::Superseded);

        let snapshot = registry.get(opened.id).unwrap();
        assert_eq!(snapshot.turns.len(), 1);
        assert!(snapshot.turns[0].text.contains("Potassium"));
    }

    #[tokio::test]
    async fn closed_session_drops_reply() {
        let registry = Arc::new(SessionRegistry::new(8));
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let opened = registry.open(ConversationContext::General);

        let task = {
            let registry = Arc::clone(&registry);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { registry.send(opened.id, "hello", &*gate).await })
        };

        gate.entered.notified().await;
        assert!(registry.close(opened.id));
        gate.release.notify_one();

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, Err(SessionError::UnknownSession(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn evicts_least_recently_active_when_full() {
        let registry = SessionRegistry::new(2);
        let first = registry.open(ConversationContext::General);
        std::thread::sleep(Duration::from_millis(5));
        let second = registry.open(ConversationContext::General);
        std::thread::sleep(Duration::from_millis(5));
        registry
            .switch_context(first.id, ConversationContext::General)
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let third = registry.open(ConversationContext::General);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(first.id).is_ok());
        assert!(registry.get(third.id).is_ok());
        assert!(matches!(
            registry.get(second.id),
            Err(SessionError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let registry = SessionRegistry::new(8);
        let first = registry.open(element("Iron"));
        let second = registry.open(element("Iron"));
        assert_ne!(first.id, second.id);

        registry.send(first.id, "Rust?", &Echo).await.unwrap();
        registry
            .switch_context(first.id, element("Copper"))
            .unwrap();

        let untouched = registry.get(second.id).unwrap();
        assert_eq!(untouched.turns.len(), 1);
        assert!(untouched.turns[0].text.contains("Iron"));
        assert_eq!(untouched.context.element().unwrap().symbol, "Fe");
    }

    #[test]
    fn unknown_ids_are_reported() {
        let registry = SessionRegistry::new(1);
        let id = SessionId::new();
        assert!(registry.get(id).is_err());
        assert!(!registry.close(id));
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
    }
}
