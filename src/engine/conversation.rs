//! Conversation Store
//!
//! Information Hiding:
//! - Bounded history management internalized (append, trim, persist, restore)
//! - Single-in-flight discipline hidden behind an RAII guard
//! - Storage backend hidden behind the HistoryStore port

use crate::core::classify::{self, ContentKind};
use crate::core::message::{Message, Role};
use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::storage::HistoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed persistence key for the conversation history.
pub const HISTORY_KEY: &str = "conversation.history";

/// Releases the in-flight flag when dropped.
#[derive(Debug)]
pub struct RequestGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Bounded conversation history for one session.
pub struct ConversationStore {
    messages: RwLock<Vec<Message>>,
    cap: usize,
    storage: Arc<dyn HistoryStore>,
    in_flight: Arc<AtomicBool>,
}

impl ConversationStore {
    /// Build a store over `storage`, restoring any persisted history.
    /// A missing, unreadable, or malformed stored value restores as empty.
    pub async fn new(cap: usize, storage: Arc<dyn HistoryStore>) -> Self {
        let mut messages = Self::restore(storage.as_ref()).await;
        Self::trim_excess(&mut messages, cap);

        Self {
            messages: RwLock::new(messages),
            cap,
            storage,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn restore(storage: &dyn HistoryStore) -> Vec<Message> {
        match storage.get(HISTORY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Message>>(&raw) {
                Ok(messages) => {
                    tracing::debug!(
                        "[ConversationStore] Restored {} message(s)",
                        messages.len()
                    );
                    messages
                }
                Err(e) => {
                    tracing::warn!(
                        "[ConversationStore] Stored history is malformed, starting empty: {}",
                        e
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "[ConversationStore] Could not read stored history, starting empty: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    fn trim_excess(messages: &mut Vec<Message>, cap: usize) {
        if messages.len() > cap {
            let excess = messages.len() - cap;
            messages.drain(..excess);
            tracing::debug!("[ConversationStore] Trimmed {} oldest message(s)", excess);
        }
    }

    /// Append one message, trim to the cap, and persist. The message stays
    /// in memory even when the persist write fails.
    pub async fn append(&self, message: Message) -> Result<()> {
        {
            let mut messages = self.messages.write().await;
            messages.push(message);
            Self::trim_excess(&mut messages, self.cap);
        }
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let json = {
            let messages = self.messages.read().await;
            serde_json::to_string(&*messages)
                .map_err(|e| Error::Storage(format!("failed to serialize history: {e}")))?
        };
        self.storage.set(HISTORY_KEY, &json).await
    }

    /// Clone of the history with one synthesized leading system message
    /// naming the active document's language. Built per call, never stored.
    pub async fn snapshot(&self, document_language: &str) -> Vec<Message> {
        let messages = self.messages.read().await;
        let mut snapshot = Vec::with_capacity(messages.len() + 1);
        snapshot.push(Message::new(
            Role::System,
            format!(
                "The user is editing a {document_language} document. \
                 Answer with that language in mind."
            ),
        ));
        snapshot.extend(messages.iter().cloned());
        snapshot
    }

    /// Current history, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Empty the history and drop the persisted value.
    pub async fn clear(&self) -> Result<()> {
        self.messages.write().await.clear();
        self.storage.remove(HISTORY_KEY).await
    }

    /// Claim the session for one provider request. Fails with `Busy` while
    /// a previous claim is still alive; the returned guard releases it.
    pub fn begin_request(&self) -> Result<RequestGuard> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy);
        }

        Ok(RequestGuard {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// One chat turn: append the user message, send the snapshot, record the
    /// reply. Diagram replies are recorded as their extracted payload. On
    /// provider failure the user message stays in history and the error
    /// propagates unchanged.
    pub async fn send_chat(
        &self,
        provider: &dyn Provider,
        document_language: &str,
        text: &str,
        code_context: Option<String>,
    ) -> Result<String> {
        let _guard = self.begin_request()?;

        self.append(Message::with_context(Role::User, text, code_context))
            .await?;

        let outgoing = self.snapshot(document_language).await;
        let reply = provider.chat(&outgoing).await?;

        let classified = classify::classify(&reply);
        let recorded = match classified.kind {
            ContentKind::Diagram => classified.payload,
            _ => reply,
        };

        self.append(Message::new(Role::Assistant, recorded.clone()))
            .await?;

        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::GenerateKind;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct CannedProvider {
        reply: String,
    }

    #[async_trait]
    impl Provider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn chat(&self, _messages: &[Message]) -> Result<String> {
            Ok(self.reply.clone())
        }

        async fn generate(&self, _prompt: &str, _kind: GenerateKind) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn chat(&self, _messages: &[Message]) -> Result<String> {
            Err(Error::Provider("upstream unavailable".to_string()))
        }

        async fn generate(&self, _prompt: &str, _kind: GenerateKind) -> Result<String> {
            Err(Error::Provider("upstream unavailable".to_string()))
        }
    }

    async fn empty_store(cap: usize) -> ConversationStore {
        ConversationStore::new(cap, Arc::new(MemoryStore::new())).await
    }

    #[tokio::test]
    async fn test_append_trims_oldest_beyond_cap() {
        let store = empty_store(3).await;

        for i in 0..5 {
            store
                .append(Message::new(Role::User, format!("msg {i}")))
                .await
                .unwrap();
        }

        let messages = store.messages().await;
        assert_eq!(messages.len(), 3);
        // Survivors are the newest suffix, order preserved
        assert_eq!(messages[0].content, "msg 2");
        assert_eq!(messages[2].content, "msg 4");
    }

    #[tokio::test]
    async fn test_snapshot_leads_with_document_language() {
        let store = empty_store(10).await;
        store
            .append(Message::new(Role::User, "what is a slice?"))
            .await
            .unwrap();

        let snapshot = store.snapshot("rust").await;

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].role, Role::System);
        assert!(snapshot[0].content.contains("rust"));
        // The synthesized message never enters the stored history
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_history() {
        let storage: Arc<dyn HistoryStore> = Arc::new(MemoryStore::new());

        {
            let store = ConversationStore::new(10, Arc::clone(&storage)).await;
            store
                .append(Message::new(Role::User, "kept across sessions"))
                .await
                .unwrap();
        }

        let revived = ConversationStore::new(10, storage).await;
        let messages = revived.messages().await;

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "kept across sessions");
    }

    #[tokio::test]
    async fn test_malformed_persisted_state_restores_empty() {
        let storage: Arc<dyn HistoryStore> = Arc::new(MemoryStore::new());
        storage.set(HISTORY_KEY, "{not json at all").await.unwrap();

        let store = ConversationStore::new(10, storage).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_removes_persisted_value() {
        let storage: Arc<dyn HistoryStore> = Arc::new(MemoryStore::new());
        let store = ConversationStore::new(10, Arc::clone(&storage)).await;

        store
            .append(Message::new(Role::User, "to be forgotten"))
            .await
            .unwrap();
        assert!(storage.get(HISTORY_KEY).await.unwrap().is_some());

        store.clear().await.unwrap();

        assert!(store.is_empty().await);
        assert!(storage.get(HISTORY_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_request_is_rejected_while_first_is_live() {
        let store = empty_store(10).await;

        let guard = store.begin_request().unwrap();
        assert!(matches!(store.begin_request().unwrap_err(), Error::Busy));

        drop(guard);
        assert!(store.begin_request().is_ok());
    }

    #[tokio::test]
    async fn test_send_chat_records_both_sides() {
        let store = empty_store(10).await;
        let provider = CannedProvider {
            reply: "A slice borrows a contiguous range.".to_string(),
        };

        let reply = store
            .send_chat(&provider, "rust", "what is a slice?", None)
            .await
            .unwrap();

        assert_eq!(reply, "A slice borrows a contiguous range.");

        let messages = store.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_send_chat_keeps_user_message_on_provider_failure() {
        let store = empty_store(10).await;

        let err = store
            .send_chat(&FailingProvider, "rust", "hello?", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Provider(_)));

        let messages = store.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello?");

        // The failed request released the in-flight claim
        assert!(store.begin_request().is_ok());
    }

    #[tokio::test]
    async fn test_diagram_reply_recorded_as_extracted_payload() {
        let store = empty_store(10).await;
        let provider = CannedProvider {
            reply: "```mermaid\ngraph TD;A-->B\n```".to_string(),
        };

        let recorded = store
            .send_chat(&provider, "markdown", "draw it", None)
            .await
            .unwrap();

        assert_eq!(recorded, "graph TD;A-->B");
        assert_eq!(store.messages().await[1].content, "graph TD;A-->B");
    }
}
