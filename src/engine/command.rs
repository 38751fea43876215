//! Engine Command Table
//!
//! Every inbound operation is one tagged `Command` routed through a single
//! dispatch point. Each dispatch returns a serializable `EngineState` view;
//! failures become a notice on that view instead of tearing down the
//! session.

use crate::config::Settings;
use crate::core::classify;
use crate::core::diff::Diff;
use crate::core::message::{Message, Role};
use crate::engine::conversation::ConversationStore;
use crate::engine::review::{CandidateStatus, DocumentHost, ReviewCandidate, ReviewSession};
use crate::error::{Error, Result};
use crate::provider::{GenerateKind, Provider};
use crate::storage::HistoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Inbound UI command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// One chat turn through the conversation, optionally carrying code
    /// the user is asking about
    Send {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code_context: Option<String>,
    },
    /// Drop history, persisted state, and any pending proposal
    Clear,
    /// Generate code for review against the active document
    InsertCode { text: String },
    /// Generate Chart.js-compatible JSON and record it
    Plot { description: String },
    /// Apply the pending proposal to the document
    Accept,
    /// Drop the pending proposal
    Discard,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Send { .. } => "send",
            Command::Clear => "clear",
            Command::InsertCode { .. } => "insertCode",
            Command::Plot { .. } => "plot",
            Command::Accept => "accept",
            Command::Discard => "discard",
        }
    }
}

/// Candidate as shown to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    pub proposed_text: String,
    pub status: CandidateStatus,
    pub diff: Diff,
    pub added: usize,
    pub removed: usize,
}

impl From<&ReviewCandidate> for CandidateView {
    fn from(candidate: &ReviewCandidate) -> Self {
        Self {
            proposed_text: candidate.proposed_text.clone(),
            status: candidate.status,
            diff: candidate.diff.clone(),
            added: candidate.diff.added(),
            removed: candidate.diff.removed(),
        }
    }
}

/// Conversation and review state after a dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Owns the conversation, the review session, and the provider handle.
pub struct Engine {
    store: ConversationStore,
    review: Mutex<ReviewSession>,
    provider: Box<dyn Provider>,
    document: Arc<dyn DocumentHost>,
    settings: Settings,
}

impl Engine {
    pub async fn new(
        settings: Settings,
        provider: Box<dyn Provider>,
        document: Arc<dyn DocumentHost>,
        storage: Arc<dyn HistoryStore>,
    ) -> Self {
        let store =
            ConversationStore::new(settings.conversation.history_limit, storage).await;

        Self {
            store,
            review: Mutex::new(ReviewSession::new()),
            provider,
            document,
            settings,
        }
    }

    /// Run one command and return the resulting state view. Failures are
    /// reported through `notice`; no command crashes the session.
    pub async fn dispatch(&self, command: Command) -> EngineState {
        tracing::debug!("[Engine] Dispatching '{}'", command.name());

        let result = match command {
            Command::Send { text, code_context } => self.handle_send(text, code_context).await,
            Command::Clear => self.handle_clear().await,
            Command::InsertCode { text } => self.handle_insert_code(text).await,
            Command::Plot { description } => self.handle_plot(description).await,
            Command::Accept => self.handle_accept().await,
            Command::Discard => self.handle_discard().await,
        };

        match result {
            Ok(()) => self.state(None).await,
            Err(e) => {
                tracing::warn!("[Engine] Command failed: {}", e);
                self.state(Some(e.to_string())).await
            }
        }
    }

    /// Current state view without running a command.
    pub async fn current_state(&self) -> EngineState {
        self.state(None).await
    }

    async fn state(&self, notice: Option<String>) -> EngineState {
        let review = self.review.lock().await;
        EngineState {
            messages: self.store.messages().await,
            candidate: review.candidate().map(CandidateView::from),
            notice,
        }
    }

    async fn handle_send(&self, text: String, code_context: Option<String>) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "message text must not be empty".to_string(),
            ));
        }

        self.store
            .send_chat(
                self.provider.as_ref(),
                &self.document.language(),
                &text,
                code_context,
            )
            .await?;
        Ok(())
    }

    async fn handle_clear(&self) -> Result<()> {
        {
            let mut review = self.review.lock().await;
            if review.has_pending() {
                review.discard()?;
            }
        }
        self.store.clear().await
    }

    async fn handle_insert_code(&self, text: String) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "code request must not be empty".to_string(),
            ));
        }

        let _guard = self.store.begin_request()?;

        let original = self.document.content().await?;
        let prompt = self.build_code_prompt(&text, &original);

        let reply = self.provider.generate(&prompt, GenerateKind::Code).await?;
        let (_, proposed) = classify::extract_fenced(&reply);

        let mut review = self.review.lock().await;
        review.begin(original, proposed);
        Ok(())
    }

    async fn handle_plot(&self, description: String) -> Result<()> {
        if description.trim().is_empty() {
            return Err(Error::Validation(
                "plot description must not be empty".to_string(),
            ));
        }

        let _guard = self.store.begin_request()?;

        self.store
            .append(Message::new(Role::User, description.clone()))
            .await?;

        let payload = self.provider.generate_plot(&description).await?;

        self.store
            .append(Message::new(Role::Assistant, payload))
            .await?;
        Ok(())
    }

    async fn handle_accept(&self) -> Result<()> {
        let mut review = self.review.lock().await;
        review.accept(self.document.as_ref()).await?;
        Ok(())
    }

    async fn handle_discard(&self) -> Result<()> {
        let mut review = self.review.lock().await;
        review.discard()
    }

    fn build_code_prompt(&self, request: &str, original: &str) -> String {
        let mut prompt = format!(
            "Target language: {}.\nRequest: {}",
            self.document.language(),
            request
        );

        let context_lines = self.settings.conversation.context_lines;
        if context_lines > 0 && !original.is_empty() {
            let context: Vec<&str> = original.lines().take(context_lines).collect();
            prompt.push_str(&format!(
                "\n\nThe document currently begins with:\n```\n{}\n```",
                context.join("\n")
            ));
        }

        if !self.settings.testing.framework.is_empty() {
            prompt.push_str(&format!(
                "\nWhen tests are requested, use {}.",
                self.settings.testing.framework
            ));
        }

        prompt
    }
}
