//! Review Session
//!
//! Generated code never reaches a document directly. It becomes a pending
//! candidate with a precomputed diff; only an explicit accept hands the
//! proposed text to the document boundary. `Applied` and `Discarded` are
//! terminal, and the session holds at most one candidate at a time.

use crate::core::diff::Diff;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Host-document boundary: language, contents, and the single mutation.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Language of the active document, e.g. "rust".
    fn language(&self) -> String;

    /// Full current text of the active document.
    async fn content(&self) -> Result<String>;

    /// Replace the document text in one atomic step.
    async fn apply(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Accepted,
    Discarded,
    Applied,
}

/// A proposed edit awaiting a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCandidate {
    pub original_text: String,
    pub proposed_text: String,
    pub diff: Diff,
    pub status: CandidateStatus,
}

/// Holds the one candidate under review, if any.
pub struct ReviewSession {
    candidate: Option<ReviewCandidate>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self { candidate: None }
    }

    pub fn candidate(&self) -> Option<&ReviewCandidate> {
        self.candidate.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.candidate
            .as_ref()
            .is_some_and(|c| c.status == CandidateStatus::Pending)
    }

    /// Install a fresh pending candidate, replacing any previous one.
    /// Review is modal; there is no queue.
    pub fn begin(&mut self, original_text: String, proposed_text: String) -> &ReviewCandidate {
        if self.has_pending() {
            tracing::debug!("[ReviewSession] Replacing pending candidate");
        }

        let diff = Diff::compute(&original_text, &proposed_text);
        tracing::info!(
            "[ReviewSession] New proposal (+{} -{})",
            diff.added(),
            diff.removed()
        );

        self.candidate.insert(ReviewCandidate {
            original_text,
            proposed_text,
            diff,
            status: CandidateStatus::Pending,
        })
    }

    /// Accept the pending candidate: hand its proposed text to the document
    /// boundary, then drop it. A document failure is reported, not retried,
    /// and the candidate is dropped either way.
    pub async fn accept(&mut self, document: &dyn DocumentHost) -> Result<String> {
        let mut candidate = match self.candidate.take() {
            Some(c) if c.status == CandidateStatus::Pending => c,
            _ => {
                return Err(Error::Validation(
                    "no pending code proposal to accept".to_string(),
                ))
            }
        };

        candidate.status = CandidateStatus::Accepted;

        if let Err(e) = document.apply(&candidate.proposed_text).await {
            tracing::warn!("[ReviewSession] Document apply failed: {}", e);
            return Err(e);
        }

        candidate.status = CandidateStatus::Applied;
        tracing::info!(
            "[ReviewSession] Applied proposal (+{} -{})",
            candidate.diff.added(),
            candidate.diff.removed()
        );

        Ok(candidate.proposed_text)
    }

    /// Discard the pending candidate. No external effect.
    pub fn discard(&mut self) -> Result<()> {
        let mut candidate = match self.candidate.take() {
            Some(c) if c.status == CandidateStatus::Pending => c,
            _ => {
                return Err(Error::Validation(
                    "no pending code proposal to discard".to_string(),
                ))
            }
        };

        candidate.status = CandidateStatus::Discarded;
        tracing::info!("[ReviewSession] Discarded proposal");
        Ok(())
    }
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diff::DiffLineKind;
    use std::sync::Mutex;

    struct RecordingDocument {
        text: String,
        applied: Mutex<Vec<String>>,
    }

    impl RecordingDocument {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                applied: Mutex::new(Vec::new()),
            }
        }

        fn applied(&self) -> Vec<String> {
            self.applied.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentHost for RecordingDocument {
        fn language(&self) -> String {
            "rust".to_string()
        }

        async fn content(&self) -> Result<String> {
            Ok(self.text.clone())
        }

        async fn apply(&self, text: &str) -> Result<()> {
            self.applied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenDocument;

    #[async_trait]
    impl DocumentHost for BrokenDocument {
        fn language(&self) -> String {
            "rust".to_string()
        }

        async fn content(&self) -> Result<String> {
            Err(Error::Document("no active document".to_string()))
        }

        async fn apply(&self, _text: &str) -> Result<()> {
            Err(Error::Document("no active document".to_string()))
        }
    }

    #[tokio::test]
    async fn test_begin_installs_pending_candidate_with_diff() {
        let mut session = ReviewSession::new();

        let candidate = session.begin(String::new(), "fn a() {}\nfn b() {}".to_string());

        assert_eq!(candidate.status, CandidateStatus::Pending);
        assert_eq!(candidate.diff.added(), 2);
        assert!(candidate
            .diff
            .lines
            .iter()
            .all(|l| l.kind == DiffLineKind::Added));
        assert!(session.has_pending());
    }

    #[tokio::test]
    async fn test_accept_applies_proposed_text_exactly_once() {
        let mut session = ReviewSession::new();
        let document = RecordingDocument::new("old");

        session.begin("old".to_string(), "new".to_string());
        let applied = session.accept(&document).await.unwrap();

        assert_eq!(applied, "new");
        assert_eq!(document.applied(), vec!["new".to_string()]);
        assert!(session.candidate().is_none());
    }

    #[tokio::test]
    async fn test_accept_without_pending_candidate_is_rejected() {
        let mut session = ReviewSession::new();
        let document = RecordingDocument::new("");

        let err = session.accept(&document).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(document.applied().is_empty());
    }

    #[tokio::test]
    async fn test_discard_never_touches_the_document() {
        let mut session = ReviewSession::new();

        session.begin("old".to_string(), "new".to_string());
        session.discard().unwrap();

        assert!(session.candidate().is_none());
        assert!(matches!(
            session.discard().unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_new_proposal_replaces_pending_one() {
        let mut session = ReviewSession::new();
        let document = RecordingDocument::new("");

        session.begin(String::new(), "first".to_string());
        session.begin(String::new(), "second".to_string());

        let applied = session.accept(&document).await.unwrap();
        assert_eq!(applied, "second");
        assert_eq!(document.applied(), vec!["second".to_string()]);
    }

    #[tokio::test]
    async fn test_document_failure_drops_the_candidate() {
        let mut session = ReviewSession::new();

        session.begin("old".to_string(), "new".to_string());
        let err = session.accept(&BrokenDocument).await.unwrap_err();

        assert!(matches!(err, Error::Document(_)));
        assert!(session.candidate().is_none());
    }
}
