//! Progress State Machine: folds progress records into session state.
//!
//! ```text
//! Idle ──begin──▶ Running ──record{completed}──▶ Completed
//!   │               ├──────stop──────────────▶ Stopped
//!   └──fail──▶      └──fail / end of stream──▶ Failed
//! ```
//!
//! All mutation goes through the transition methods below. Each one either
//! applies fully or not at all, so an observer never sees a half-applied
//! record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::optimization::{AtsScore, InterviewQuestion, ProgressRecord};
use crate::models::resume::ResumeData;
use crate::session::suggestions::{SuggestionError, SuggestionStore};

/// Message used when the stream closes before a `completed` record.
pub const STREAM_ENDED_EARLY: &str = "Stream ended before optimization completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("cannot {action} a session that is {from:?}")]
    Illegal {
        action: &'static str,
        from: SessionStatus,
    },
}

/// What happened to a record handed to [`OptimizationSession::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Applied,
    /// Applied, and the session is now Completed.
    Completed,
    /// The session was not Running; nothing changed.
    Ignored,
}

/// State of one "start optimization" attempt.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationSession {
    id: Uuid,
    resume_id: String,
    job_id: String,
    status: SessionStatus,
    step: String,
    progress: u32,
    message: String,
    suggestions: SuggestionStore,
    ats_score: Option<AtsScore>,
    interview_questions: Option<Vec<InterviewQuestion>>,
    error: Option<String>,
    records_applied: u64,
    lines_skipped: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
    /// The document being displayed; reconciliation copies it, never mutates it.
    #[serde(skip)]
    base: ResumeData,
}

impl OptimizationSession {
    pub fn new(base: ResumeData, job_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resume_id: base.id.clone(),
            job_id: job_id.into(),
            status: SessionStatus::Idle,
            step: String::new(),
            progress: 0,
            message: String::new(),
            suggestions: SuggestionStore::new(),
            ats_score: None,
            interview_questions: None,
            error: None,
            records_applied: 0,
            lines_skipped: 0,
            started_at: None,
            finished_at: None,
            last_saved_at: None,
            base,
        }
    }

    // ── transitions ─────────────────────────────────────────────────────────

    /// Idle → Running. Clears progress, suggestions, score, questions and error.
    pub fn begin(&mut self) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Idle {
            return Err(TransitionError::Illegal {
                action: "begin",
                from: self.status,
            });
        }
        self.step.clear();
        self.progress = 0;
        self.message.clear();
        self.suggestions = SuggestionStore::new();
        self.ats_score = None;
        self.interview_questions = None;
        self.error = None;
        self.records_applied = 0;
        self.lines_skipped = 0;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        self.status = SessionStatus::Running;
        info!(
            "Optimization session {} started (resume {}, job {})",
            self.id, self.resume_id, self.job_id
        );
        Ok(())
    }

    /// Running → Running, or Running → Completed when the record says so.
    ///
    /// Step, progress and message are overwritten. A non-empty suggestion list
    /// replaces the store; an empty one leaves it alone. Score and questions
    /// are replaced whole when present.
    pub fn apply(&mut self, record: ProgressRecord) -> RecordOutcome {
        if self.status != SessionStatus::Running {
            return RecordOutcome::Ignored;
        }

        let ProgressRecord {
            step,
            progress,
            message,
            suggestions,
            completed,
            ats_score,
            interview_questions,
        } = record;

        self.step = step;
        self.progress = progress;
        self.message = message;
        if !suggestions.is_empty() {
            self.suggestions.replace(suggestions);
        }
        if let Some(score) = ats_score {
            self.ats_score = Some(score);
        }
        if let Some(questions) = interview_questions {
            self.interview_questions = Some(questions);
        }
        self.records_applied += 1;

        if completed {
            self.status = SessionStatus::Completed;
            self.finished_at = Some(Utc::now());
            info!(
                "Optimization session {} completed with {} suggestions",
                self.id,
                self.suggestions.len()
            );
            return RecordOutcome::Completed;
        }
        RecordOutcome::Applied
    }

    /// Running → Stopped. Returns false when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        if self.status != SessionStatus::Running {
            return false;
        }
        self.status = SessionStatus::Stopped;
        self.finished_at = Some(Utc::now());
        info!("Optimization session {} stopped", self.id);
        true
    }

    /// Idle/Running → Failed with a user-facing message. Terminal sessions
    /// keep their outcome.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let message = message.into();
        info!("Optimization session {} failed: {message}", self.id);
        self.error = Some(message);
        self.status = SessionStatus::Failed;
        self.finished_at = Some(Utc::now());
        true
    }

    /// The byte stream closed. Only matters if no `completed` record came.
    pub fn end_of_stream(&mut self) -> bool {
        self.status == SessionStatus::Running && self.fail(STREAM_ENDED_EARLY)
    }

    // ── user actions that are legal in any state ────────────────────────────

    pub fn toggle_suggestion(&mut self, index: usize) -> Result<bool, SuggestionError> {
        self.suggestions.toggle(index)
    }

    pub fn record_lines_skipped(&mut self, total: u64) {
        self.lines_skipped = total;
    }

    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.last_saved_at = Some(at);
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resume_id(&self) -> &str {
        &self.resume_id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    #[cfg(test)]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[cfg(test)]
    pub fn step(&self) -> &str {
        &self.step
    }

    #[cfg(test)]
    pub fn progress(&self) -> u32 {
        self.progress
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suggestions(&self) -> &SuggestionStore {
        &self.suggestions
    }

    #[cfg(test)]
    pub fn ats_score(&self) -> Option<&AtsScore> {
        self.ats_score.as_ref()
    }

    #[cfg(test)]
    pub fn interview_questions(&self) -> Option<&[InterviewQuestion]> {
        self.interview_questions.as_deref()
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[cfg(test)]
    pub fn records_applied(&self) -> u64 {
        self.records_applied
    }

    #[cfg(test)]
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }

    #[cfg(test)]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn base(&self) -> &ResumeData {
        &self.base
    }
}
