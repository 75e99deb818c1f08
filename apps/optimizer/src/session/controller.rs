//! Session controller: owns the single active optimization session.
//!
//! Every session gets its own `CancellationToken`. Starting a new session or
//! stopping the current one cancels the token and awaits the reader task, so
//! the previous stream (and its connection) is dropped before anything else
//! happens. A reader only ever writes to the session it was spawned for.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures_util::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::optimization::{OptimizationRequest, StartOptimizationRequest};
use crate::models::resume::ResumeData;
use crate::optimizer_client::OptimizationBackend;
use crate::reconcile::reconcile;
use crate::session::machine::{OptimizationSession, RecordOutcome};
use crate::stream::event::StreamEvent;
use crate::stream::EventFramer;

type SharedSession = Arc<Mutex<OptimizationSession>>;

/// Session state is plain data; a panic elsewhere does not make it unusable.
fn lock(session: &SharedSession) -> MutexGuard<'_, OptimizationSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of a successful "apply selected" action.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedOptimization {
    pub resume_id: String,
    pub optimized_data: ResumeData,
}

struct ActiveSession {
    session: SharedSession,
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

impl ActiveSession {
    /// Cancels the reader and waits until it has let go of its stream.
    async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                warn!("Stream reader ended abnormally: {e}");
            }
        }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct OptimizationController {
    backend: Arc<dyn OptimizationBackend>,
    max_line_bytes: usize,
    active: tokio::sync::Mutex<Option<ActiveSession>>,
}

impl OptimizationController {
    pub fn new(backend: Arc<dyn OptimizationBackend>, max_line_bytes: usize) -> Self {
        Self {
            backend,
            max_line_bytes,
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Starts a fresh session, first shutting down any previous one.
    ///
    /// Returns the new session as it stands before any record is read.
    pub async fn start(
        &self,
        request: StartOptimizationRequest,
    ) -> Result<OptimizationSession, AppError> {
        let mut active = self.active.lock().await;

        if let Some(mut previous) = active.take() {
            previous.shutdown().await;
            let mut old = lock(&previous.session);
            if old.stop() {
                info!("Session {} superseded by a new optimization", old.id());
            }
        }

        let mut session = OptimizationSession::new(request.resume, request.job_id);
        session.begin().map_err(anyhow::Error::from)?;

        let backend_request = OptimizationRequest {
            resume_id: session.resume_id().to_string(),
            job_id: session.job_id().to_string(),
        };
        let snapshot = session.clone();
        let shared = Arc::new(Mutex::new(session));
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(read_stream(
            Arc::clone(&self.backend),
            backend_request,
            Arc::clone(&shared),
            cancel.clone(),
            self.max_line_bytes,
        ));

        *active = Some(ActiveSession {
            session: shared,
            cancel,
            reader: Some(reader),
        });

        Ok(snapshot)
    }

    /// Stops the current session. Stopping a finished session is a no-op
    /// that still returns its state.
    pub async fn stop(&self) -> Result<OptimizationSession, AppError> {
        let mut active = self.active.lock().await;
        let current = active.as_mut().ok_or_else(no_session)?;

        current.shutdown().await;
        let mut session = lock(&current.session);
        session.stop();
        Ok(session.clone())
    }

    pub async fn snapshot(&self) -> Option<OptimizationSession> {
        let active = self.active.lock().await;
        active.as_ref().map(|current| lock(&current.session).clone())
    }

    pub async fn toggle(&self, index: usize) -> Result<OptimizationSession, AppError> {
        let active = self.active.lock().await;
        let current = active.as_ref().ok_or_else(no_session)?;

        let mut session = lock(&current.session);
        session.toggle_suggestion(index)?;
        Ok(session.clone())
    }

    /// Reconciles the accepted suggestions into a copy of the base document
    /// and saves it. A failed save leaves every acceptance flag as it was.
    pub async fn apply(&self) -> Result<AppliedOptimization, AppError> {
        let shared = {
            let active = self.active.lock().await;
            Arc::clone(&active.as_ref().ok_or_else(no_session)?.session)
        };

        let (resume_id, optimized_data) = {
            let session = lock(&shared);
            if !session.suggestions().has_any_accepted() {
                return Err(AppError::Validation(
                    "Select at least one suggestion before applying".to_string(),
                ));
            }
            let accepted = session.suggestions().accepted();
            (
                session.resume_id().to_string(),
                reconcile(session.base(), &accepted),
            )
        };

        self.backend
            .save_optimization(&resume_id, &optimized_data)
            .await?;

        lock(&shared).mark_saved(Utc::now());

        Ok(AppliedOptimization {
            resume_id,
            optimized_data,
        })
    }
}

fn no_session() -> AppError {
    AppError::NotFound("No optimization session has been started".to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Stream read loop
// ────────────────────────────────────────────────────────────────────────────

enum Flow {
    Continue,
    Finished,
}

/// Reads one session's stream until completion, failure, end of stream or
/// cancellation. Every await races the token, with cancellation checked first.
async fn read_stream(
    backend: Arc<dyn OptimizationBackend>,
    request: OptimizationRequest,
    session: SharedSession,
    cancel: CancellationToken,
    max_line_bytes: usize,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = backend.open_stream(&request) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Could not open optimization stream: {e}");
            lock(&session).fail(e.to_string());
            return;
        }
    };

    let mut framer = EventFramer::new(max_line_bytes);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream reader cancelled");
                return;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                framer.push_chunk(&chunk);
                if let Flow::Finished = drain_events(&mut framer, &session, &cancel) {
                    return;
                }
            }
            Some(Err(e)) => {
                warn!("Optimization stream failed: {e}");
                let mut session = lock(&session);
                session.record_lines_skipped(framer.lines_skipped());
                session.fail(e.to_string());
                return;
            }
            None => {
                finish_stream(&mut framer, &session);
                return;
            }
        }
    }
}

/// Applies every complete event currently buffered, one record at a time.
fn drain_events(
    framer: &mut EventFramer,
    session: &SharedSession,
    cancel: &CancellationToken,
) -> Flow {
    while let Some(event) = framer.next_event() {
        if cancel.is_cancelled() {
            return Flow::Finished;
        }

        let mut guard = lock(session);
        guard.record_lines_skipped(framer.lines_skipped());
        match event {
            StreamEvent::Progress(record) => match guard.apply(record) {
                RecordOutcome::Applied => {}
                RecordOutcome::Completed | RecordOutcome::Ignored => return Flow::Finished,
            },
            StreamEvent::Done => {
                debug!("Received end-of-stream marker");
                guard.end_of_stream();
                return Flow::Finished;
            }
        }
    }

    lock(session).record_lines_skipped(framer.lines_skipped());
    Flow::Continue
}

fn finish_stream(framer: &mut EventFramer, session: &SharedSession) {
    if let Some(rest) = framer.finish() {
        warn!(
            "Discarding unterminated line at end of stream: {:?}",
            rest.chars().take(80).collect::<String>()
        );
    }
    let mut session = lock(session);
    session.record_lines_skipped(framer.lines_skipped());
    session.end_of_stream();
}
