//! Event Parser: turns one `data: ` line into a typed stream event.

use thiserror::Error;

use crate::models::optimization::ProgressRecord;
use crate::stream::splitter::EVENT_PREFIX;

/// Payload the backend sends after its final record.
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Progress(ProgressRecord),
    /// The backend's end-of-stream marker.
    Done,
}

/// A line that could not be turned into an event. Always recoverable: the
/// caller skips the line and keeps reading.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("line does not start with the event prefix")]
    MissingPrefix,

    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn parse_event_line(line: &str) -> Result<StreamEvent, EventError> {
    let payload = line
        .strip_prefix(EVENT_PREFIX)
        .ok_or(EventError::MissingPrefix)?;

    if payload.trim() == DONE_SENTINEL {
        return Ok(StreamEvent::Done);
    }

    let record: ProgressRecord = serde_json::from_str(payload)?;
    Ok(StreamEvent::Progress(record))
}
