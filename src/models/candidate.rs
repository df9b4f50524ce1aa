//! Candidate file model for the upload queue.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A file handed to the tracker for admission, before any validation.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Filename as selected by the user.
    pub name: String,
    /// Content type declared by the sender, if any.
    pub content_type: Option<String>,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

/// One queued image, pending or having undergone OCR.
///
/// Candidates are identified by name (unique within the queue), mutated in
/// place as their status advances, and never persisted beyond the session.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Filename, unique within the queue.
    pub name: String,
    /// Original image content.
    pub content: Vec<u8>,
    /// Processing status.
    pub status: CandidateStatus,
    /// When the candidate was admitted.
    pub admitted_at: DateTime<Utc>,
}

impl CandidateFile {
    /// Create a pending candidate from an admitted selection.
    pub fn new(name: String, content: Vec<u8>) -> Self {
        Self {
            name,
            content,
            status: CandidateStatus::Pending,
            admitted_at: Utc::now(),
        }
    }
}

/// Processing status of a candidate.
///
/// Text, artifact link and timing exist only once completed; an error message
/// only while errored. Error is terminal but re-enterable: a re-run resets
/// the same candidate back through Processing.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateStatus {
    /// Admitted, not yet submitted.
    Pending,
    /// Submission in flight.
    Processing,
    /// OCR finished; result stored on the candidate.
    Completed {
        /// Extracted text (may be empty).
        text: String,
        /// Link to the OCR PDF artifact.
        artifact: String,
        /// Wall time the submission took.
        elapsed: Duration,
    },
    /// Submission failed; retried on the next run.
    Error {
        /// Failure description shown to the user.
        message: String,
    },
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Display row projected from a candidate; what the UI renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRow {
    /// Position in the queue.
    pub index: usize,
    /// Candidate filename.
    pub name: String,
    /// Status label: pending, processing, completed or error.
    pub status: &'static str,
    /// Extracted text, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Artifact link, when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Processing time in seconds, when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    /// Failure description, when errored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateRow {
    /// Project a candidate into its display row.
    pub fn from_candidate(index: usize, candidate: &CandidateFile) -> Self {
        let mut row = Self {
            index,
            name: candidate.name.clone(),
            status: candidate.status.as_str(),
            text: None,
            artifact: None,
            elapsed_secs: None,
            error: None,
        };
        match &candidate.status {
            CandidateStatus::Completed {
                text,
                artifact,
                elapsed,
            } => {
                if !text.is_empty() {
                    row.text = Some(text.clone());
                }
                row.artifact = Some(artifact.clone());
                row.elapsed_secs = Some(elapsed.as_secs_f64());
            }
            CandidateStatus::Error { message } => {
                row.error = Some(message.clone());
            }
            CandidateStatus::Pending | CandidateStatus::Processing => {}
        }
        row
    }
}
