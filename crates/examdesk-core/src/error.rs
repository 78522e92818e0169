//! Error types for the examdesk core.
//!
//! Scoring is fail-fast and surfaces these errors to the caller. The attempt
//! tracker and statistics aggregator degrade to empty results instead, so the
//! only errors they return come from the backing store.

use thiserror::Error;

/// Errors raised by a question or attempt store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("store state poisoned")]
    Poisoned,
}

/// Errors that can occur while reconciling or grading answer sheets.
#[derive(Debug, Error)]
pub enum ExamError {
    /// The submitted question id was null, non-positive, or unknown.
    #[error("question not found: {}", display_id(.question_id))]
    QuestionNotFound { question_id: Option<i64> },

    /// An exam's serialized question set could not be decoded.
    #[error("invalid question data for exam {exam_id}: {reason}")]
    InvalidQuestionData { exam_id: i64, reason: String },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExamError {
    /// Returns `true` if this error means a lookup found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExamError::QuestionNotFound { .. })
    }

    /// Returns the offending question id, if this is a not-found error.
    pub fn question_id(&self) -> Option<i64> {
        match self {
            ExamError::QuestionNotFound { question_id } => *question_id,
            _ => None,
        }
    }
}

fn display_id(id: &Option<i64>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = ExamError::QuestionNotFound {
            question_id: Some(-3),
        };
        assert_eq!(err.to_string(), "question not found: -3");
        assert!(err.is_not_found());
        assert_eq!(err.question_id(), Some(-3));
    }

    #[test]
    fn not_found_without_id() {
        let err = ExamError::QuestionNotFound { question_id: None };
        assert_eq!(err.to_string(), "question not found: <none>");
    }

    #[test]
    fn store_errors_are_not_not_found() {
        let err: ExamError = StoreError::Unavailable("down".into()).into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "store unavailable: down");
    }
}
