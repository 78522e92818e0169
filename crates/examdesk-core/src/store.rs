//! Collaborator traits for the question bank, exam catalog and attempt
//! storage.
//!
//! The core never owns persistence. Callers supply stores; the in-memory
//! implementations in [`crate::memory`] back tests and the CLI.

use crate::error::StoreError;
use crate::model::{Exam, ExamUser, Question};

// ---------------------------------------------------------------------------
// Question store
// ---------------------------------------------------------------------------

/// Lookup and persistence of questions with their choices.
pub trait QuestionStore: Send + Sync {
    /// Fetch a question by id regardless of its lifecycle.
    fn question(&self, id: i64) -> Result<Option<Question>, StoreError>;

    /// All stored questions, deleted ones included.
    fn questions(&self) -> Result<Vec<Question>, StoreError>;

    /// Insert or overwrite a question. Returns the stored value.
    fn put_question(&self, question: Question) -> Result<Question, StoreError>;
}

// ---------------------------------------------------------------------------
// Exam store
// ---------------------------------------------------------------------------

/// Lookup and persistence of exam definitions.
pub trait ExamStore: Send + Sync {
    /// Fetch an exam by id.
    fn exam(&self, id: i64) -> Result<Option<Exam>, StoreError>;

    /// All stored exams, ordered by id.
    fn exams(&self) -> Result<Vec<Exam>, StoreError>;

    /// Insert or overwrite an exam. An exam with a non-positive id is new and
    /// gets the next free id. Returns the stored value.
    fn put_exam(&self, exam: Exam) -> Result<Exam, StoreError>;
}

// ---------------------------------------------------------------------------
// Attempt store
// ---------------------------------------------------------------------------

/// Create, update, and find [`ExamUser`] records.
pub trait AttemptStore: Send + Sync {
    /// Insert a new attempt. The store assigns the id; the id on `attempt`
    /// is ignored.
    fn insert_attempt(&self, attempt: ExamUser) -> Result<ExamUser, StoreError>;

    /// Fetch an attempt by id.
    fn attempt(&self, id: i64) -> Result<Option<ExamUser>, StoreError>;

    /// Overwrite an existing attempt. Returns `false` and stores nothing
    /// when no attempt has that id.
    fn replace_attempt(&self, attempt: &ExamUser) -> Result<bool, StoreError>;

    /// All stored attempts in insertion order.
    fn attempts(&self) -> Result<Vec<ExamUser>, StoreError>;

    /// Attempts for one exam. The default filters [`AttemptStore::attempts`].
    fn attempts_by_exam(&self, exam_id: i64) -> Result<Vec<ExamUser>, StoreError> {
        Ok(self
            .attempts()?
            .into_iter()
            .filter(|a| a.exam_id == exam_id)
            .collect())
    }

    /// Attempts belonging to one user. The default filters
    /// [`AttemptStore::attempts`].
    fn attempts_by_username(&self, username: &str) -> Result<Vec<ExamUser>, StoreError> {
        Ok(self
            .attempts()?
            .into_iter()
            .filter(|a| a.username == username)
            .collect())
    }
}
