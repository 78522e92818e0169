//! In-memory stores for tests, benches, and fixture-driven CLI runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::model::{Exam, ExamUser, Question};
use crate::store::{AttemptStore, ExamStore, QuestionStore};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock().map_err(|_| StoreError::Poisoned)
}

/// Question store keyed by question id.
#[derive(Debug, Default)]
pub struct MemoryQuestionStore {
    questions: Mutex<BTreeMap<i64, Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `questions`. Later duplicates win.
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: Mutex::new(questions.into_iter().map(|q| (q.id, q)).collect()),
        }
    }

    /// Number of stored questions, deleted ones included.
    pub fn len(&self) -> usize {
        self.questions.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuestionStore for MemoryQuestionStore {
    fn question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        Ok(lock(&self.questions)?.get(&id).cloned())
    }

    fn questions(&self) -> Result<Vec<Question>, StoreError> {
        Ok(lock(&self.questions)?.values().cloned().collect())
    }

    fn put_question(&self, question: Question) -> Result<Question, StoreError> {
        lock(&self.questions)?.insert(question.id, question.clone());
        Ok(question)
    }
}

/// Exam store keyed by exam id.
#[derive(Debug, Default)]
pub struct MemoryExamStore {
    exams: Mutex<BTreeMap<i64, Exam>>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exams(exams: impl IntoIterator<Item = Exam>) -> Self {
        Self {
            exams: Mutex::new(exams.into_iter().map(|e| (e.id, e)).collect()),
        }
    }
}

impl ExamStore for MemoryExamStore {
    fn exam(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        Ok(lock(&self.exams)?.get(&id).cloned())
    }

    fn exams(&self) -> Result<Vec<Exam>, StoreError> {
        Ok(lock(&self.exams)?.values().cloned().collect())
    }

    fn put_exam(&self, mut exam: Exam) -> Result<Exam, StoreError> {
        let mut exams = lock(&self.exams)?;
        if exam.id <= 0 {
            exam.id = exams.keys().next_back().map_or(1, |last| last + 1).max(1);
        }
        exams.insert(exam.id, exam.clone());
        Ok(exam)
    }
}

/// Attempt store that assigns sequential ids starting at 1.
///
/// Can be switched into an unavailable state to exercise error paths.
#[derive(Debug)]
pub struct MemoryAttemptStore {
    attempts: Mutex<Vec<ExamUser>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl Default for MemoryAttemptStore {
    fn default() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding existing attempts with their ids kept. New ids
    /// continue after the largest one.
    pub fn with_attempts(attempts: Vec<ExamUser>) -> Self {
        let next = attempts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        Self {
            attempts: Mutex::new(attempts),
            next_id: AtomicI64::new(next.max(1)),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("attempt store offline".into()));
        }
        Ok(())
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn insert_attempt(&self, mut attempt: ExamUser) -> Result<ExamUser, StoreError> {
        self.check()?;
        attempt.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.attempts)?.push(attempt.clone());
        Ok(attempt)
    }

    fn attempt(&self, id: i64) -> Result<Option<ExamUser>, StoreError> {
        self.check()?;
        Ok(lock(&self.attempts)?.iter().find(|a| a.id == id).cloned())
    }

    fn replace_attempt(&self, attempt: &ExamUser) -> Result<bool, StoreError> {
        self.check()?;
        let mut attempts = lock(&self.attempts)?;
        match attempts.iter_mut().find(|a| a.id == attempt.id) {
            Some(slot) => {
                *slot = attempt.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn attempts(&self) -> Result<Vec<ExamUser>, StoreError> {
        self.check()?;
        Ok(lock(&self.attempts)?.clone())
    }
}
