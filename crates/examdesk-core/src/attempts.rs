//! Exam-attempt lifecycle tracking.
//!
//! An attempt moves `not started → started → finished` as the caller updates
//! it. Nothing here runs timers; remaining time and the finished flag are
//! whatever the caller last wrote.
//!
//! Queries never fail for bad keys: a non-positive id or empty username
//! simply finds nothing. Store failures are the only errors returned.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{Exam, ExamUser, Grade, User};
use crate::store::AttemptStore;

/// Caller-supplied values for [`AttemptTracker::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptUpdate {
    pub id: i64,
    /// `None` is stored as `false`.
    pub is_started: Option<bool>,
    /// `None` is stored as `false`.
    pub is_finished: Option<bool>,
    /// `None` keeps the stored value. Not range-checked.
    pub remaining_time: Option<i64>,
    /// `None` keeps the stored value. Not range-checked.
    pub total_point: Option<Grade>,
    /// `None` keeps the stored value.
    pub time_finish: Option<DateTime<Utc>>,
}

impl From<&ExamUser> for AttemptUpdate {
    fn from(attempt: &ExamUser) -> Self {
        Self {
            id: attempt.id,
            is_started: Some(attempt.is_started),
            is_finished: Some(attempt.is_finished),
            remaining_time: Some(attempt.remaining_time),
            total_point: Some(attempt.total_point),
            time_finish: attempt.time_finish,
        }
    }
}

/// Attempt operations over a caller-supplied store.
pub struct AttemptTracker<'a, S: AttemptStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: AttemptStore + ?Sized> AttemptTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Assign `exam` to every user in `roster`.
    ///
    /// Each new attempt starts unstarted and ungraded with the full exam
    /// duration remaining. A missing exam, an unsaved exam (id ≤ 0), or a
    /// missing or empty roster creates nothing.
    pub fn create(
        &self,
        exam: Option<&Exam>,
        roster: Option<&[User]>,
    ) -> Result<Vec<ExamUser>, StoreError> {
        let (Some(exam), Some(roster)) = (exam, roster) else {
            tracing::warn!("attempt creation skipped: no exam or roster");
            return Ok(Vec::new());
        };
        if exam.id <= 0 || roster.is_empty() {
            tracing::warn!(exam_id = exam.id, "attempt creation skipped: nothing to assign");
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(roster.len());
        for user in roster {
            let attempt = self.store.insert_attempt(ExamUser {
                id: 0,
                exam_id: exam.id,
                course_id: exam.course_id,
                username: user.username.clone(),
                is_started: false,
                is_finished: false,
                remaining_time: exam.duration_seconds(),
                total_point: Grade::Ungraded,
                time_finish: None,
            })?;
            created.push(attempt);
        }

        tracing::debug!(exam_id = exam.id, count = created.len(), "attempts created");
        Ok(created)
    }

    /// Overwrite the mutable fields of an existing attempt.
    ///
    /// Returns the stored attempt, or `None` without creating anything when
    /// no attempt has `update.id`.
    pub fn update(&self, update: AttemptUpdate) -> Result<Option<ExamUser>, StoreError> {
        let Some(mut attempt) = self.find_by_id(update.id)? else {
            tracing::warn!(id = update.id, "update of unknown attempt ignored");
            return Ok(None);
        };

        attempt.is_started = update.is_started.unwrap_or(false);
        attempt.is_finished = update.is_finished.unwrap_or(false);
        if let Some(remaining) = update.remaining_time {
            attempt.remaining_time = remaining;
        }
        if let Some(total) = update.total_point {
            attempt.total_point = total;
        }
        if update.time_finish.is_some() {
            attempt.time_finish = update.time_finish;
        }

        if !self.store.replace_attempt(&attempt)? {
            return Ok(None);
        }
        tracing::debug!(id = attempt.id, status = %attempt.status(), "attempt updated");
        Ok(Some(attempt))
    }

    /// Mark an attempt started.
    pub fn start(&self, id: i64) -> Result<Option<ExamUser>, StoreError> {
        let Some(attempt) = self.find_by_id(id)? else {
            return Ok(None);
        };
        self.update(AttemptUpdate {
            is_started: Some(true),
            ..AttemptUpdate::from(&attempt)
        })
    }

    /// Mark an attempt finished with its grade and finish time.
    pub fn finish(
        &self,
        id: i64,
        total_point: Grade,
        at: DateTime<Utc>,
    ) -> Result<Option<ExamUser>, StoreError> {
        let Some(attempt) = self.find_by_id(id)? else {
            return Ok(None);
        };
        self.update(AttemptUpdate {
            is_started: Some(true),
            is_finished: Some(true),
            total_point: Some(total_point),
            time_finish: Some(at),
            ..AttemptUpdate::from(&attempt)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<ExamUser>, StoreError> {
        if id <= 0 {
            return Ok(None);
        }
        self.store.attempt(id)
    }

    /// The attempt of `username` at exam `exam_id`.
    pub fn find_by_exam_and_user(
        &self,
        exam_id: i64,
        username: &str,
    ) -> Result<Option<ExamUser>, StoreError> {
        if exam_id <= 0 || username.is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .attempts_by_exam(exam_id)?
            .into_iter()
            .find(|a| a.username == username))
    }

    /// Every attempt at one exam.
    pub fn find_all_by_exam(&self, exam_id: i64) -> Result<Vec<ExamUser>, StoreError> {
        if exam_id <= 0 {
            return Ok(Vec::new());
        }
        self.store.attempts_by_exam(exam_id)
    }

    /// Every attempt of one user across exams.
    pub fn find_by_username(&self, username: &str) -> Result<Vec<ExamUser>, StoreError> {
        if username.is_empty() {
            return Ok(Vec::new());
        }
        self.store.attempts_by_username(username)
    }

    /// Finished attempts at one exam.
    pub fn find_finished_by_exam(&self, exam_id: i64) -> Result<Vec<ExamUser>, StoreError> {
        Ok(self
            .find_all_by_exam(exam_id)?
            .into_iter()
            .filter(|a| a.is_finished)
            .collect())
    }

    /// Finished attempts of `username` at exams of course `course_id`.
    pub fn complete_exams(
        &self,
        course_id: i64,
        username: &str,
    ) -> Result<Vec<ExamUser>, StoreError> {
        self.in_course(course_id, username, |a| a.is_finished)
    }

    /// Graded attempts of `username` at exams of course `course_id`.
    pub fn graded_exams(&self, course_id: i64, username: &str) -> Result<Vec<ExamUser>, StoreError> {
        self.in_course(course_id, username, |a| a.total_point.is_graded())
    }

    fn in_course(
        &self,
        course_id: i64,
        username: &str,
        keep: impl Fn(&ExamUser) -> bool,
    ) -> Result<Vec<ExamUser>, StoreError> {
        if course_id <= 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .find_by_username(username)?
            .into_iter()
            .filter(|a| a.course_id == Some(course_id))
            .filter(|a| keep(a))
            .collect())
    }
}
