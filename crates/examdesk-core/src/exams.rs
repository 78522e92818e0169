//! Exam catalog operations on top of an [`ExamStore`].

use serde::Serialize;

use crate::error::StoreError;
use crate::model::Exam;
use crate::store::ExamStore;

/// One page of exams plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamPage {
    pub exams: Vec<Exam>,
    pub total: usize,
}

pub struct ExamCatalog<'a, S: ExamStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ExamStore + ?Sized> ExamCatalog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Save an exam. A non-positive id saves a new exam under a fresh id.
    pub fn save(&self, exam: Exam) -> Result<Exam, StoreError> {
        let saved = self.store.put_exam(exam)?;
        tracing::debug!(id = saved.id, title = %saved.title, "exam saved");
        Ok(saved)
    }

    /// An exam by id. Canceled exams are still returned.
    pub fn get(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        if id <= 0 {
            return Ok(None);
        }
        self.store.exam(id)
    }

    /// Every exam, ordered by id.
    pub fn all(&self) -> Result<Vec<Exam>, StoreError> {
        self.store.exams()
    }

    /// Page `index` (zero-based) of `size` exams, ordered by id.
    pub fn page(&self, index: usize, size: usize) -> Result<ExamPage, StoreError> {
        Ok(paginate(self.all()?, index, size))
    }

    /// Mark an exam canceled. Returns whether an exam was found; unknown or
    /// non-positive ids are ignored.
    pub fn cancel(&self, id: i64) -> Result<bool, StoreError> {
        let Some(exam) = self.get(id)? else {
            tracing::warn!(id, "cancel of unknown exam ignored");
            return Ok(false);
        };
        self.store.put_exam(Exam {
            canceled: true,
            ..exam
        })?;
        Ok(true)
    }

    /// Exams created by `username`. An empty username finds nothing.
    pub fn by_creator(&self, username: &str) -> Result<Vec<Exam>, StoreError> {
        if username.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .all()?
            .into_iter()
            .filter(|e| e.created_by.as_deref() == Some(username))
            .collect())
    }

    /// Page of the exams created by `username`.
    pub fn page_by_creator(
        &self,
        username: &str,
        index: usize,
        size: usize,
    ) -> Result<ExamPage, StoreError> {
        Ok(paginate(self.by_creator(username)?, index, size))
    }
}

fn paginate(exams: Vec<Exam>, index: usize, size: usize) -> ExamPage {
    let total = exams.len();
    let exams = exams
        .into_iter()
        .skip(index.saturating_mul(size))
        .take(size)
        .collect();
    ExamPage { exams, total }
}
