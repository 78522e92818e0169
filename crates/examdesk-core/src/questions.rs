//! Question bank operations on top of a [`QuestionStore`].

use crate::error::StoreError;
use crate::model::{AnswerSheet, Choice, ExamQuestionPoint, Lifecycle, Question, QuestionType};
use crate::store::QuestionStore;

pub struct QuestionBank<'a, S: QuestionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: QuestionStore + ?Sized> QuestionBank<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Save a new question. The point is derived from its difficulty.
    pub fn save(&self, mut question: Question) -> Result<Question, StoreError> {
        question.point = question.difficulty_level.point();
        question.lifecycle = Lifecycle::Active;
        tracing::debug!(id = question.id, point = question.point, "saving question");
        self.store.put_question(question)
    }

    /// Update a question's content. The stored point is kept even if the
    /// difficulty changed; call [`QuestionBank::recompute_point`] to refresh it.
    pub fn update(&self, mut question: Question) -> Result<Question, StoreError> {
        match self.store.question(question.id)? {
            Some(stored) => {
                question.point = stored.point;
                question.lifecycle = stored.lifecycle;
                self.store.put_question(question)
            }
            None => self.save(question),
        }
    }

    /// Derive the point again from the current difficulty.
    pub fn recompute_point(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let Some(mut question) = self.store.question(id)? else {
            return Ok(None);
        };
        question.point = question.difficulty_level.point();
        self.store.put_question(question).map(Some)
    }

    /// Soft-delete a question. Returns whether anything changed; unknown or
    /// non-positive ids are ignored.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let question = match self.get(id)? {
            Some(q) => q,
            None => {
                tracing::warn!(id, "delete of unknown question ignored");
                return Ok(false);
            }
        };
        self.store.put_question(Question {
            lifecycle: Lifecycle::Deleted,
            ..question
        })?;
        Ok(true)
    }

    /// An active question by id.
    pub fn get(&self, id: i64) -> Result<Option<Question>, StoreError> {
        if id <= 0 {
            return Ok(None);
        }
        Ok(self.store.question(id)?.filter(Question::is_active))
    }

    /// All active questions.
    pub fn active(&self) -> Result<Vec<Question>, StoreError> {
        self.active_where(|_| true)
    }

    pub fn by_part(&self, part_id: i64) -> Result<Vec<Question>, StoreError> {
        self.active_where(|q| q.part_id == Some(part_id))
    }

    pub fn by_type(&self, question_type: QuestionType) -> Result<Vec<Question>, StoreError> {
        self.active_where(|q| q.question_type == question_type)
    }

    pub fn by_creator(&self, username: &str) -> Result<Vec<Question>, StoreError> {
        self.active_where(|q| q.created_by.as_deref() == Some(username))
    }

    pub fn question_text(&self, id: i64) -> Result<Option<String>, StoreError> {
        Ok(self.get(id)?.map(|q| q.question_text))
    }

    /// Questions named by an exam's point list, carrying the exam weight.
    /// Ids with no stored question are skipped.
    pub fn question_point_list(
        &self,
        points: &[ExamQuestionPoint],
    ) -> Result<Vec<Question>, StoreError> {
        let mut questions = Vec::with_capacity(points.len());
        for p in points {
            if let Some(mut q) = self.store.question(p.question_id)? {
                q.point = u32::try_from(p.point).unwrap_or(0);
                questions.push(q);
            }
        }
        Ok(questions)
    }

    fn active_where(&self, keep: impl Fn(&Question) -> bool) -> Result<Vec<Question>, StoreError> {
        Ok(self
            .store
            .questions()?
            .into_iter()
            .filter(|q| q.is_active() && keep(q))
            .collect())
    }
}

/// Blank answer sheets for handing an exam to a user: every choice is
/// present with its correctness flag cleared.
pub fn answer_sheets(questions: &[Question]) -> Vec<AnswerSheet> {
    questions
        .iter()
        .map(|q| AnswerSheet {
            question_id: Some(q.id),
            choices: q
                .choices
                .iter()
                .map(|c| Choice {
                    is_corrected: false,
                    ..c.clone()
                })
                .collect(),
            point: i32::try_from(q.point).unwrap_or(i32::MAX),
        })
        .collect()
}
