//! Answer-sheet reconciliation and grading.
//!
//! [`choice_lists`] pairs every choice a user submitted with the correctness
//! flag stored in the question bank. [`grade`] turns those pairings into a
//! [`ScoreSheet`].

use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::model::{
    AnswerSheet, ChoiceCorrect, ChoiceList, ExamQuestionPoint, Grade, Question, QuestionType,
};
use crate::store::QuestionStore;

/// A user's answers to one exam, as read from an answers file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub exam_id: i64,
    pub username: String,
    #[serde(default)]
    pub answers: Vec<AnswerSheet>,
}

/// Reconcile submitted answer sheets against the question store.
///
/// Returns one [`ChoiceList`] per sheet, in input order. Fails fast: a sheet
/// whose question id is absent, non-positive, or unknown aborts the whole
/// call with [`ExamError::QuestionNotFound`] and no partial result.
///
/// The point attached to each entry comes from the matching
/// [`ExamQuestionPoint`]; if the exam lists no weight for the question, the
/// sheet's own point is used. Points are never recomputed.
pub fn choice_lists<S>(
    store: &S,
    sheets: &[AnswerSheet],
    points: &[ExamQuestionPoint],
) -> Result<Vec<ChoiceList>, ExamError>
where
    S: QuestionStore + ?Sized,
{
    let mut lists = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let question = resolve_question(store, sheet.question_id)?;

        let choices = if question.choices.is_empty() {
            Vec::new()
        } else {
            sheet
                .choices
                .iter()
                .map(|submitted| ChoiceCorrect {
                    choice: submitted.clone(),
                    is_real_correct: submitted
                        .id
                        .and_then(|id| question.choice(id))
                        .is_some_and(|stored| stored.is_corrected),
                })
                .collect()
        };

        let point = points
            .iter()
            .find(|p| p.question_id == question.id)
            .map(|p| p.point)
            .unwrap_or(sheet.point);

        tracing::debug!(
            question_id = question.id,
            point,
            choices = choices.len(),
            "reconciled answer sheet"
        );

        lists.push(ChoiceList {
            question,
            point,
            choices,
        });
    }

    Ok(lists)
}

fn resolve_question<S>(store: &S, id: Option<i64>) -> Result<Question, ExamError>
where
    S: QuestionStore + ?Sized,
{
    let not_found = || ExamError::QuestionNotFound { question_id: id };
    match id {
        Some(id) if id > 0 => store.question(id)?.ok_or_else(not_found),
        _ => Err(not_found()),
    }
}

/// Per-question outcome on a score sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_id: i64,
    pub question_type: QuestionType,
    /// Weight of the question in this exam.
    pub point: i32,
    /// Points awarded: `point` when correct, otherwise zero.
    pub earned: i32,
    pub correct: bool,
    /// Essay question or no choices to compare; needs a human grader.
    pub needs_review: bool,
}

/// Graded result of a whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub questions: Vec<QuestionScore>,
    pub total_point: i64,
    pub max_point: i64,
}

impl ScoreSheet {
    /// Number of questions answered correctly.
    pub fn correct_count(&self) -> usize {
        self.questions.iter().filter(|q| q.correct).count()
    }

    /// Ids of questions that could not be graded automatically.
    pub fn needs_review(&self) -> Vec<i64> {
        self.questions
            .iter()
            .filter(|q| q.needs_review)
            .map(|q| q.question_id)
            .collect()
    }

    /// Earned points as a fraction of the maximum, in `0.0..=1.0` for
    /// non-negative weights. Zero when nothing was at stake.
    pub fn ratio(&self) -> f64 {
        if self.max_point == 0 {
            0.0
        } else {
            self.total_point as f64 / self.max_point as f64
        }
    }

    /// The total as an attempt grade.
    pub fn grade(&self) -> Grade {
        Grade::Graded(self.total_point as f64)
    }
}

/// Grade reconciled choice lists.
///
/// Essay questions never earn points automatically, even when they carry
/// choices; they are flagged for review instead.
pub fn grade(lists: &[ChoiceList]) -> ScoreSheet {
    let questions: Vec<QuestionScore> = lists
        .iter()
        .map(|list| {
            let needs_review = list.question.question_type == QuestionType::Essay
                || list.question.choices.is_empty();
            let correct = !needs_review && list.is_correct();
            QuestionScore {
                question_id: list.question.id,
                question_type: list.question.question_type,
                point: list.point,
                earned: if correct { list.point } else { 0 },
                correct,
                needs_review,
            }
        })
        .collect();

    let total_point = questions.iter().map(|q| i64::from(q.earned)).sum();
    let max_point = questions.iter().map(|q| i64::from(q.point)).sum();

    ScoreSheet {
        questions,
        total_point,
        max_point,
    }
}

/// Reconcile and grade in one step.
pub fn score_answers<S>(
    store: &S,
    sheets: &[AnswerSheet],
    points: &[ExamQuestionPoint],
) -> Result<ScoreSheet, ExamError>
where
    S: QuestionStore + ?Sized,
{
    Ok(grade(&choice_lists(store, sheets, points)?))
}
