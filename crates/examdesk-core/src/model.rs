//! Core data model types for examdesk.
//!
//! Field names serialize in camelCase so answer sheets and question-set
//! payloads stay wire-compatible with the JSON the exam frontend exchanges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ExamError;

/// How hard a question is. Determines the question's stored point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Fixed point value awarded for a question of this difficulty.
    pub fn point(self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Medium => 10,
            Difficulty::Hard => 15,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Question type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "TF")]
    TrueFalse,
    #[default]
    #[serde(rename = "MC")]
    MultipleChoice,
    #[serde(rename = "MS")]
    MultipleSelect,
    #[serde(rename = "PARA")]
    Essay,
}

impl QuestionType {
    /// Short type code used on the wire and in fixtures.
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::TrueFalse => "TF",
            QuestionType::MultipleChoice => "MC",
            QuestionType::MultipleSelect => "MS",
            QuestionType::Essay => "PARA",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::TrueFalse => write!(f, "true-false"),
            QuestionType::MultipleChoice => write!(f, "multiple-choice"),
            QuestionType::MultipleSelect => write!(f, "multiple-select"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tf" | "true-false" | "truefalse" => Ok(QuestionType::TrueFalse),
            "mc" | "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "ms" | "multiple-select" => Ok(QuestionType::MultipleSelect),
            "para" | "essay" => Ok(QuestionType::Essay),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Soft-delete state. Deleted rows stay in the store but are hidden from
/// default lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Stored choice id. Submitted choices may omit it.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub choice_text: String,
    /// Correctness flag, encoded as `0`/`1` on the wire.
    #[serde(default, with = "flag")]
    pub is_corrected: bool,
}

impl Choice {
    pub fn new(id: i64, text: impl Into<String>, is_corrected: bool) -> Self {
        Self {
            id: Some(id),
            choice_text: text.into(),
            is_corrected,
        }
    }
}

/// A question in the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    #[serde(default)]
    pub question_text: String,
    pub difficulty_level: Difficulty,
    #[serde(default)]
    pub question_type: QuestionType,
    /// Derived from `difficulty_level` when the question is saved.
    #[serde(default)]
    pub point: u32,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub part_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl Question {
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// Look up one of this question's stored choices by id.
    pub fn choice(&self, id: i64) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == Some(id))
    }

    /// Ids of the choices flagged correct.
    pub fn correct_choice_ids(&self) -> Vec<i64> {
        self.choices
            .iter()
            .filter(|c| c.is_corrected)
            .filter_map(|c| c.id)
            .collect()
    }
}

/// A user's submission for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    /// May be absent or negative in malformed submissions.
    #[serde(default)]
    pub question_id: Option<i64>,
    /// The choices as the user marked them.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Point weight carried by the submission itself.
    #[serde(default)]
    pub point: i32,
}

/// Authoritative point weight of a question inside an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionPoint {
    pub question_id: i64,
    pub point: i32,
}

/// A submitted choice paired with its real correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceCorrect {
    pub choice: Choice,
    #[serde(with = "flag")]
    pub is_real_correct: bool,
}

impl ChoiceCorrect {
    /// Whether the user's claim about this choice matches the stored flag.
    pub fn is_matching(&self) -> bool {
        self.choice.is_corrected == self.is_real_correct
    }
}

/// Reconciliation result for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceList {
    pub question: Question,
    pub point: i32,
    pub choices: Vec<ChoiceCorrect>,
}

impl ChoiceList {
    /// A question is answered correctly when there is something to compare
    /// and every submitted flag agrees with the stored one.
    pub fn is_correct(&self) -> bool {
        !self.choices.is_empty() && self.choices.iter().all(ChoiceCorrect::is_matching)
    }
}

/// An exam definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    /// Duration in minutes.
    #[serde(default)]
    pub duration_exam: u32,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub begin_exam: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_exam: Option<DateTime<Utc>>,
    /// Serialized question set: a JSON array of [`ExamQuestionPoint`].
    #[serde(default = "empty_question_data")]
    pub question_data: String,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

fn empty_question_data() -> String {
    "[]".to_string()
}

impl Exam {
    /// Exam duration in seconds, the initial remaining time of an attempt.
    pub fn duration_seconds(&self) -> i64 {
        i64::from(self.duration_exam) * 60
    }

    /// Decode the serialized question set.
    pub fn question_points(&self) -> Result<Vec<ExamQuestionPoint>, ExamError> {
        if self.question_data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.question_data).map_err(|e| ExamError::InvalidQuestionData {
            exam_id: self.id,
            reason: e.to_string(),
        })
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            created_date: None,
            lifecycle: Lifecycle::Active,
        }
    }
}

/// Score of an attempt.
///
/// Stored and serialized as a float where `-1.0` means "not yet graded".
/// A graded score of exactly `-1.0` therefore cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Grade {
    #[default]
    Ungraded,
    Graded(f64),
}

impl Grade {
    /// Float encoding of [`Grade::Ungraded`].
    pub const SENTINEL: f64 = -1.0;

    pub fn from_sentinel(value: f64) -> Self {
        if value == Self::SENTINEL {
            Grade::Ungraded
        } else {
            Grade::Graded(value)
        }
    }

    pub fn as_sentinel(self) -> f64 {
        match self {
            Grade::Ungraded => Self::SENTINEL,
            Grade::Graded(v) => v,
        }
    }

    pub fn is_graded(self) -> bool {
        matches!(self, Grade::Graded(_))
    }

    pub fn points(self) -> Option<f64> {
        match self {
            Grade::Ungraded => None,
            Grade::Graded(v) => Some(v),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Ungraded => write!(f, "ungraded"),
            Grade::Graded(v) => write!(f, "{v:.2}"),
        }
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_sentinel())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.map(Grade::from_sentinel).unwrap_or_default())
    }
}

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Finished,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::NotStarted => write!(f, "not started"),
            AttemptStatus::InProgress => write!(f, "in progress"),
            AttemptStatus::Finished => write!(f, "finished"),
        }
    }
}

/// One user's attempt at one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamUser {
    pub id: i64,
    pub exam_id: i64,
    /// Course of the exam, copied when the attempt is created.
    #[serde(default)]
    pub course_id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub is_started: bool,
    #[serde(default)]
    pub is_finished: bool,
    /// Seconds left. Not validated; may be negative.
    #[serde(default)]
    pub remaining_time: i64,
    #[serde(default)]
    pub total_point: Grade,
    #[serde(default)]
    pub time_finish: Option<DateTime<Utc>>,
}

impl ExamUser {
    pub fn status(&self) -> AttemptStatus {
        if self.is_finished {
            AttemptStatus::Finished
        } else if self.is_started {
            AttemptStatus::InProgress
        } else {
            AttemptStatus::NotStarted
        }
    }
}

/// Serde adapter for the `0`/`1` correctness encoding. Also accepts booleans.
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => b,
            Raw::Int(i) => i != 0,
        })
    }
}
