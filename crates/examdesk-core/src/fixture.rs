//! TOML fixture loader.
//!
//! A fixture describes a small exam world: users, a question bank, exams and
//! attempts. It seeds the in-memory stores for the CLI and for tests.
//! Timestamps are RFC 3339 strings, e.g. `"2026-10-12T09:00:00Z"`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::memory::{MemoryAttemptStore, MemoryExamStore, MemoryQuestionStore};
use crate::model::{
    Choice, Difficulty, Exam, ExamQuestionPoint, ExamUser, Grade, Lifecycle, Question,
    QuestionType, User,
};

/// A loaded fixture.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    pub users: Vec<User>,
    pub questions: Vec<Question>,
    pub exams: Vec<Exam>,
    pub attempts: Vec<ExamUser>,
}

impl Fixture {
    pub fn exam(&self, id: i64) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == id)
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// Users that are not deleted.
    pub fn active_users(&self) -> Vec<User> {
        self.users
            .iter()
            .filter(|u| u.lifecycle == Lifecycle::Active)
            .cloned()
            .collect()
    }

    pub fn question_store(&self) -> MemoryQuestionStore {
        MemoryQuestionStore::with_questions(self.questions.iter().cloned())
    }

    pub fn exam_store(&self) -> MemoryExamStore {
        MemoryExamStore::with_exams(self.exams.iter().cloned())
    }

    pub fn attempt_store(&self) -> MemoryAttemptStore {
        MemoryAttemptStore::with_attempts(self.attempts.clone())
    }
}

// ---------------------------------------------------------------------------
// TOML shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlFixtureFile {
    fixture: TomlFixtureHeader,
    #[serde(default)]
    users: Vec<TomlUser>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    exams: Vec<TomlExam>,
    #[serde(default)]
    attempts: Vec<TomlAttempt>,
}

#[derive(Debug, Deserialize)]
struct TomlFixtureHeader {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlUser {
    id: i64,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: i64,
    text: String,
    difficulty: String,
    #[serde(default = "default_question_type")]
    kind: String,
    #[serde(default)]
    part_id: Option<i64>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    choices: Vec<TomlChoice>,
}

fn default_question_type() -> String {
    "MC".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlChoice {
    id: i64,
    text: String,
    #[serde(default)]
    correct: bool,
}

#[derive(Debug, Deserialize)]
struct TomlExam {
    id: i64,
    title: String,
    duration_minutes: u32,
    #[serde(default)]
    shuffle: bool,
    #[serde(default)]
    canceled: bool,
    #[serde(default)]
    begins: Option<String>,
    #[serde(default)]
    finishes: Option<String>,
    #[serde(default)]
    course_id: Option<i64>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    created: Option<String>,
    /// Structured question list. Takes precedence over `question_data`.
    #[serde(default)]
    questions: Vec<TomlExamQuestion>,
    /// Raw serialized question set, kept verbatim.
    #[serde(default)]
    question_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlExamQuestion {
    question_id: i64,
    point: i32,
}

#[derive(Debug, Deserialize)]
struct TomlAttempt {
    id: i64,
    exam_id: i64,
    username: String,
    #[serde(default)]
    started: bool,
    #[serde(default)]
    finished: bool,
    /// Seconds. Defaults to the full exam duration.
    #[serde(default)]
    remaining_time: Option<i64>,
    #[serde(default)]
    total_point: Option<f64>,
    #[serde(default)]
    finished_at: Option<String>,
}

fn parse_time(value: Option<&str>, what: &str) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("invalid timestamp for {what}: {s:?}"))
        })
        .transpose()
}

fn lifecycle(deleted: bool) -> Lifecycle {
    if deleted {
        Lifecycle::Deleted
    } else {
        Lifecycle::Active
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a single fixture file.
pub fn parse_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture file: {}", path.display()))?;

    parse_fixture_str(&content, path)
}

/// Parse fixture TOML from a string. `source_path` is only used in errors.
pub fn parse_fixture_str(content: &str, source_path: &Path) -> Result<Fixture> {
    let parsed: TomlFixtureFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let users = parsed
        .users
        .into_iter()
        .map(|u| {
            Ok(User {
                created_date: parse_time(u.created.as_deref(), &format!("user {}", u.id))?,
                id: u.id,
                username: u.username,
                email: u.email,
                lifecycle: lifecycle(u.deleted),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let difficulty_level: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            let question_type: QuestionType = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;

            Ok(Question {
                created_date: parse_time(q.created.as_deref(), &format!("question {}", q.id))?,
                id: q.id,
                question_text: q.text,
                difficulty_level,
                question_type,
                point: difficulty_level.point(),
                choices: q
                    .choices
                    .into_iter()
                    .map(|c| Choice::new(c.id, c.text, c.correct))
                    .collect(),
                part_id: q.part_id,
                created_by: q.created_by,
                lifecycle: lifecycle(q.deleted),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let exams = parsed
        .exams
        .into_iter()
        .map(|e| {
            let what = format!("exam {}", e.id);
            let question_data = if e.questions.is_empty() {
                e.question_data.unwrap_or_else(|| "[]".to_string())
            } else {
                let points: Vec<ExamQuestionPoint> = e
                    .questions
                    .iter()
                    .map(|q| ExamQuestionPoint {
                        question_id: q.question_id,
                        point: q.point,
                    })
                    .collect();
                serde_json::to_string(&points).context("failed to encode exam questions")?
            };

            Ok(Exam {
                begin_exam: parse_time(e.begins.as_deref(), &what)?,
                finish_exam: parse_time(e.finishes.as_deref(), &what)?,
                created_date: parse_time(e.created.as_deref(), &what)?,
                id: e.id,
                title: e.title,
                duration_exam: e.duration_minutes,
                shuffle: e.shuffle,
                canceled: e.canceled,
                question_data,
                course_id: e.course_id,
                created_by: e.created_by,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let attempts = parsed
        .attempts
        .into_iter()
        .map(|a| {
            let exam = exams.iter().find(|e| e.id == a.exam_id);
            Ok(ExamUser {
                time_finish: parse_time(a.finished_at.as_deref(), &format!("attempt {}", a.id))?,
                id: a.id,
                exam_id: a.exam_id,
                course_id: exam.and_then(|e| e.course_id),
                username: a.username,
                is_started: a.started || a.finished,
                is_finished: a.finished,
                remaining_time: a
                    .remaining_time
                    .unwrap_or_else(|| exam.map_or(0, Exam::duration_seconds)),
                total_point: a.total_point.map_or(Grade::Ungraded, Grade::from_sentinel),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Fixture {
        name: parsed.fixture.name,
        description: parsed.fixture.description,
        users,
        questions,
        exams,
        attempts,
    })
}

/// Recursively load all `.toml` fixtures from a directory. Files that fail
/// to parse are skipped with a warning.
pub fn load_fixture_directory(dir: &Path) -> Result<Vec<Fixture>> {
    let mut fixtures = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            fixtures.extend(load_fixture_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_fixture(&path) {
                Ok(fixture) => fixtures.push(fixture),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(fixtures)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Writes attempt and exam changes back into a fixture file. Comments and
/// layout of untouched entries are kept.
pub struct FixtureEditor {
    path: PathBuf,
    doc: toml_edit::DocumentMut,
}

impl FixtureEditor {
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture file: {}", path.display()))?;
        let doc = content
            .parse::<toml_edit::DocumentMut>()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Overwrite the `[[attempts]]` entry with the attempt's id, or append a
    /// new one.
    pub fn upsert_attempt(&mut self, attempt: &ExamUser) -> Result<()> {
        let tables = self.array_of_tables("attempts")?;
        let found = tables.iter().position(|t| table_id(t) == Some(attempt.id));
        let index = match found {
            Some(i) => i,
            None => {
                let mut table = toml_edit::Table::new();
                table["id"] = toml_edit::value(attempt.id);
                tables.push(table);
                tables.len() - 1
            }
        };
        let table = tables
            .get_mut(index)
            .with_context(|| format!("attempt {} missing after insert", attempt.id))?;

        table["exam_id"] = toml_edit::value(attempt.exam_id);
        table["username"] = toml_edit::value(attempt.username.as_str());
        table["started"] = toml_edit::value(attempt.is_started);
        table["finished"] = toml_edit::value(attempt.is_finished);
        table["remaining_time"] = toml_edit::value(attempt.remaining_time);
        match attempt.total_point.points() {
            Some(points) => table["total_point"] = toml_edit::value(points),
            None => {
                table.remove("total_point");
            }
        }
        match attempt.time_finish {
            Some(at) => {
                table["finished_at"] = toml_edit::value(at.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            None => {
                table.remove("finished_at");
            }
        }
        Ok(())
    }

    /// Mark an exam canceled. Returns `false` when the file has no exam with
    /// that id.
    pub fn cancel_exam(&mut self, exam_id: i64) -> bool {
        let Some(exams) = self
            .doc
            .get_mut("exams")
            .and_then(toml_edit::Item::as_array_of_tables_mut)
        else {
            return false;
        };
        match exams.iter_mut().find(|t| table_id(t) == Some(exam_id)) {
            Some(table) => {
                table["canceled"] = toml_edit::value(true);
                true
            }
            None => false,
        }
    }

    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.doc.to_string())
            .with_context(|| format!("failed to write fixture file: {}", self.path.display()))?;
        tracing::debug!("updated {}", self.path.display());
        Ok(())
    }

    fn array_of_tables(&mut self, key: &str) -> Result<&mut toml_edit::ArrayOfTables> {
        if !self.doc.contains_key(key) {
            self.doc.insert(
                key,
                toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new()),
            );
        }
        self.doc[key]
            .as_array_of_tables_mut()
            .with_context(|| format!("`{key}` is not an array of tables"))
    }
}

fn table_id(table: &toml_edit::Table) -> Option<i64> {
    table.get("id").and_then(toml_edit::Item::as_integer)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A warning from fixture validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The entity the warning is about, e.g. `question 3`.
    pub subject: String,
    pub message: String,
}

impl ValidationWarning {
    fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Check a fixture for inconsistencies that would make grading or attempt
/// tracking misbehave.
pub fn validate_fixture(fixture: &Fixture) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    let mut names = HashSet::new();
    for u in &fixture.users {
        if !seen.insert(u.id) {
            warnings.push(ValidationWarning::new(format!("user {}", u.id), "duplicate user ID"));
        }
        if !names.insert(u.username.as_str()) {
            warnings.push(ValidationWarning::new(
                format!("user {}", u.id),
                format!("duplicate username: {}", u.username),
            ));
        }
    }

    let mut seen = HashSet::new();
    for q in &fixture.questions {
        let subject = format!("question {}", q.id);
        if !seen.insert(q.id) {
            warnings.push(ValidationWarning::new(&subject, "duplicate question ID"));
        }
        if q.question_text.trim().is_empty() {
            warnings.push(ValidationWarning::new(&subject, "question text is empty"));
        }
        match q.question_type {
            QuestionType::Essay => {
                if !q.choices.is_empty() {
                    warnings.push(ValidationWarning::new(
                        &subject,
                        "essay question has choices; grading ignores them and leaves it for manual review",
                    ));
                }
            }
            _ => {
                if q.correct_choice_ids().is_empty() {
                    warnings.push(ValidationWarning::new(&subject, "no choice is marked correct"));
                }
                if q.question_type == QuestionType::TrueFalse && q.choices.len() != 2 {
                    warnings.push(ValidationWarning::new(
                        &subject,
                        format!("true/false question has {} choices", q.choices.len()),
                    ));
                }
            }
        }
        let mut choice_ids = HashSet::new();
        for c in &q.choices {
            if !choice_ids.insert(c.id) {
                warnings.push(ValidationWarning::new(
                    &subject,
                    format!("duplicate choice ID: {}", c.id.unwrap_or_default()),
                ));
            }
        }
    }

    let question_ids: HashSet<i64> = fixture.questions.iter().map(|q| q.id).collect();
    let mut seen = HashSet::new();
    for e in &fixture.exams {
        let subject = format!("exam {}", e.id);
        if !seen.insert(e.id) {
            warnings.push(ValidationWarning::new(&subject, "duplicate exam ID"));
        }
        if e.duration_exam == 0 {
            warnings.push(ValidationWarning::new(&subject, "duration is zero"));
        }
        match e.question_points() {
            Ok(points) => {
                for p in points.iter().filter(|p| !question_ids.contains(&p.question_id)) {
                    warnings.push(ValidationWarning::new(
                        &subject,
                        format!("references unknown question {}", p.question_id),
                    ));
                }
            }
            Err(err) => warnings.push(ValidationWarning::new(&subject, err.to_string())),
        }
    }

    let exam_ids: HashSet<i64> = fixture.exams.iter().map(|e| e.id).collect();
    let mut seen = HashSet::new();
    for a in &fixture.attempts {
        let subject = format!("attempt {}", a.id);
        if !seen.insert(a.id) {
            warnings.push(ValidationWarning::new(&subject, "duplicate attempt ID"));
        }
        if !exam_ids.contains(&a.exam_id) {
            warnings.push(ValidationWarning::new(
                &subject,
                format!("references unknown exam {}", a.exam_id),
            ));
        }
        if !names.contains(a.username.as_str()) {
            warnings.push(ValidationWarning::new(
                &subject,
                format!("references unknown user {}", a.username),
            ));
        }
        if a.is_finished && a.time_finish.is_none() {
            warnings.push(ValidationWarning::new(
                &subject,
                "finished attempt has no finish time and will not appear in weekly statistics",
            ));
        }
    }

    warnings
}
