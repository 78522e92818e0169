//! Grading reports with JSON persistence and re-grade comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Exam;
use crate::scoring::ScoreSheet;

/// The graded outcome of one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub exam: ExamSummary,
    pub username: String,
    pub sheet: ScoreSheet,
}

/// Summary of the graded exam (without its question set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: i64,
    pub title: String,
    pub question_count: usize,
}

impl GradingReport {
    pub fn new(exam: &Exam, username: &str, sheet: ScoreSheet, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            exam: ExamSummary {
                id: exam.id,
                title: exam.title.clone(),
                question_count: sheet.questions.len(),
            },
            username: username.to_string(),
            sheet,
        }
    }

    /// Conventional file name: `<exam id>-<username>.json`.
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.exam.id, self.username)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this grading against an earlier one of the same submission,
    /// e.g. after the answer key was corrected.
    pub fn compare(&self, baseline: &GradingReport) -> RegradeReport {
        let mut changes = Vec::new();
        let mut unchanged = 0usize;

        for q in &self.sheet.questions {
            match baseline
                .sheet
                .questions
                .iter()
                .find(|b| b.question_id == q.question_id)
            {
                Some(b) if b.earned != q.earned => changes.push(GradeChange {
                    question_id: q.question_id,
                    before: b.earned,
                    after: q.earned,
                }),
                Some(_) => unchanged += 1,
                None => changes.push(GradeChange {
                    question_id: q.question_id,
                    before: 0,
                    after: q.earned,
                }),
            }
        }

        RegradeReport {
            before_total: baseline.sheet.total_point,
            after_total: self.sheet.total_point,
            changes,
            unchanged,
        }
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## {} ({})\n\n**Student:** {}  \n**Score:** {} / {} ({:.1}%)\n\n",
            self.exam.title,
            self.exam.id,
            self.username,
            self.sheet.total_point,
            self.sheet.max_point,
            self.sheet.ratio() * 100.0
        ));

        md.push_str("| Question | Type | Points | Earned | Result |\n");
        md.push_str("|----------|------|--------|--------|--------|\n");
        for q in &self.sheet.questions {
            let result = if q.needs_review {
                "review"
            } else if q.correct {
                "correct"
            } else {
                "wrong"
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                q.question_id, q.question_type, q.point, q.earned, result
            ));
        }

        let review = self.sheet.needs_review();
        if !review.is_empty() {
            let ids: Vec<String> = review.iter().map(i64::to_string).collect();
            md.push_str(&format!("\n**Needs manual review:** {}\n", ids.join(", ")));
        }

        md
    }
}

/// Result of comparing two gradings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeReport {
    pub before_total: i64,
    pub after_total: i64,
    /// Questions whose earned points differ.
    pub changes: Vec<GradeChange>,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeChange {
    pub question_id: i64,
    pub before: i32,
    pub after: i32,
}

impl RegradeReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let mut md = format!(
            "**Total:** {} -> {} ({} questions changed, {} unchanged)\n",
            self.before_total,
            self.after_total,
            self.changes.len(),
            self.unchanged
        );
        if self.has_changes() {
            md.push_str("\n| Question | Before | After |\n");
            md.push_str("|----------|--------|-------|\n");
            for c in &self.changes {
                md.push_str(&format!("| {} | {} | {} |\n", c.question_id, c.before, c.after));
            }
        }
        md
    }
}
