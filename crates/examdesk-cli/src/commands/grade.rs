//! The `examdesk grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};

use examdesk_core::attempts::AttemptTracker;
use examdesk_core::report::GradingReport;
use examdesk_core::scoring::{score_answers, Submission};

use super::{load_context, save_attempts};

pub fn execute(
    fixture: Option<PathBuf>,
    answers_path: PathBuf,
    output: Option<PathBuf>,
    baseline: Option<PathBuf>,
    dry_run: bool,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let (_config, path, fixture) = load_context(fixture, config)?;

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let submission: Submission = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let exam = fixture
        .exam(submission.exam_id)
        .with_context(|| format!("unknown exam {}", submission.exam_id))?;
    let points = exam.question_points()?;

    let questions = fixture.question_store();
    let sheet = score_answers(&questions, &submission.answers, &points)
        .with_context(|| format!("failed to grade submission of {}", submission.username))?;

    tracing::info!(
        exam_id = exam.id,
        username = %submission.username,
        total = sheet.total_point,
        "graded submission"
    );

    let now = Utc::now();
    let attempts = fixture.attempt_store();
    let tracker = AttemptTracker::new(&attempts);
    let attempt = match tracker.find_by_exam_and_user(exam.id, &submission.username)? {
        Some(a) => tracker.finish(a.id, sheet.grade(), now)?,
        None => None,
    };
    if let (Some(a), false) = (&attempt, dry_run) {
        save_attempts(&path, std::slice::from_ref(a))?;
    }

    let report = GradingReport::new(exam, &submission.username, sheet, now);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    if format == "text" {
        match &attempt {
            Some(a) if dry_run => println!(
                "Attempt #{} would be recorded as {} with {} (dry run)",
                a.id,
                a.status(),
                a.total_point
            ),
            Some(a) => println!("Attempt #{} recorded as {} with {}", a.id, a.status(), a.total_point),
            None => println!("No attempt on record for {} at exam {}", report.username, exam.id),
        }
    }

    if let Some(baseline_path) = baseline {
        let baseline = GradingReport::load_json(&baseline_path)?;
        let diff = report.compare(&baseline);
        match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&diff)?),
            _ => println!("\n{}", diff.to_markdown()),
        }
    }

    if let Some(dir) = output {
        let path = dir.join(report.file_name());
        report.save_json(&path)?;
        eprintln!("Report saved to {}", path.display());
    }

    Ok(())
}

fn print_text(report: &GradingReport) {
    println!("Exam: {} ({})", report.exam.title, report.exam.id);
    println!("Student: {}", report.username);

    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Points", "Earned", "Result"]);
    for q in &report.sheet.questions {
        let result = if q.needs_review {
            "review"
        } else if q.correct {
            "correct"
        } else {
            "wrong"
        };
        table.add_row(vec![
            Cell::new(q.question_id),
            Cell::new(q.question_type),
            Cell::new(q.point),
            Cell::new(q.earned),
            Cell::new(result),
        ]);
    }
    println!("{table}");

    println!(
        "Score: {} / {} ({:.1}%)",
        report.sheet.total_point,
        report.sheet.max_point,
        report.sheet.ratio() * 100.0
    );
    let review = report.sheet.needs_review();
    if !review.is_empty() {
        let ids: Vec<String> = review.iter().map(i64::to_string).collect();
        println!("Needs manual review: {}", ids.join(", "));
    }
}
