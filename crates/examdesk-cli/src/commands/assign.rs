//! The `examdesk assign` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use examdesk_core::attempts::AttemptTracker;
use examdesk_core::model::User;

use super::{attempts_table, load_context, save_attempts};

pub fn execute(
    fixture: Option<PathBuf>,
    exam_id: i64,
    users: Option<String>,
    dry_run: bool,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let (_config, path, fixture) = load_context(fixture, config)?;

    let exam = fixture
        .exam(exam_id)
        .with_context(|| format!("unknown exam {exam_id}"))?;

    let roster: Vec<User> = match users {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                fixture
                    .user(name)
                    .cloned()
                    .with_context(|| format!("unknown user {name}"))
            })
            .collect::<Result<_>>()?,
        None => fixture.active_users(),
    };

    let store = fixture.attempt_store();
    let tracker = AttemptTracker::new(&store);
    let created = tracker.create(Some(exam), Some(roster.as_slice()))?;
    if !dry_run && !created.is_empty() {
        save_attempts(&path, &created)?;
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    }

    println!(
        "{} \"{}\" to {} user(s), {} minutes each",
        if dry_run { "Would assign" } else { "Assigned" },
        exam.title,
        created.len(),
        exam.duration_exam
    );
    if !created.is_empty() {
        println!("{}", attempts_table(&created));
    }
    if dry_run {
        println!("Dry run: {} left unchanged.", path.display());
    }

    Ok(())
}
