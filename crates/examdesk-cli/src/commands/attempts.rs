//! The `examdesk attempts` command.

use std::path::PathBuf;

use anyhow::Result;

use examdesk_core::attempts::AttemptTracker;
use examdesk_core::store::AttemptStore;

use super::{attempts_table, load_context};

/// Which attempts to list.
pub struct Filter {
    pub exam: Option<i64>,
    pub user: Option<String>,
    pub finished: bool,
    pub course: Option<i64>,
    pub graded: bool,
}

pub fn execute(
    fixture: Option<PathBuf>,
    filter: Filter,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let (_config, _path, fixture) = load_context(fixture, config)?;
    let store = fixture.attempt_store();
    let tracker = AttemptTracker::new(&store);

    let mut attempts = match (&filter.course, &filter.exam, &filter.user) {
        (Some(course), _, Some(user)) if filter.graded => tracker.graded_exams(*course, user)?,
        (Some(course), _, Some(user)) => tracker.complete_exams(*course, user)?,
        (_, Some(exam), Some(user)) => tracker
            .find_by_exam_and_user(*exam, user)?
            .into_iter()
            .collect(),
        (_, Some(exam), None) if filter.finished => tracker.find_finished_by_exam(*exam)?,
        (_, Some(exam), None) => tracker.find_all_by_exam(*exam)?,
        (_, None, Some(user)) => tracker.find_by_username(user)?,
        (_, None, None) => store.attempts()?,
    };
    if filter.finished {
        attempts.retain(|a| a.is_finished);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&attempts)?);
        return Ok(());
    }

    if attempts.is_empty() {
        println!("No attempts found.");
    } else {
        println!("{}", attempts_table(&attempts));
        println!("{} attempt(s)", attempts.len());
    }

    Ok(())
}
