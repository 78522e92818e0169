pub mod assign;
pub mod attempts;
pub mod exams;
pub mod grade;
pub mod init;
pub mod stats;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};

use examdesk_core::config::{load_config_from, ExamdeskConfig};
use examdesk_core::fixture::{parse_fixture, Fixture, FixtureEditor};
use examdesk_core::model::ExamUser;

/// Load config, then the fixture named on the command line or in config.
/// Also returns the fixture's path so commands can write changes back.
pub(crate) fn load_context(
    fixture: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(ExamdeskConfig, PathBuf, Fixture)> {
    let config = load_config_from(config_path.as_deref())?;
    let path = fixture
        .or_else(|| config.default_fixture.clone())
        .context("no fixture given: pass --fixture or set default_fixture in examdesk.toml")?;
    let fixture = parse_fixture(&path)?;
    Ok((config, path, fixture))
}

/// Write changed attempts back into the fixture file.
pub(crate) fn save_attempts(path: &Path, attempts: &[ExamUser]) -> Result<()> {
    let mut editor = FixtureEditor::open(path)?;
    for attempt in attempts {
        editor.upsert_attempt(attempt)?;
    }
    editor.save()?;
    tracing::info!(count = attempts.len(), "saved attempts to {}", path.display());
    Ok(())
}

/// Parse `--now`, falling back to the current time.
pub(crate) fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --now timestamp: {s:?}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

pub(crate) fn attempts_table(attempts: &[ExamUser]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Exam",
        "User",
        "Status",
        "Remaining",
        "Total",
        "Finished at",
    ]);

    for a in attempts {
        table.add_row(vec![
            Cell::new(a.id),
            Cell::new(a.exam_id),
            Cell::new(&a.username),
            Cell::new(a.status()),
            Cell::new(format!("{}s", a.remaining_time)),
            Cell::new(a.total_point),
            Cell::new(
                a.time_finish
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    table
}
