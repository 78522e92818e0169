//! The `examdesk exams` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examdesk_core::exams::ExamCatalog;
use examdesk_core::fixture::FixtureEditor;
use examdesk_core::model::Exam;

use super::load_context;

pub fn execute(
    fixture: Option<PathBuf>,
    creator: Option<String>,
    cancel: Option<i64>,
    dry_run: bool,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let (_config, path, fixture) = load_context(fixture, config)?;
    let store = fixture.exam_store();
    let catalog = ExamCatalog::new(&store);

    if let Some(id) = cancel {
        if catalog.cancel(id)? {
            if !dry_run {
                let mut editor = FixtureEditor::open(&path)?;
                editor.cancel_exam(id);
                editor.save()?;
            }
            eprintln!("Canceled exam {id}");
        } else {
            eprintln!("No exam {id}; nothing canceled");
        }
    }

    let exams = match creator.as_deref() {
        Some(username) => catalog.by_creator(username)?,
        None => catalog.all()?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&exams)?);
        return Ok(());
    }

    if exams.is_empty() {
        println!("No exams found.");
    } else {
        println!("{}", exams_table(&exams));
        println!("{} exam(s)", exams.len());
    }

    Ok(())
}

fn exams_table(exams: &[Exam]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Minutes", "Course", "Created by", "Status"]);

    for e in exams {
        table.add_row(vec![
            Cell::new(e.id),
            Cell::new(&e.title),
            Cell::new(e.duration_exam),
            Cell::new(e.course_id.map_or_else(|| "-".to_string(), |c| c.to_string())),
            Cell::new(e.created_by.as_deref().unwrap_or("-")),
            Cell::new(if e.canceled { "canceled" } else { "open" }),
        ]);
    }

    table
}
