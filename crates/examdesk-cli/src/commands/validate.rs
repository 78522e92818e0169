//! The `examdesk validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examdesk_core::fixture::{load_fixture_directory, parse_fixture, validate_fixture};

pub fn execute(fixture_path: PathBuf) -> Result<()> {
    let fixtures = if fixture_path.is_dir() {
        load_fixture_directory(&fixture_path)?
    } else {
        vec![parse_fixture(&fixture_path)?]
    };

    let mut total_warnings = 0;

    for fixture in &fixtures {
        println!(
            "Fixture: {} ({} users, {} questions, {} exams, {} attempts)",
            fixture.name,
            fixture.users.len(),
            fixture.questions.len(),
            fixture.exams.len(),
            fixture.attempts.len()
        );

        let warnings = validate_fixture(fixture);
        for w in &warnings {
            println!("  [{}] WARNING: {}", w.subject, w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All fixtures valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
