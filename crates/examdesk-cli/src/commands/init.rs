//! The `examdesk init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examdesk.toml").exists() {
        println!("examdesk.toml already exists, skipping.");
    } else {
        std::fs::write("examdesk.toml", SAMPLE_CONFIG)?;
        println!("Created examdesk.toml");
    }

    std::fs::create_dir_all("fixtures")?;
    let example_path = std::path::Path::new("fixtures/example.toml");
    if example_path.exists() {
        println!("fixtures/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_FIXTURE)?;
        println!("Created fixtures/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set utc_offset in examdesk.toml to your institution's timezone");
    println!("  2. Run: examdesk validate --fixture fixtures/example.toml");
    println!("  3. Run: examdesk stats");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examdesk configuration

# Reference timezone for "today" and "this week" in statistics.
utc_offset = "+00:00"

output_dir = "./examdesk-reports"
default_fixture = "fixtures/example.toml"
"#;

const EXAMPLE_FIXTURE: &str = r#"[fixture]
name = "Example"
description = "A minimal fixture to get started"

[[users]]
id = 1
username = "student"
created = "2026-01-05T09:00:00Z"

[[questions]]
id = 1
text = "Is 2 + 2 equal to 4?"
difficulty = "easy"
kind = "TF"

[[questions.choices]]
id = 1
text = "Yes"
correct = true

[[questions.choices]]
id = 2
text = "No"

[[questions]]
id = 2
text = "Describe your favourite data structure."
difficulty = "medium"
kind = "PARA"

[[exams]]
id = 1
title = "Warm-up"
duration_minutes = 10
questions = [
    { question_id = 1, point = 5 },
    { question_id = 2, point = 10 },
]
"#;
