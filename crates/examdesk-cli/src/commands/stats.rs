//! The `examdesk stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examdesk_core::clock::FixedClock;
use examdesk_core::statistics::{parse_utc_offset, Calendar, Dashboard, EntityStats};

use super::{load_context, parse_now};

pub fn execute(
    fixture: Option<PathBuf>,
    now: Option<String>,
    utc_offset: Option<String>,
    format: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let (config, _path, fixture) = load_context(fixture, config)?;

    let calendar = match utc_offset {
        Some(s) => Calendar::with_offset(
            parse_utc_offset(&s).with_context(|| format!("invalid --utc-offset: {s:?}"))?,
        ),
        None => config.calendar()?,
    };
    let clock = FixedClock(parse_now(now.as_deref())?);

    let dashboard = Dashboard::compute(
        &fixture.exams,
        &fixture.questions,
        &fixture.users,
        &fixture.attempts,
        &calendar,
        &clock,
    );

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!(
        "Dashboard for {} at {} (UTC{})",
        fixture.name,
        dashboard.generated_at.to_rfc3339(),
        calendar.offset()
    );

    let mut table = Table::new();
    table.set_header(vec!["Entity", "Total", "This week", "Last week", "Change"]);
    let rows: [(&str, &EntityStats); 4] = [
        ("Exams", &dashboard.exams),
        ("Questions", &dashboard.questions),
        ("Accounts", &dashboard.accounts),
        ("Attempts", &dashboard.attempts),
    ];
    for (name, stats) in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(stats.total),
            Cell::new(stats.change.this_week),
            Cell::new(stats.change.last_week),
            Cell::new(format!("{:+.1}%", stats.change.percent)),
        ]);
    }
    println!("{table}");

    let days: Vec<String> = dashboard
        .attempts_last_seven_days
        .iter()
        .map(u64::to_string)
        .collect();
    println!("Attempts, last 7 days (oldest first): {}", days.join(", "));

    Ok(())
}
