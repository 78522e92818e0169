//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "../../fixtures/sample.toml";
const ANSWERS: &str = "../../fixtures/answers.json";

fn examdesk() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examdesk").unwrap();
    cmd.env_remove("EXAMDESK_UTC_OFFSET");
    cmd
}

/// A writable copy of the sample fixture for commands that save back to it.
fn sample_copy(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sample.toml");
    std::fs::copy(SAMPLE, &path).unwrap();
    path
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn validate_sample_fixture() {
    examdesk()
        .args(["validate", "--fixture", SAMPLE])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Rust 101 (4 users, 4 questions, 2 exams, 5 attempts)",
        ))
        .stdout(predicate::str::contains("All fixtures valid"));
}

#[test]
fn validate_directory() {
    examdesk()
        .args(["validate", "--fixture", "../../fixtures"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust 101"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[fixture]
name = "Broken"

[[questions]]
id = 1
text = "Pick one"
difficulty = "easy"

[[exams]]
id = 1
title = "Quiz"
duration_minutes = 10
questions = [{ question_id = 7, point = 5 }]
"#,
    )
    .unwrap();

    examdesk()
        .args(["validate", "--fixture"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[question 1] WARNING: no choice is marked correct"))
        .stdout(predicate::str::contains("[exam 1] WARNING: references unknown question 7"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    examdesk()
        .args(["validate", "--fixture", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn stats_text_output() {
    examdesk()
        .args(["stats", "--fixture", SAMPLE, "--now", "2026-10-14T12:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dashboard for Rust 101"))
        .stdout(predicate::str::contains("+200.0%"))
        .stdout(predicate::str::contains(
            "Attempts, last 7 days (oldest first): 1, 0, 0, 0, 0, 1, 1",
        ));
}

#[test]
fn stats_json_counts_weeks() {
    let stats = json_stdout(examdesk().args([
        "stats",
        "--fixture",
        SAMPLE,
        "--now",
        "2026-10-14T12:00:00Z",
        "--format",
        "json",
    ]));

    assert_eq!(stats["exams"]["total"], 2);
    assert_eq!(stats["exams"]["change"]["percent"], 0.0);
    assert_eq!(stats["questions"]["change"]["thisWeek"], 3);
    assert_eq!(stats["questions"]["change"]["lastWeek"], 1);
    assert_eq!(stats["accounts"]["total"], 4);
    assert_eq!(stats["accounts"]["change"]["percent"], 100.0);
    assert_eq!(stats["attempts"]["total"], 5);
    assert_eq!(stats["attempts"]["change"]["thisWeek"], 2);
    assert_eq!(
        stats["attemptsLastSevenDays"],
        serde_json::json!([1, 0, 0, 0, 0, 1, 1])
    );
}

#[test]
fn stats_week_depends_on_reference_offset() {
    // Sunday 20:00 UTC is already Monday morning at +07:00.
    let now = "2026-10-18T20:00:00Z";

    let utc = json_stdout(examdesk().args([
        "stats", "--fixture", SAMPLE, "--now", now, "--format", "json",
    ]));
    assert_eq!(utc["attempts"]["change"]["thisWeek"], 2);
    assert_eq!(utc["attempts"]["change"]["lastWeek"], 1);

    let local = json_stdout(examdesk().args([
        "stats",
        "--fixture",
        SAMPLE,
        "--now",
        now,
        "--utc-offset",
        "+07:00",
        "--format",
        "json",
    ]));
    assert_eq!(local["attempts"]["change"]["thisWeek"], 0);
    assert_eq!(local["attempts"]["change"]["lastWeek"], 2);
    assert_eq!(local["attempts"]["change"]["percent"], -100.0);
    assert_eq!(
        local["attemptsLastSevenDays"],
        serde_json::json!([1, 1, 0, 0, 0, 0, 0])
    );
}

#[test]
fn stats_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    let fixture = std::fs::canonicalize(SAMPLE).unwrap();
    let config = dir.path().join("examdesk.toml");
    std::fs::write(
        &config,
        format!(
            "utc_offset = \"+07:00\"\ndefault_fixture = {:?}\n",
            fixture.display().to_string()
        ),
    )
    .unwrap();

    let stats = json_stdout(
        examdesk()
            .args(["stats", "--now", "2026-10-18T20:00:00Z", "--format", "json", "--config"])
            .arg(&config),
    );
    assert_eq!(stats["attempts"]["change"]["thisWeek"], 0);
}

#[test]
fn stats_without_fixture_fails() {
    let dir = TempDir::new().unwrap();
    examdesk()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no fixture given"));
}

#[test]
fn stats_rejects_bad_now() {
    examdesk()
        .args(["stats", "--fixture", SAMPLE, "--now", "last tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --now timestamp"));
}

#[test]
fn grade_text_output() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["grade", "--answers", ANSWERS, "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam: Rust Fundamentals Midterm (1)"))
        .stdout(predicate::str::contains("Score: 15 / 40 (37.5%)"))
        .stdout(predicate::str::contains("Needs manual review: 4"))
        .stdout(predicate::str::contains(
            "Attempt #1 recorded as finished with 15.00",
        ));

    // The new grade replaces the 30 points on file.
    let attempts = json_stdout(
        examdesk()
            .args(["attempts", "--user", "alice", "--exam", "1", "--format", "json", "--fixture"])
            .arg(&fixture),
    );
    assert_eq!(attempts[0]["id"], 1);
    assert_eq!(attempts[0]["totalPoint"], 15.0);

    let content = std::fs::read_to_string(&fixture).unwrap();
    assert!(content.contains("title = \"Rust Fundamentals Midterm\""));
}

#[test]
fn grade_dry_run_leaves_fixture_alone() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);
    let before = std::fs::read_to_string(&fixture).unwrap();

    examdesk()
        .args(["grade", "--answers", ANSWERS, "--dry-run", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Attempt #1 would be recorded as finished with 15.00 (dry run)",
        ));

    assert_eq!(std::fs::read_to_string(&fixture).unwrap(), before);
}

#[test]
fn grade_json_output() {
    let report = json_stdout(examdesk().args([
        "grade", "--fixture", SAMPLE, "--answers", ANSWERS, "--dry-run", "--format", "json",
    ]));

    assert_eq!(report["username"], "alice");
    assert_eq!(report["exam"]["id"], 1);
    assert_eq!(report["sheet"]["total_point"], 15);
    assert_eq!(report["sheet"]["max_point"], 40);
    let correct: Vec<bool> = report["sheet"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["correct"].as_bool().unwrap())
        .collect();
    assert_eq!(correct, vec![true, true, false, false]);
}

#[test]
fn grade_saves_and_compares_reports() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["grade", "--answers", ANSWERS, "--fixture"])
        .arg(&fixture)
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to"));

    let saved = dir.path().join("1-alice.json");
    assert!(saved.exists());

    examdesk()
        .args(["grade", "--answers", ANSWERS, "--fixture"])
        .arg(&fixture)
        .arg("--baseline")
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "**Total:** 15 -> 15 (0 questions changed, 4 unchanged)",
        ));
}

#[test]
fn grade_unknown_question_aborts() {
    let dir = TempDir::new().unwrap();
    let answers = dir.path().join("answers.json");
    std::fs::write(
        &answers,
        r#"{"examId": 1, "username": "bob", "answers": [
            {"questionId": 1, "point": 5, "choices": []},
            {"questionId": 999, "point": 5, "choices": []}
        ]}"#,
    )
    .unwrap();

    examdesk()
        .args(["grade", "--fixture", SAMPLE, "--answers"])
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("question not found: 999"));
}

#[test]
fn grade_unknown_exam_fails() {
    let dir = TempDir::new().unwrap();
    let answers = dir.path().join("answers.json");
    std::fs::write(&answers, r#"{"examId": 42, "username": "bob"}"#).unwrap();

    examdesk()
        .args(["grade", "--fixture", SAMPLE, "--answers"])
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown exam 42"));
}

#[test]
fn attempts_filters() {
    examdesk()
        .args(["attempts", "--fixture", SAMPLE, "--exam", "1", "--finished"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 attempt(s)"));

    examdesk()
        .args(["attempts", "--fixture", SAMPLE, "--exam", "1", "--user", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in progress"))
        .stdout(predicate::str::contains("1 attempt(s)"));

    examdesk()
        .args(["attempts", "--fixture", SAMPLE, "--user", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No attempts found."));
}

#[test]
fn attempts_completed_in_course() {
    let attempts = json_stdout(examdesk().args([
        "attempts", "--fixture", SAMPLE, "--user", "alice", "--course", "101", "--format", "json",
    ]));
    let ids: Vec<i64> = attempts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 4]);

    let graded = json_stdout(examdesk().args([
        "attempts", "--fixture", SAMPLE, "--user", "bob", "--course", "101", "--graded", "--format",
        "json",
    ]));
    assert_eq!(graded.as_array().unwrap().len(), 1);
}

#[test]
fn assign_creates_fresh_attempts() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    let created = json_stdout(
        examdesk()
            .args(["assign", "--exam", "2", "--format", "json", "--fixture"])
            .arg(&fixture),
    );
    let created = created.as_array().unwrap();
    // Deleted users are not assigned.
    assert_eq!(created.len(), 3);
    for a in created {
        assert_eq!(a["remainingTime"], 1200);
        assert_eq!(a["totalPoint"], -1.0);
        assert_eq!(a["isStarted"], false);
        assert_eq!(a["isFinished"], false);
    }
    assert_eq!(created[0]["id"], 6);
}

#[test]
fn assign_explicit_users() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["assign", "--exam", "1", "--users", "alice, bob", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Assigned \"Rust Fundamentals Midterm\" to 2 user(s), 45 minutes each",
        ));

    examdesk()
        .args(["assign", "--fixture", SAMPLE, "--exam", "1", "--users", "alice,zed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown user zed"));
}

#[test]
fn assign_then_attempts_lists_new_attempts() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["assign", "--exam", "1", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Assigned \"Rust Fundamentals Midterm\" to 3 user(s), 45 minutes each",
        ));

    examdesk()
        .args(["attempts", "--exam", "1", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("not started"))
        .stdout(predicate::str::contains("6 attempt(s)"));

    let fresh = json_stdout(
        examdesk()
            .args(["attempts", "--exam", "1", "--user", "carol", "--format", "json", "--fixture"])
            .arg(&fixture),
    );
    let fresh = fresh.as_array().unwrap();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[1]["remainingTime"], 2700);
    assert_eq!(fresh[1]["isStarted"], false);

    // Assigned attempts get ids after the ones already on file.
    examdesk()
        .args(["validate", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("8 attempts"));
}

#[test]
fn assign_dry_run_leaves_fixture_alone() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["assign", "--exam", "1", "--dry-run", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would assign"))
        .stdout(predicate::str::contains("left unchanged"));

    examdesk()
        .args(["attempts", "--exam", "1", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 attempt(s)"));
}

#[test]
fn exams_lists_and_filters_by_creator() {
    examdesk()
        .args(["exams", "--fixture", SAMPLE])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ownership Quiz"))
        .stdout(predicate::str::contains("2 exam(s)"));

    examdesk()
        .args(["exams", "--fixture", SAMPLE, "--creator", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No exams found."));

    let mine = json_stdout(examdesk().args([
        "exams", "--fixture", SAMPLE, "--creator", "lecturer", "--format", "json",
    ]));
    assert_eq!(mine.as_array().unwrap().len(), 2);
}

#[test]
fn exams_cancel_is_saved() {
    let dir = TempDir::new().unwrap();
    let fixture = sample_copy(&dir);

    examdesk()
        .args(["exams", "--cancel", "1", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stderr(predicate::str::contains("Canceled exam 1"))
        .stdout(predicate::str::contains("canceled"));

    let exams = json_stdout(
        examdesk()
            .args(["exams", "--format", "json", "--fixture"])
            .arg(&fixture),
    );
    assert_eq!(exams[0]["canceled"], true);
    assert_eq!(exams[1]["canceled"], false);

    examdesk()
        .args(["exams", "--cancel", "99", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stderr(predicate::str::contains("No exam 99; nothing canceled"));
}

#[test]
fn assign_unknown_exam_fails() {
    examdesk()
        .args(["assign", "--fixture", SAMPLE, "--exam", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown exam 99"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    examdesk()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examdesk.toml"))
        .stdout(predicate::str::contains("Created fixtures/example.toml"));

    assert!(dir.path().join("examdesk.toml").exists());
    assert!(dir.path().join("fixtures/example.toml").exists());

    // The generated config and fixture work together.
    examdesk()
        .current_dir(dir.path())
        .args(["stats", "--now", "2026-01-07T12:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dashboard for Example"));

    examdesk()
        .current_dir(dir.path())
        .args(["validate", "--fixture", "fixtures/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All fixtures valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    examdesk().current_dir(dir.path()).arg("init").assert().success();

    examdesk()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
