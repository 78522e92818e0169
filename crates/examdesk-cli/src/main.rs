//! examdesk CLI: grade submissions, manage attempts, and print dashboard
//! statistics from a fixture.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "examdesk", version, about = "Exam scoring and statistics toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate fixture TOML files
    Validate {
        /// Path to a fixture file or directory
        #[arg(long)]
        fixture: PathBuf,
    },

    /// Grade a submission against the fixture's question bank
    Grade {
        /// Fixture file (defaults to `default_fixture` from config)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Submission JSON with examId, username and answers
        #[arg(long)]
        answers: PathBuf,

        /// Directory to save the grading report in
        #[arg(long)]
        output: Option<PathBuf>,

        /// Earlier report of the same submission to compare against
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Grade without writing the finished attempt back to the fixture
        #[arg(long)]
        dry_run: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print dashboard statistics
    Stats {
        /// Fixture file (defaults to `default_fixture` from config)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Reference timezone offset, e.g. +07:00
        #[arg(long)]
        utc_offset: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List exam attempts
    Attempts {
        /// Fixture file (defaults to `default_fixture` from config)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Only attempts at this exam
        #[arg(long)]
        exam: Option<i64>,

        /// Only attempts by this user
        #[arg(long)]
        user: Option<String>,

        /// Only finished attempts
        #[arg(long)]
        finished: bool,

        /// Finished attempts of --user at exams of this course
        #[arg(long, requires = "user", conflicts_with = "exam")]
        course: Option<i64>,

        /// With --course: graded instead of finished attempts
        #[arg(long, requires = "course")]
        graded: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assign an exam to users, creating fresh attempts
    Assign {
        /// Fixture file (defaults to `default_fixture` from config)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Exam to assign
        #[arg(long)]
        exam: i64,

        /// Comma-separated usernames (default: all active users)
        #[arg(long)]
        users: Option<String>,

        /// Show the new attempts without writing them to the fixture
        #[arg(long)]
        dry_run: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List exams, optionally canceling one
    Exams {
        /// Fixture file (defaults to `default_fixture` from config)
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Only exams created by this user
        #[arg(long)]
        creator: Option<String>,

        /// Cancel the exam with this id before listing
        #[arg(long)]
        cancel: Option<i64>,

        /// Cancel without writing the change to the fixture
        #[arg(long, requires = "cancel")]
        dry_run: bool,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample fixture
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("examdesk=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { fixture } => commands::validate::execute(fixture),
        Commands::Grade {
            fixture,
            answers,
            output,
            baseline,
            dry_run,
            format,
            config,
        } => commands::grade::execute(fixture, answers, output, baseline, dry_run, format, config),
        Commands::Stats {
            fixture,
            now,
            utc_offset,
            format,
            config,
        } => commands::stats::execute(fixture, now, utc_offset, format, config),
        Commands::Attempts {
            fixture,
            exam,
            user,
            finished,
            course,
            graded,
            format,
            config,
        } => commands::attempts::execute(
            fixture,
            commands::attempts::Filter {
                exam,
                user,
                finished,
                course,
                graded,
            },
            format,
            config,
        ),
        Commands::Assign {
            fixture,
            exam,
            users,
            dry_run,
            format,
            config,
        } => commands::assign::execute(fixture, exam, users, dry_run, format, config),
        Commands::Exams {
            fixture,
            creator,
            cancel,
            dry_run,
            format,
            config,
        } => commands::exams::execute(fixture, creator, cancel, dry_run, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
