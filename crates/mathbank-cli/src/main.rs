//! mathbank CLI: generate, verify, normalize and audit a math curriculum.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mathbank",
    version,
    about = "K-8 math curriculum generator and auditor"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and an example skill file
    Init,

    /// Validate skill TOML files
    Validate {
        /// Path to a skill file or directory
        #[arg(long)]
        skills: PathBuf,
    },

    /// Generate question sets from skill files and append them to the document
    Generate {
        /// Path to a skill file or directory
        #[arg(long)]
        skills: PathBuf,

        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// RNG seed, overrides skill files and config
        #[arg(long)]
        seed: Option<u64>,

        /// Questions per skill, overrides skill files and config
        #[arg(long)]
        count: Option<usize>,

        /// Print the generated sets instead of writing the document
        #[arg(long)]
        dry_run: bool,
    },

    /// Check stored answers against the arithmetic in each question
    Verify {
        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// Rewrite mismatched answers
        #[arg(long)]
        fix: bool,

        /// With --fix, delete questions whose answer can't be reconciled
        #[arg(long, requires = "fix")]
        delete_unfixable: bool,

        /// Absolute tolerance (default from config)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Save a JSON report of issues and changes
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Merge question sets with the same grade, topic and title
    Dedupe {
        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// Report merges without writing the document
        #[arg(long)]
        dry_run: bool,
    },

    /// Repair multiple-choice questions whose answer doesn't match an option
    Repair {
        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// Report repairs without writing the document
        #[arg(long)]
        dry_run: bool,
    },

    /// Audit the document for quality issues
    Audit {
        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// Output format: text, json, markdown, html, sarif
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit code 1 if any issue at or above this severity is found
        #[arg(long)]
        fail_on: Option<String>,
    },

    /// Compare two audit reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if new issues appeared
        #[arg(long)]
        fail_on_new_issues: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show set and question counts per grade and topic
    Stats {
        /// Curriculum document (default from config)
        #[arg(long)]
        document: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mathbank=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { skills } => commands::validate::execute(skills),
        Commands::Generate {
            skills,
            document,
            seed,
            count,
            dry_run,
        } => commands::generate::execute(skills, document, seed, count, dry_run, config),
        Commands::Verify {
            document,
            fix,
            delete_unfixable,
            tolerance,
            report,
        } => commands::verify::execute(document, fix, delete_unfixable, tolerance, report, config),
        Commands::Dedupe { document, dry_run } => {
            commands::dedupe::execute(document, dry_run, config)
        }
        Commands::Repair { document, dry_run } => {
            commands::repair::execute(document, dry_run, config)
        }
        Commands::Audit {
            document,
            format,
            output,
            fail_on,
        } => commands::audit::execute(document, format, output, fail_on, config),
        Commands::Compare {
            baseline,
            current,
            fail_on_new_issues,
            format,
        } => commands::compare::execute(baseline, current, fail_on_new_issues, format),
        Commands::Stats { document, format } => commands::stats::execute(document, format, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
