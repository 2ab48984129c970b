mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paiza-cli")]
#[command(about = "Paiza CLI - Run source files on the remote runner and judge test cases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file once
    Run {
        /// Source file to run
        #[arg(short, long)]
        file: PathBuf,

        /// Runner language id (detected from the file extension when omitted)
        #[arg(short, long)]
        lang: Option<String>,

        /// File whose contents are fed to stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Give up after this many milliseconds
        #[arg(long)]
        max_wait_ms: Option<u64>,

        /// Delay between status checks in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// Run a source file against every test case in a JSON file
    Test {
        /// Source file to run
        #[arg(short, long)]
        file: PathBuf,

        /// JSON array of {"input": ..., "expected_output": ...}
        #[arg(short, long)]
        cases: PathBuf,

        /// Runner language id (detected from the file extension when omitted)
        #[arg(short, long)]
        lang: Option<String>,

        /// Give up on each test case after this many milliseconds
        #[arg(long)]
        max_wait_ms: Option<u64>,

        /// Delay between status checks in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },

    /// List supported languages
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            lang,
            input,
            max_wait_ms,
            poll_interval_ms,
        } => {
            commands::run_file(
                &file,
                lang.as_deref(),
                input.as_deref(),
                max_wait_ms,
                poll_interval_ms,
            )
            .await?;
        }
        Commands::Test {
            file,
            cases,
            lang,
            max_wait_ms,
            poll_interval_ms,
        } => {
            commands::test_file(&file, &cases, lang.as_deref(), max_wait_ms, poll_interval_ms)
                .await?;
        }
        Commands::Languages => {
            commands::list_languages();
        }
    }

    Ok(())
}
