// CLI commands for running code on the remote runner
use anyhow::{bail, Context, Result};
use paiza_common::config::ClientConfig;
use paiza_common::types::{
    BatchReport, ExecutionRequest, ExecutionResult, Language, LifecycleState, PhaseResult,
    TestCase, TestCaseOutcome, Verdict,
};
use paiza_runner::{executor, run_and_wait, PaizaClient};
use std::fs;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

/// Pick a runner language from a source file extension
fn detect_from_path(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "py" => Language::Python3,
        "js" | "mjs" | "cjs" => Language::JavaScript,
        "ts" => Language::TypeScript,
        "c" => Language::C,
        "cpp" | "cc" | "cxx" | "hpp" => Language::Cpp,
        "cs" => Language::CSharp,
        "java" => Language::Java,
        "kt" | "kts" => Language::Kotlin,
        "scala" => Language::Scala,
        "swift" => Language::Swift,
        "go" => Language::Go,
        "rs" => Language::Rust,
        "rb" => Language::Ruby,
        "php" => Language::Php,
        "pl" => Language::Perl,
        "sh" | "bash" => Language::Bash,
        "r" => Language::R,
        "hs" => Language::Haskell,
        "erl" => Language::Erlang,
        "ex" | "exs" => Language::Elixir,
        "clj" => Language::Clojure,
        "fs" | "fsx" => Language::FSharp,
        "vb" => Language::VisualBasic,
        "cob" | "cbl" => Language::Cobol,
        "d" => Language::D,
        "scm" => Language::Scheme,
        "lisp" | "cl" => Language::CommonLisp,
        "coffee" => Language::CoffeeScript,
        "m" => Language::ObjectiveC,
        "sql" => Language::MySql,
        "bf" => Language::Brainfuck,
        "txt" => Language::PlainText,
        _ => return None,
    };
    Some(language)
}

/// Resolve the language from an explicit id or the file extension
fn resolve_language(file: &Path, lang: Option<&str>) -> Result<Language> {
    match lang {
        Some(id) => Ok(id.parse::<Language>()?),
        None => detect_from_path(file).with_context(|| {
            format!(
                "Cannot detect language for {}; pass --lang (see `paiza-cli languages`)",
                file.display()
            )
        }),
    }
}

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Load test cases from a JSON array
fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test cases from {}", path.display()))?;
    let cases: Vec<TestCase> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test cases in {}", path.display()))?;
    debug!(path = %path.display(), test_cases = cases.len(), "Loaded test cases");
    Ok(cases)
}

fn client() -> Result<PaizaClient> {
    PaizaClient::new(ClientConfig::from_env()).context("Failed to create runner client")
}

fn print_phase(title: &str, phase: &PhaseResult) {
    if !phase.stdout.is_empty() {
        println!("[{} stdout]", title);
        println!("{}", phase.stdout.trim_end());
    }
    if !phase.stderr.is_empty() {
        println!("[{} stderr]", title);
        println!("{}", phase.stderr.trim_end());
    }
}

fn format_stats(phase: &PhaseResult) -> String {
    let time = phase
        .time_secs
        .map(|t| format!("{:.2}s", t))
        .unwrap_or_else(|| "-".to_string());
    let memory = phase
        .memory_bytes
        .map(|m| format!("{:.1}MB", m as f64 / 1_000_000.0))
        .unwrap_or_else(|| "-".to_string());
    format!("time {}, memory {}", time, memory)
}

fn print_result(result: &ExecutionResult) {
    if result.build.outcome.is_some() {
        print_phase("Build", &result.build);
    }
    print_phase("Run", &result.run);
    println!();
    println!(
        "  Result: {:?} (exit code {}, {})",
        result.run.outcome,
        result
            .run
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
        format_stats(&result.run)
    );
}

/// Run a single source file and print its output
pub async fn run_file(
    file: &Path,
    lang: Option<&str>,
    input: Option<&Path>,
    max_wait_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
) -> Result<()> {
    let language = resolve_language(file, lang)?;
    let source = read_source(file)?;
    let stdin = input
        .map(|p| fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display())))
        .transpose()?;

    let client = client()?;
    let options = client
        .run_options()
        .with_overrides(max_wait_ms, poll_interval_ms);
    let request = ExecutionRequest::new(source, language, stdin)?;
    debug!(
        language = %language,
        max_wait_ms = options.max_wait.as_millis() as u64,
        "Submitting run"
    );

    println!("🚀 Running {} ({})", file.display(), language.label());
    let result = run_and_wait(&client, &request, options).await?;
    print_result(&result);

    Ok(())
}

fn outcome_line(outcome: &TestCaseOutcome) -> String {
    let label = match (outcome.state, outcome.verdict) {
        (LifecycleState::Error, _) => "ERR".to_string(),
        (_, Some(verdict)) => verdict.to_string(),
        (_, None) => "--".to_string(),
    };
    let detail = match (&outcome.result, &outcome.error) {
        (_, Some(error)) => error.clone(),
        (Some(result), None) => format_stats(&result.run),
        (None, None) => String::new(),
    };
    format!("  #{:<3} {:<4} {}", outcome.index + 1, label, detail)
}

fn print_report(report: &BatchReport) {
    println!();
    for outcome in &report.outcomes {
        println!("{}", outcome_line(outcome));
        if let (Some(expected), Some(result)) = (&outcome.expected_output, &outcome.result) {
            if outcome.verdict == Some(Verdict::WrongAnswer) {
                println!("       Expected: \"{}\"", expected.trim());
                println!("       Got:      \"{}\"", result.stdout().trim());
            }
        }
    }
    println!();
    match &report.summary {
        Some(summary) => println!("  Score: {} / {} AC", summary.accepted, summary.total),
        None => println!("  No test cases"),
    }
}

/// Run a source file against every test case and print verdicts
pub async fn test_file(
    file: &Path,
    cases_path: &Path,
    lang: Option<&str>,
    max_wait_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
) -> Result<()> {
    let language = resolve_language(file, lang)?;
    let source = read_source(file)?;
    let cases = load_test_cases(cases_path)?;

    let client = client()?;
    let options = client
        .run_options()
        .with_overrides(max_wait_ms, poll_interval_ms);

    println!(
        "🧪 Testing {} ({}) against {} test cases",
        file.display(),
        language.label(),
        cases.len()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_ref = &client;
    let batch = async move {
        let report =
            executor::run_all(client_ref, &source, language, &cases, options, Some(&tx)).await;
        drop(tx);
        report
    };
    let progress = async {
        while let Some(event) = rx.recv().await {
            if event.state == LifecycleState::Running {
                println!("  → test #{} running", event.index + 1);
            } else {
                println!("  ✓ test #{} {}", event.index + 1, event.state);
            }
        }
    };
    let (report, ()) = tokio::join!(batch, progress);
    let report = report?;

    print_report(&report);

    match report.summary {
        Some(summary) if summary.all_passed => {
            println!("  ✅ All test cases passed");
            Ok(())
        }
        Some(summary) => bail!(
            "{} of {} test cases did not pass",
            summary.total - summary.accepted,
            summary.total
        ),
        None => Ok(()),
    }
}

/// List supported languages
pub fn list_languages() {
    println!("📋 Supported languages:");
    println!();
    for lang in Language::ALL {
        println!("  {:<14} {}", lang.id(), lang.label());
    }
}
