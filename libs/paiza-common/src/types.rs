use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Rejections raised at the request boundary, before any network call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("source code is empty")]
    EmptySource,
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("no target file selected")]
    NoTarget,
}

macro_rules! supported_languages {
    ($($variant:ident => $id:literal, $label:literal;)+) => {
        /// Languages accepted by the remote runner
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Language {
            $(#[serde(rename = $id)] $variant,)+
        }

        impl Language {
            pub const ALL: &'static [Language] = &[$(Language::$variant,)+];

            /// Identifier sent to the remote service
            pub fn id(&self) -> &'static str {
                match self {
                    $(Language::$variant => $id,)+
                }
            }

            /// Human readable name
            pub fn label(&self) -> &'static str {
                match self {
                    $(Language::$variant => $label,)+
                }
            }
        }
    };
}

supported_languages! {
    Python3 => "python3", "Python 3";
    Python2 => "python", "Python 2";
    JavaScript => "javascript", "JavaScript";
    TypeScript => "typescript", "TypeScript";
    C => "c", "C";
    Cpp => "cpp", "C++";
    CSharp => "csharp", "C#";
    Java => "java", "Java";
    Kotlin => "kotlin", "Kotlin";
    Scala => "scala", "Scala";
    Swift => "swift", "Swift";
    Go => "go", "Go";
    Rust => "rust", "Rust";
    Ruby => "ruby", "Ruby";
    Php => "php", "PHP";
    Perl => "perl", "Perl";
    Bash => "bash", "Bash";
    R => "r", "R";
    Haskell => "haskell", "Haskell";
    Erlang => "erlang", "Erlang";
    Elixir => "elixir", "Elixir";
    Clojure => "clojure", "Clojure";
    FSharp => "fsharp", "F#";
    VisualBasic => "vb", "Visual Basic";
    Cobol => "cobol", "COBOL";
    D => "d", "D";
    Scheme => "scheme", "Scheme";
    CommonLisp => "commonlisp", "Common Lisp";
    CoffeeScript => "coffeescript", "CoffeeScript";
    ObjectiveC => "objective-c", "Objective-C";
    MySql => "mysql", "MySQL";
    Nadesiko => "nadesiko", "なでしこ";
    Brainfuck => "brainfuck", "Brainfuck";
    PlainText => "plain", "Plain Text";
}

impl Language {
    /// Map an editor language id (as reported by the host editor) to a runner language.
    /// Returns None when the editor language has no counterpart.
    pub fn detect(editor_language_id: &str) -> Option<Language> {
        let language = match editor_language_id {
            "python" => Language::Python3,
            "javascript" => Language::JavaScript,
            "typescript" => Language::TypeScript,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            "csharp" => Language::CSharp,
            "java" => Language::Java,
            "kotlin" => Language::Kotlin,
            "scala" => Language::Scala,
            "swift" => Language::Swift,
            "go" => Language::Go,
            "rust" => Language::Rust,
            "ruby" => Language::Ruby,
            "php" => Language::Php,
            "perl" => Language::Perl,
            "shellscript" => Language::Bash,
            "r" => Language::R,
            "haskell" => Language::Haskell,
            "erlang" => Language::Erlang,
            "elixir" => Language::Elixir,
            "clojure" => Language::Clojure,
            "fsharp" => Language::FSharp,
            "vb" => Language::VisualBasic,
            "cobol" => Language::Cobol,
            "d" => Language::D,
            "scheme" => Language::Scheme,
            "lisp" => Language::CommonLisp,
            "coffeescript" => Language::CoffeeScript,
            "objective-c" => Language::ObjectiveC,
            "sql" => Language::MySql,
            _ => return None,
        };
        Some(language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| ValidationError::UnsupportedLanguage(s.to_string()))
    }
}

/// One program submission. The source is shared so that a batch of runs
/// can reuse a single snapshot without copying it per test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    source_code: Arc<str>,
    language: Language,
    stdin: Option<String>,
}

impl ExecutionRequest {
    pub fn new(
        source_code: impl Into<Arc<str>>,
        language: Language,
        stdin: Option<String>,
    ) -> Result<Self, ValidationError> {
        let source_code = source_code.into();
        if source_code.trim().is_empty() {
            return Err(ValidationError::EmptySource);
        }
        Ok(Self {
            source_code,
            language,
            stdin,
        })
    }

    /// Same program and language, different standard input
    pub fn with_stdin(&self, stdin: impl Into<String>) -> Self {
        Self {
            source_code: Arc::clone(&self.source_code),
            language: self.language,
            stdin: Some(stdin.into()),
        }
    }

    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

/// Opaque run identifier handed out by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunHandle(String);

impl RunHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub error: Option<String>,
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

/// Outcome reported by the remote service for the build or run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOutcome {
    Success,
    Failure,
    Error,
    Timeout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Elapsed seconds as reported by the service
    pub time_secs: Option<f64>,
    pub memory_bytes: Option<u64>,
    /// None when the phase did not happen (e.g. no build step for interpreted languages)
    pub outcome: Option<PhaseOutcome>,
}

/// Terminal record of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: RunHandle,
    pub build: PhaseResult,
    pub run: PhaseResult,
}

impl ExecutionResult {
    pub fn stdout(&self) -> &str {
        &self.run.stdout
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(default, alias = "expectedOutput")]
    pub expected_output: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: Option<&str>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Pending,
    Running,
    Completed,
    Error,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Error)
    }

    /// Lifecycle only moves forward: pending -> running -> completed | error
    pub fn can_advance_to(&self, next: LifecycleState) -> bool {
        matches!(
            (self, next),
            (LifecycleState::Pending, LifecycleState::Running)
                | (LifecycleState::Running, LifecycleState::Completed)
                | (LifecycleState::Running, LifecycleState::Error)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Running => "running",
            LifecycleState::Completed => "completed",
            LifecycleState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Judgement of a run against its expected output.
/// "No verdict" (nothing to compare against) is expressed as `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "CE")]
    CompileError,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::RuntimeError => "RE",
            Verdict::CompileError => "CE",
            Verdict::TimeLimitExceeded => "TLE",
        };
        f.write_str(s)
    }
}

/// Per-test-case record tracked through one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    pub index: usize,
    pub input: String,
    pub expected_output: Option<String>,
    pub result: Option<ExecutionResult>,
    pub error: Option<String>,
    pub state: LifecycleState,
    pub verdict: Option<Verdict>,
}

impl TestCaseOutcome {
    pub fn pending(index: usize, test_case: &TestCase) -> Self {
        Self {
            index,
            input: test_case.input.clone(),
            expected_output: test_case.expected_output.clone(),
            result: None,
            error: None,
            state: LifecycleState::Pending,
            verdict: None,
        }
    }

    pub fn start(&mut self) {
        self.advance(LifecycleState::Running);
    }

    pub fn complete(&mut self, result: ExecutionResult, verdict: Option<Verdict>) {
        self.advance(LifecycleState::Completed);
        self.result = Some(result);
        self.verdict = verdict;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.advance(LifecycleState::Error);
        self.error = Some(message.into());
        self.verdict = None;
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "test case {} cannot move from {} to {}",
            self.index,
            self.state,
            next
        );
        self.state = next;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub accepted: usize,
    pub total: usize,
    pub all_passed: bool,
}

/// Lifecycle transition of one test case inside a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub batch_id: Uuid,
    pub index: usize,
    pub state: LifecycleState,
}

/// Fan-in result of one multi-test batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub language: Language,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<TestCaseOutcome>,
    /// None for an empty batch; "all passed" is not meaningful without test cases
    pub summary: Option<Summary>,
}
