//! The user-visible build log of the host.
//!
//! Upload failures must reach the person reading the build, not only the
//! service log. Hosts implement [`BuildLog`]; [`TracingBuildLog`] forwards to
//! `tracing` and [`MemoryBuildLog`] additionally keeps every line so a host
//! can replay them after the pass.

use parking_lot::Mutex;

/// Severity of a build log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Normal,
    Warning,
    Error,
}

/// A line written to the build log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub text: String,
}

/// A build-breaking problem raised against the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProblem {
    pub identity: String,
    pub problem_type: String,
    pub description: String,
}

pub trait BuildLog: Send + Sync {
    fn message(&self, text: &str);
    fn warning(&self, text: &str);
    fn error(&self, text: &str);
    /// Mark the build as failed with a described problem.
    fn build_problem(&self, identity: &str, problem_type: &str, description: &str);
}

/// Forwards build log lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBuildLog;

impl BuildLog for TracingBuildLog {
    fn message(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn warning(&self, text: &str) {
        tracing::warn!("{text}");
    }

    fn error(&self, text: &str) {
        tracing::error!("{text}");
    }

    fn build_problem(&self, identity: &str, problem_type: &str, description: &str) {
        tracing::error!(identity, problem_type, "build problem: {description}");
    }
}

/// Records every line and problem, and forwards them to `tracing`.
#[derive(Debug, Default)]
pub struct MemoryBuildLog {
    entries: Mutex<Vec<LogEntry>>,
    problems: Mutex<Vec<BuildProblem>>,
}

impl MemoryBuildLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn problems(&self) -> Vec<BuildProblem> {
        self.problems.lock().clone()
    }

    pub fn has_problems(&self) -> bool {
        !self.problems.lock().is_empty()
    }

    /// Texts of the lines at `level`.
    pub fn lines(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.text.clone())
            .collect()
    }

    fn push(&self, level: LogLevel, text: &str) {
        self.entries.lock().push(LogEntry {
            level,
            text: text.to_string(),
        });
    }
}

impl BuildLog for MemoryBuildLog {
    fn message(&self, text: &str) {
        TracingBuildLog.message(text);
        self.push(LogLevel::Normal, text);
    }

    fn warning(&self, text: &str) {
        TracingBuildLog.warning(text);
        self.push(LogLevel::Warning, text);
    }

    fn error(&self, text: &str) {
        TracingBuildLog.error(text);
        self.push(LogLevel::Error, text);
    }

    fn build_problem(&self, identity: &str, problem_type: &str, description: &str) {
        TracingBuildLog.build_problem(identity, problem_type, description);
        self.problems.lock().push(BuildProblem {
            identity: identity.to_string(),
            problem_type: problem_type.to_string(),
            description: description.to_string(),
        });
    }
}
