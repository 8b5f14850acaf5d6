//! Diagnostics for authored content.
//!
//! Nothing an author writes can fail a build. Link failures, malformed task groups, and
//! mismatched parameter documentation become [`Problem`]s: a [`Diagnostic`] plus zero or more
//! [`Solution`]s. Problems flow into a [`DiagnosticEngine`], which aggregates them for the end of
//! the run and forwards them to any registered [`DiagnosticConsumer`]s.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    path::PathBuf,
    sync::Arc,
};

use crate::config::DiagnosticConfig;

/// Reverse-DNS namespace of every diagnostic identifier emitted by this crate.
pub const DIAGNOSTIC_NAMESPACE: &str = "org.topicgraph";

/// Build a namespaced diagnostic identifier, e.g. `org.topicgraph.UnresolvedTopic`.
pub fn diagnostic_id(name: &str) -> String {
    format!("{DIAGNOSTIC_NAMESPACE}.{name}")
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Information,
    #[default]
    Warning,
    Error,
}

/// A 1-based line and column in a source file. Columns count bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLocation { line, column }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range between two source locations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        SourceRange { start, end }
    }

    /// A zero-width range, used for insertions.
    pub fn empty_at(location: SourceLocation) -> Self {
        SourceRange {
            start: location,
            end: location,
        }
    }

    /// Shift a range by whole lines.
    pub fn offset_lines(&self, lines: usize) -> Self {
        SourceRange {
            start: SourceLocation::new(self.start.line + lines, self.start.column),
            end: SourceLocation::new(self.end.line + lines, self.end.column),
        }
    }
}

impl Display for SourceRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticNote {
    pub source: Option<PathBuf>,
    pub range: Option<SourceRange>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source: Option<PathBuf>,
    pub severity: Severity,
    pub range: Option<SourceRange>,
    /// Reverse-DNS identifier of the kind of problem, see [`diagnostic_id`].
    pub identifier: String,
    pub summary: String,
    pub explanation: Option<String>,
    pub notes: Vec<DiagnosticNote>,
}

impl Diagnostic {
    pub fn new(severity: Severity, name: &str, summary: impl Into<String>) -> Self {
        Diagnostic {
            source: None,
            severity,
            range: None,
            identifier: diagnostic_id(name),
            summary: summary.into(),
            explanation: None,
            notes: vec![],
        }
    }

    pub fn warning(name: &str, summary: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, name, summary)
    }

    pub fn with_source(mut self, source: Option<PathBuf>) -> Self {
        self.source = source;
        self
    }

    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn with_note(mut self, note: DiagnosticNote) -> Self {
        self.notes.push(note);
        self
    }
}

/// Replace the text covered by `range` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub range: SourceRange,
    pub replacement: String,
}

impl Replacement {
    pub fn new(range: SourceRange, replacement: impl Into<String>) -> Self {
        Replacement {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn removal(range: SourceRange) -> Self {
        Replacement::new(range, "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub summary: String,
    pub replacements: Vec<Replacement>,
}

impl Solution {
    pub fn new(summary: impl Into<String>, replacements: Vec<Replacement>) -> Self {
        Solution {
            summary: summary.into(),
            replacements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub diagnostic: Diagnostic,
    pub possible_solutions: Vec<Solution>,
}

impl Problem {
    pub fn new(diagnostic: Diagnostic, possible_solutions: Vec<Solution>) -> Self {
        Problem {
            diagnostic,
            possible_solutions,
        }
    }

    pub fn severity(&self) -> Severity {
        self.diagnostic.severity
    }

    pub fn identifier(&self) -> &str {
        &self.diagnostic.identifier
    }

    /// True if this problem's identifier is `{DIAGNOSTIC_NAMESPACE}.{name}`.
    pub fn is(&self, name: &str) -> bool {
        self.identifier()
            .strip_prefix(DIAGNOSTIC_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            == Some(name)
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let location = match (&self.diagnostic.source, &self.diagnostic.range) {
            (Some(source), Some(range)) => format!("{}:{}: ", source.display(), range.start),
            (Some(source), None) => format!("{}: ", source.display()),
            (None, Some(range)) => format!("{}: ", range.start),
            (None, None) => String::new(),
        };
        write!(
            f,
            "{location}{:?}: {} [{}]",
            self.diagnostic.severity, self.diagnostic.summary, self.diagnostic.identifier
        )
    }
}

/// The diagnostic sink collaborator. Consumers are called from whichever thread reports the
/// problems, so they must be thread safe.
pub trait DiagnosticConsumer: Send + Sync {
    fn receive(&self, problems: &[Problem]);

    /// Called once at the end of a run.
    fn finalize(&self) {}
}

/// Collects problems from all passes of a build.
#[derive(Default)]
pub struct DiagnosticEngine {
    config: DiagnosticConfig,
    problems: Mutex<Vec<Problem>>,
    consumers: RwLock<Vec<Arc<dyn DiagnosticConsumer>>>,
}

impl std::fmt::Debug for DiagnosticEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticEngine")
            .field("config", &self.config)
            .field("problems", &self.problems.lock().len())
            .field("consumers", &self.consumers.read().len())
            .finish()
    }
}

impl DiagnosticEngine {
    pub fn new(config: DiagnosticConfig) -> Self {
        DiagnosticEngine {
            config,
            ..Default::default()
        }
    }

    pub fn add_consumer(&self, consumer: Arc<dyn DiagnosticConsumer>) {
        self.consumers.write().push(consumer);
    }

    pub fn emit(&self, problem: Problem) {
        self.emit_all(vec![problem]);
    }

    /// Filter, adjust severity, log, store and forward a batch of problems.
    pub fn emit_all(&self, problems: Vec<Problem>) {
        let accepted: Vec<Problem> = problems
            .into_iter()
            .filter(|problem| problem.severity() >= self.config.minimum_severity)
            .map(|mut problem| {
                if self.config.warnings_as_errors && problem.severity() == Severity::Warning {
                    problem.diagnostic.severity = Severity::Error;
                }
                problem
            })
            .collect();
        if accepted.is_empty() {
            return;
        }
        for problem in accepted.iter() {
            match problem.severity() {
                Severity::Error => tracing::error!("{problem}"),
                Severity::Warning => tracing::warn!("{problem}"),
                _ => tracing::info!("{problem}"),
            }
        }
        for consumer in self.consumers.read().iter() {
            consumer.receive(&accepted);
        }
        self.problems.lock().extend(accepted);
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.problems.lock().clone()
    }

    pub fn has_errors(&self) -> bool {
        self.problems
            .lock()
            .iter()
            .any(|problem| problem.severity() == Severity::Error)
    }

    /// Notify consumers that the run is over.
    pub fn finalize(&self) {
        for consumer in self.consumers.read().iter() {
            consumer.finalize();
        }
    }
}
