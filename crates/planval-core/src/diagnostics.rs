//! Outcome and error types for a single rule evaluation.
//!
//! Mirrors the teacher pattern of a "things that abort the whole run" error
//! enum (`CoreError`, via `thiserror`) kept strictly separate from the
//! per-item result type (`Outcome`). Per spec.md §7, a validator never
//! propagates an exception: every failure mode inside a validator becomes
//! `Outcome::Error`. Only configuration-loading failures that happen before
//! any rule runs use `CoreError`.

use std::path::PathBuf;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Conditions that abort a run before any rule executes (spec.md §7).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("submission path does not exist: {path}")]
    SubmissionNotFound { path: PathBuf },

    #[error("failed to open submission container: {path}")]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load rule table for category {category}, version {version}")]
    RuleTableUnavailable {
        category: u32,
        version: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load reference dictionary {kind}")]
    DictionaryUnavailable {
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("report file is not writable: {path}")]
    ReportUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The result of evaluating exactly one rule (spec.md §4.5, §7).
///
/// Every validator emits exactly one `Outcome`, which the dispatcher then
/// writes as exactly one report row. `verify` carries the stringified
/// offenders (row indices, file names, pair lists, ...); it is absent on
/// Pass and always present (possibly `"-"`) on Fail/Error.
#[derive(Debug, Clone)]
pub enum Outcome {
    Pass,
    Fail { verify: String },
    Error { verify: String },
}

impl Outcome {
    pub fn fail(verify: impl Into<String>) -> Self {
        Outcome::Fail {
            verify: verify.into(),
        }
    }

    pub fn fail_rows(indices: impl IntoIterator<Item = usize>) -> Self {
        Outcome::fail(join_human(indices.into_iter().map(|i| i.to_string())))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error {
            verify: single_line(&message.into()),
        }
    }

    /// An unexpected failure inside a validator body, converted per spec.md
    /// §7: "any unexpected exception ... translated into an emit_error row
    /// with the exception's message truncated to a single line."
    pub fn from_panic_like(err: impl std::fmt::Display) -> Self {
        Outcome::error(err.to_string())
    }

    /// Whether this outcome, combined with the rule's alert severity, should
    /// block the overall verdict (spec.md §3 "Verdict").
    pub fn blocks(&self, is_blocker: bool) -> bool {
        is_blocker && !matches!(self, Outcome::Pass)
    }
}

/// Stringify a collection of offenders the way the original report does:
/// comma-separated for short lists, matching spec.md §4.3's
/// "comma-separated, or newline-separated for file lists" rule for verify
/// fields that are in fact lists of entries rather than plain scalars.
pub fn join_human(items: impl IntoIterator<Item = String>) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub fn join_human_lines(items: impl IntoIterator<Item = String>) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join("\n")
    }
}

fn single_line(message: &str) -> String {
    message.lines().next().unwrap_or(message).to_string()
}
