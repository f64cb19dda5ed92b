//! Shared vocabulary for the scanner and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Structural gap in a policy that is not by itself a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Omission {
    MissingPolicyDocument,
    MissingStatement,
    NonObjectStatement { index: usize },
}

impl fmt::Display for Omission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Omission::MissingPolicyDocument => write!(f, "missing `PolicyDocument` object"),
            Omission::MissingStatement => write!(f, "missing `PolicyDocument.Statement`"),
            Omission::NonObjectStatement { index } => write!(f, "statement {} is not an object", index),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("`{field}` must be {expected}, found {found}")]
    StructuralType { field: &'static str, expected: &'static str, found: &'static str },
    #[error("incomplete policy: {0}")]
    Omitted(Omission),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind { Safe, Unsafe, Malformed }

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutcomeKind::Safe => "safe",
            OutcomeKind::Unsafe => "unsafe",
            OutcomeKind::Malformed => "malformed",
        })
    }
}

/// Result of scanning one policy document.
#[derive(Debug)]
pub enum Outcome {
    /// No wildcard grant found. `omission` is set when the document was
    /// structurally incomplete and that was tolerated.
    Safe { omission: Option<Omission> },
    /// First statement (by index) granting `"Resource": "*"`.
    Unsafe { statement: usize },
    Malformed(ScanError),
}

impl Outcome {
    pub fn clean() -> Self { Outcome::Safe { omission: None } }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Safe { .. } => OutcomeKind::Safe,
            Outcome::Unsafe { .. } => OutcomeKind::Unsafe,
            Outcome::Malformed(_) => OutcomeKind::Malformed,
        }
    }

    /// Boolean verdict printed by the CLI: only `Safe` passes.
    pub fn verdict(&self) -> bool { matches!(self, Outcome::Safe { .. }) }

    /// Advisory message for the decision path taken.
    pub fn diagnostic(&self) -> String {
        match self {
            Outcome::Safe { omission: None } => "No wildcard resource grant found.".to_string(),
            Outcome::Safe { omission: Some(Omission::NonObjectStatement { .. }) } =>
                "Statement should be a dictionary.".to_string(),
            Outcome::Safe { omission: Some(_) } => "Missing components in the Json file.".to_string(),
            Outcome::Unsafe { statement } =>
                format!("Statement {} grants access to all resources (\"Resource\": \"*\").", statement),
            Outcome::Malformed(ScanError::Parse(_)) => "Invalid JSON format.".to_string(),
            Outcome::Malformed(ScanError::NotFound(_)) => "Given file couldn't be found.".to_string(),
            Outcome::Malformed(e) => format!("Malformed policy: {}", e),
        }
    }
}

/// Scanner settings, usually loaded from a YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Report structural omissions as malformed instead of safe.
    #[serde(default)]
    pub strict: bool,
}
