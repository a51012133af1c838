use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use crate::utils::{format_quoted_strings, PathExt};
use crate::CWD;

pub mod error_code;

#[derive(Debug)]
pub enum ErrorKind {
  // --- Configuration. Fatal for the whole run.
  Configuration {
    package: Option<String>,
    reason: String,
  },
  UnknownFormat(String),
  InvalidRewritePattern {
    rule: String,
    reason: String,
  },

  // --- Per job. Fatal for the job that raised them only.
  UnresolvedDependency {
    importer: PathBuf,
    dependency: String,
    format: &'static str,
    known: Vec<String>,
  },
  RewriteFailure {
    rule: String,
    matched: String,
    reason: String,
  },
  BundlerFailed {
    bundler: String,
    reason: String,
  },
  InvalidPositionMap(String),

  /// Unrecoverable error. Also used in place of `panic!()` so a single job can fail
  /// without taking its siblings down.
  Panic {
    source: anyhow::Error,
  },

  IoError(std::io::Error),
}

/// Matched text is echoed back to the user, so keep it on one short line.
fn excerpt(matched: &str) -> String {
  const MAX_CHARS: usize = 60;
  let single_line = matched.replace('\n', "\\n");
  if single_line.chars().count() > MAX_CHARS {
    let head = single_line.chars().take(MAX_CHARS).collect::<String>();
    format!("{head}...")
  } else {
    single_line
  }
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::Configuration { package: Some(package), reason } => write!(f, "Invalid configuration for package \"{package}\": {reason}"),
      ErrorKind::Configuration { package: None, reason } => write!(f, "Invalid configuration: {reason}"),
      ErrorKind::UnknownFormat(id) => write!(f, r#"Unknown output format "{id}", expected one of "esm", "cjs" or "iife"."#),
      ErrorKind::InvalidRewritePattern { rule, reason } => write!(f, "Rewrite rule \"{rule}\" has an invalid pattern: {reason}"),
      ErrorKind::UnresolvedDependency { importer, dependency, format, known } => {
        write!(f, r#"Could not resolve dependency "{dependency}" for the "{format}" build of "{}"."#, importer.may_display_relative())?;
        if !known.is_empty() {
          write!(f, " Known packages are {}.", format_quoted_strings(known.as_slice()))?;
        }
        Ok(())
      }
      ErrorKind::RewriteFailure { rule, matched, reason } => write!(f, "Rewrite rule \"{rule}\" failed on \"{}\": {reason}", excerpt(matched)),
      ErrorKind::BundlerFailed { bundler, reason } => write!(f, "Bundler \"{bundler}\" failed: {reason}"),
      ErrorKind::InvalidPositionMap(reason) => write!(f, "Invalid source map: {reason}"),
      ErrorKind::Panic { source } => source.fmt(f),
      ErrorKind::IoError(e) => e.fmt(f),
    }
  }
}

impl ErrorKind {
  /// Shorten the file paths in messages by make them relative to CWD.
  pub fn to_readable_string(&self, cwd: impl AsRef<Path>) -> String {
    let cwd = cwd.as_ref().to_path_buf();
    CWD.set(&cwd, || self.to_string())
  }

  pub fn code(&self) -> &'static str {
    match self {
      ErrorKind::Configuration { .. } => error_code::CONFIGURATION_ERROR,
      ErrorKind::UnknownFormat(_) => error_code::UNKNOWN_FORMAT,
      ErrorKind::InvalidRewritePattern { .. } => error_code::INVALID_REWRITE_PATTERN,
      ErrorKind::UnresolvedDependency { .. } => error_code::UNRESOLVED_DEPENDENCY,
      ErrorKind::RewriteFailure { .. } => error_code::REWRITE_FAILURE,
      ErrorKind::BundlerFailed { .. } => error_code::BUNDLER_FAILED,
      ErrorKind::InvalidPositionMap(_) => error_code::INVALID_POSITION_MAP,
      ErrorKind::Panic { .. } => error_code::PANIC,
      ErrorKind::IoError(_) => error_code::IO_ERROR,
    }
  }
}
