use std::{fmt::Display, path::Path};

use crate::ErrorKind;

#[derive(Debug)]
pub struct Error {
  contexts: Vec<String>,
  pub kind: ErrorKind,
}

impl Error {
  fn with_kind(kind: ErrorKind) -> Self {
    Self {
      contexts: vec![],
      kind,
    }
  }

  pub fn context(mut self, context: impl Into<String>) -> Self {
    self.contexts.push(context.into());
    self
  }

  pub fn contexts(&self) -> &[String] {
    &self.contexts
  }

  // --- Configuration

  pub fn configuration(package: Option<&str>, reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::Configuration {
      package: package.map(ToString::to_string),
      reason: reason.into(),
    })
  }

  pub fn unknown_format(id: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::UnknownFormat(id.into()))
  }

  pub fn invalid_rewrite_pattern(rule: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidRewritePattern {
      rule: rule.into(),
      reason: reason.into(),
    })
  }

  // --- Per job

  pub fn unresolved_dependency(
    importer: impl AsRef<Path>,
    dependency: impl Into<String>,
    format: &'static str,
    known: Vec<String>,
  ) -> Self {
    Self::with_kind(ErrorKind::UnresolvedDependency {
      importer: importer.as_ref().to_path_buf(),
      dependency: dependency.into(),
      format,
      known,
    })
  }

  pub fn rewrite_failure(
    rule: impl Into<String>,
    matched: impl Into<String>,
    reason: impl Display,
  ) -> Self {
    Self::with_kind(ErrorKind::RewriteFailure {
      rule: rule.into(),
      matched: matched.into(),
      reason: reason.to_string(),
    })
  }

  pub fn bundler_failed(bundler: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::BundlerFailed {
      bundler: bundler.into(),
      reason: reason.into(),
    })
  }

  pub fn invalid_position_map(reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidPositionMap(reason.into()))
  }

  pub fn io_error(e: std::io::Error) -> Self {
    Self::with_kind(ErrorKind::IoError(e))
  }

  pub fn panic(msg: String) -> Self {
    anyhow::format_err!(msg).into()
  }
}

impl std::convert::From<anyhow::Error> for Error {
  fn from(value: anyhow::Error) -> Self {
    Self::with_kind(ErrorKind::Panic { source: value })
  }
}

impl std::convert::From<std::io::Error> for Error {
  fn from(value: std::io::Error) -> Self {
    Self::io_error(value)
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Panic { source, .. } => Some(source.as_ref()),
      ErrorKind::IoError(e) => Some(e),
      _ => None,
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.contexts.iter().rev() {
      writeln!(f, "{}: {}", ansi_term::Color::Yellow.paint("context"), ctx)?;
    }

    self.kind.fmt(f)
  }
}
