use std::path::Path;

use packline_core::{
  BuildJob, BundleError, BundleResult, Bundler, BundlerName, JobOutcome, ModuleFormat,
  RawOutput,
};
use packline_error::PathExt;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
enum Canned {
  Output(RawOutput),
  Fail(String),
  Panic(String),
}

/// Hands back prepared output per `(name, format)`, the way a real bundler would leave
/// externals as bare specifiers.
#[derive(Debug, Default)]
pub struct FakeBundler {
  outputs: FxHashMap<(String, ModuleFormat), Canned>,
}

impl FakeBundler {
  pub fn output(mut self, name: &str, format: ModuleFormat, raw: RawOutput) -> Self {
    self
      .outputs
      .insert((name.to_string(), format), Canned::Output(raw));
    self
  }

  pub fn code(self, name: &str, format: ModuleFormat, code: &str) -> Self {
    self.output(name, format, RawOutput::new(code))
  }

  pub fn fail(mut self, name: &str, format: ModuleFormat, reason: &str) -> Self {
    self
      .outputs
      .insert((name.to_string(), format), Canned::Fail(reason.to_string()));
    self
  }

  pub fn panic(mut self, name: &str, format: ModuleFormat, message: &str) -> Self {
    self
      .outputs
      .insert((name.to_string(), format), Canned::Panic(message.to_string()));
    self
  }
}

impl Bundler for FakeBundler {
  fn name(&self) -> BundlerName {
    "fake".into()
  }

  fn bundle(&self, job: &BuildJob) -> BundleResult<RawOutput> {
    match self.outputs.get(&(job.name().to_string(), job.format)) {
      Some(Canned::Output(raw)) => Ok(raw.clone()),
      Some(Canned::Fail(reason)) => Err(BundleError::bundler_failed(self.name(), reason.clone())),
      Some(Canned::Panic(message)) => panic!("{message}"),
      None => Err(BundleError::bundler_failed(
        self.name(),
        format!("no output prepared for {}", job.label()),
      )),
    }
  }
}

/// Every outcome in job order: the artifact's code under its path relative to `root`, or
/// the error that took the job down.
pub fn outcomes_friendly_to_snapshot(outcomes: &[JobOutcome], root: &Path) -> String {
  outcomes
    .iter()
    .flat_map(|outcome| {
      let path = outcome.output_path.strip_prefix(root).unwrap_or(&outcome.output_path);
      match &outcome.result {
        Ok(artifact) => [
          format!("---------- {} ----------", path.to_string_lossy()),
          artifact.code.trim().to_string(),
        ],
        Err(err) => [
          format!("---------- {} FAILED ----------", path.to_string_lossy()),
          format!("{}: {}", err.kind.code(), err.kind.to_readable_string(root)),
        ],
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn read(path: &Path) -> String {
  std::fs::read_to_string(path)
    .unwrap_or_else(|e| panic!("{} should exist: {e}", path.may_display_relative()))
}
