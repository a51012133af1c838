use std::{borrow::Cow, fmt::Debug};

use crate::{BuildJob, BundleResult, PositionMap};

/// What the bundler collaborator hands back for one job, before any post-processing.
#[derive(Debug, Clone)]
pub struct RawOutput {
  pub code: String,
  pub position_map: Option<PositionMap>,
}

impl RawOutput {
  pub fn new(code: impl Into<String>) -> Self {
    Self {
      code: code.into(),
      position_map: None,
    }
  }

  pub fn with_position_map(mut self, position_map: PositionMap) -> Self {
    self.position_map = Some(position_map);
    self
  }
}

pub type BundlerName<'a> = Cow<'a, str>;

/// The external tool turning one job's input into code.
///
/// Called concurrently for different jobs, so implementations must not share mutable state
/// between calls. Each job's externals must come back as bare import references.
pub trait Bundler: Debug + Send + Sync {
  fn name(&self) -> BundlerName;

  fn bundle(&self, job: &BuildJob) -> BundleResult<RawOutput>;
}
