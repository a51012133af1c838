use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  path::PathBuf,
  sync::Arc,
};

use packline_patch::{apply, apply_battery};
use packline_resolver::Resolver;
use rayon::prelude::*;
use tracing::instrument;

use crate::{
  battery_for, import_specifier_rule, Artifact, BuildJob, BundleError, BundleMatrix,
  BundleResult, Bundler, ModuleFormat, OutputPathTable, RawOutput,
};

/// Turns one job's raw bundler output into its final artifact.
///
/// Linked formats first get every external's import specifier pointed at the sibling
/// artifact, in a single pass; the cleanup battery runs afterwards because its patterns
/// expect final, relative specifiers.
pub fn finalize(job: &BuildJob, raw: RawOutput, table: &OutputPathTable) -> BundleResult<Artifact> {
  let RawOutput {
    mut code,
    mut position_map,
  } = raw;
  let mut replacements = 0;

  if job.format.is_linked() && !job.externals.is_empty() {
    let rules = job
      .externals
      .iter()
      .map(|dependency| {
        let resolved = Resolver.resolve(&job.output_path, dependency, table, job.format)?;
        import_specifier_rule(job.format, dependency, &resolved)
      })
      .collect::<BundleResult<Vec<_>>>()?;
    let result = apply(&code, position_map, &rules)?;
    if result.replacements == 0 {
      tracing::warn!(
        "{}: none of {:?} is imported, the externals list may be stale",
        job.label(),
        job.externals
      );
    }
    tracing::debug!("{}: resolved {} imports", job.label(), result.replacements);
    code = result.text;
    position_map = result.position_map;
    replacements += result.replacements;
  }

  let battery = battery_for(job.format);
  let result = apply_battery(&code, position_map, battery)?;
  tracing::debug!(
    "{}: {} cleaned up {} places",
    job.label(),
    battery.name(),
    result.replacements
  );

  Ok(Artifact {
    name: job.name().to_string(),
    format: job.format,
    output_path: job.output_path.clone(),
    code: result.text,
    position_map: result.position_map,
    replacements: replacements + result.replacements,
  })
}

/// What happened to one job. Failures stay attached to the job that raised them.
#[derive(Debug)]
pub struct JobOutcome {
  pub name: String,
  pub format: ModuleFormat,
  pub output_path: PathBuf,
  pub result: BundleResult<Artifact>,
}

impl JobOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }

  /// `name (format): message` for a failed job.
  pub fn failure_line(&self) -> Option<String> {
    let err = self.result.as_ref().err()?;
    Some(format!("{} ({}): {}", self.name, self.format, err.kind))
  }
}

/// Runs a matrix's jobs through bundling and finalization on a bounded thread pool.
#[derive(Debug, Clone)]
pub struct Pipeline {
  bundler: Arc<dyn Bundler>,
  concurrency: Option<usize>,
}

impl Pipeline {
  pub fn new(bundler: Arc<dyn Bundler>) -> Self {
    packline_tracing::enable_tracing_on_demand();
    Self {
      bundler,
      concurrency: None,
    }
  }

  /// Upper bound on jobs running at once. Defaults to the available parallelism.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = Some(concurrency.max(1));
    self
  }

  /// Produces every artifact in memory without writing anything.
  #[instrument(skip_all)]
  pub fn generate(&self, matrix: &BundleMatrix) -> BundleResult<Vec<JobOutcome>> {
    self.run(matrix, false)
  }

  /// Produces every artifact and writes the successful ones to their output paths.
  #[instrument(skip_all)]
  pub fn write(&self, matrix: &BundleMatrix) -> BundleResult<Vec<JobOutcome>> {
    self.run(matrix, true)
  }

  fn run(&self, matrix: &BundleMatrix, write: bool) -> BundleResult<Vec<JobOutcome>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(concurrency) = self.concurrency {
      builder = builder.num_threads(concurrency);
    }
    let pool = builder
      .thread_name(|idx| format!("packline-job-{idx}"))
      .build()
      .map_err(|e| BundleError::panic(format!("Could not start the job pool: {e}")))?;

    tracing::debug!(
      jobs = matrix.jobs().len(),
      threads = pool.current_num_threads(),
      bundler = %self.bundler.name(),
      "running pipeline"
    );
    let table = matrix.path_table();
    let outcomes = pool.install(|| {
      matrix
        .jobs()
        .par_iter()
        .map(|job| JobOutcome {
          name: job.name().to_string(),
          format: job.format,
          output_path: job.output_path.clone(),
          result: self.run_job(job, table, write),
        })
        .collect::<Vec<_>>()
    });

    for outcome in &outcomes {
      if let Err(err) = &outcome.result {
        tracing::debug!("{} ({}) failed: {}", outcome.name, outcome.format, err.kind);
      }
    }
    Ok(outcomes)
  }

  fn run_job(&self, job: &BuildJob, table: &OutputPathTable, write: bool) -> BundleResult<Artifact> {
    let span = tracing::debug_span!("job", name = job.name(), format = %job.format);
    let _enter = span.enter();

    let artifact = catch_unwind(AssertUnwindSafe(|| {
      let raw = self.bundler.bundle(job)?;
      finalize(job, raw, table)
    }))
    .unwrap_or_else(|payload| {
      let msg = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
      Err(BundleError::panic(msg))
    })?;

    if write {
      artifact.write()?;
    }
    Ok(artifact)
  }
}
