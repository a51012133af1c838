use std::{path::PathBuf, sync::Arc};

use packline_common::{
  file_name::RenderOptions, is_legal_identifier, ModuleFormat, PackageDescriptor,
  PackagingOptions,
};
use packline_error::Errors;
use packline_resolver::OutputPathTable;
use rustc_hash::{FxHashMap, FxHashSet};
use sugar_path::SugarPath;
use tracing::instrument;

use crate::{BundleError, BundleResult, MatrixOptions};

/// One concrete unit of work: a package built in one format.
#[derive(Debug, Clone)]
pub struct BuildJob {
  pub descriptor: Arc<PackageDescriptor>,
  pub format: ModuleFormat,
  pub input: PathBuf,
  pub output_path: PathBuf,
  /// Identifiers left unresolved until finalization, when every job's output path is known.
  pub externals: Vec<String>,
  pub options: PackagingOptions,
}

impl BuildJob {
  pub fn name(&self) -> &str {
    &self.descriptor.name
  }

  /// `name (format)`, the way jobs are referred to in logs and failure reports.
  pub fn label(&self) -> String {
    format!("{} ({})", self.name(), self.format)
  }
}

#[derive(Debug)]
pub struct BundleMatrix {
  jobs: Vec<BuildJob>,
  names: Vec<String>,
  path_table: OutputPathTable,
}

impl BundleMatrix {
  /// Expands every descriptor into one job per requested format.
  ///
  /// Jobs come out descriptor-major: in descriptor order, and within a descriptor in the
  /// order of its `formats`. Every descriptor is validated before any job is produced and
  /// all problems found are reported together.
  #[instrument(skip_all)]
  pub fn expand(
    descriptors: Vec<PackageDescriptor>,
    options: &MatrixOptions,
  ) -> Result<Self, Errors> {
    validate(&descriptors)?;

    let mut jobs = vec![];
    let mut names = vec![];
    let mut path_table = OutputPathTable::default();
    let mut owner_by_path = FxHashMap::default();
    let mut errors = vec![];

    for descriptor in descriptors.into_iter().map(Arc::new) {
      names.push(descriptor.name.clone());
      if descriptor.formats.is_empty() {
        tracing::debug!("{} has no formats, skipping", descriptor.name);
      }
      for format in descriptor.formats.iter().copied() {
        let job = new_job(&descriptor, format, options);
        if let Some(owner) = owner_by_path.insert(job.output_path.clone(), job.label()) {
          errors.push(BundleError::configuration(
            Some(&descriptor.name),
            format!(
              "{} writes to \"{}\", which {owner} already writes to",
              job.label(),
              job.output_path.display()
            ),
          ));
          continue;
        }
        path_table.insert(
          descriptor.identifier(),
          format,
          job.output_path.clone(),
        );
        tracing::trace!("{} -> {}", job.label(), job.output_path.display());
        jobs.push(job);
      }
    }

    if let Some(errors) = Errors::from_vec(errors) {
      return Err(errors);
    }

    tracing::debug!(jobs = jobs.len(), packages = names.len(), "expanded bundle matrix");
    Ok(Self {
      jobs,
      names,
      path_table,
    })
  }

  pub fn jobs(&self) -> &[BuildJob] {
    &self.jobs
  }

  /// Names of every descriptor, in declaration order, including ones without formats.
  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn path_table(&self) -> &OutputPathTable {
    &self.path_table
  }

  /// Keeps only the jobs of the named packages. The path table is left complete so the
  /// remaining jobs can still resolve dependencies on packages that were filtered out.
  pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> BundleResult<Self> {
    if names.is_empty() {
      return Ok(self);
    }
    let known = self.names.iter().map(String::as_str).collect::<FxHashSet<_>>();
    if let Some(unknown) = names.iter().find(|name| !known.contains(name.as_ref())) {
      return Err(BundleError::configuration(
        None,
        format!("no package named \"{}\"", unknown.as_ref()),
      ));
    }
    let selected = names.iter().map(AsRef::as_ref).collect::<FxHashSet<_>>();
    self.jobs.retain(|job| selected.contains(job.name()));
    Ok(self)
  }
}

fn new_job(
  descriptor: &Arc<PackageDescriptor>,
  format: ModuleFormat,
  options: &MatrixOptions,
) -> BuildJob {
  let file_name = options.file_names.render(RenderOptions {
    name: Some(descriptor.file_stem()),
    ext: Some(format.extension()),
    format: Some(format.id()),
  });
  let output_path = options
    .out_root
    .join(&descriptor.out_dir)
    .join(file_name)
    .normalize();

  let bundled = !format.is_linked();
  BuildJob {
    descriptor: descriptor.clone(),
    format,
    input: descriptor.input.clone(),
    output_path,
    externals: descriptor.externals.iter().cloned().collect(),
    options: PackagingOptions {
      global_name: bundled.then(|| descriptor.global_name()),
      extend: bundled && descriptor.extend,
      sourcemap: options.sourcemap,
      minify: options.minify,
      ..PackagingOptions::new(format)
    },
  }
}

fn validate(descriptors: &[PackageDescriptor]) -> Result<(), Errors> {
  let mut errors = vec![];
  let mut seen_names = FxHashSet::default();
  let mut seen_identifiers = FxHashSet::default();

  for descriptor in descriptors {
    let name = descriptor.name.as_str();
    if name.trim().is_empty() {
      errors.push(BundleError::configuration(None, "a package has an empty `name`"));
      continue;
    }
    let package = Some(name);
    if !seen_names.insert(name) {
      errors.push(BundleError::configuration(package, "`name` is declared twice"));
    }
    if !seen_identifiers.insert(descriptor.identifier()) {
      errors.push(BundleError::configuration(
        package,
        format!(
          "specifier \"{}\" is already used by another package",
          descriptor.identifier()
        ),
      ));
    }
    if descriptor.input.as_os_str().is_empty() {
      errors.push(BundleError::configuration(package, "`input` must not be empty"));
    }
    let mut seen_formats = FxHashSet::default();
    for format in &descriptor.formats {
      if !seen_formats.insert(*format) {
        errors.push(BundleError::configuration(
          package,
          format!("format \"{format}\" is listed twice"),
        ));
      }
    }
    if descriptor.externals.contains(descriptor.identifier()) {
      errors.push(BundleError::configuration(
        package,
        "a package cannot list itself in `externals`",
      ));
    }
    if let Some(global_name) = &descriptor.global_name {
      if !is_legal_identifier(global_name) {
        errors.push(BundleError::configuration(
          package,
          format!("`globalName` \"{global_name}\" is not a valid identifier"),
        ));
      }
    }
  }

  match Errors::from_vec(errors) {
    Some(errors) => Err(errors),
    None => Ok(()),
  }
}
