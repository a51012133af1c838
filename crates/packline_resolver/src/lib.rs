use std::path::{Path, PathBuf};

use packline_common::ModuleFormat;
use packline_error::Error;
use rustc_hash::FxHashMap;
use sugar_path::SugarPath;

/// Output path of every artifact of a run, keyed by the identifier other packages import
/// it under and its format. Complete before any job is finalized and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct OutputPathTable {
  paths: FxHashMap<String, FxHashMap<ModuleFormat, PathBuf>>,
}

impl OutputPathTable {
  /// Returns the previous path if `(identifier, format)` was already registered.
  pub fn insert(
    &mut self,
    identifier: impl Into<String>,
    format: ModuleFormat,
    path: PathBuf,
  ) -> Option<PathBuf> {
    self
      .paths
      .entry(identifier.into())
      .or_default()
      .insert(format, path)
  }

  pub fn get(&self, identifier: &str, format: ModuleFormat) -> Option<&Path> {
    self
      .paths
      .get(identifier)
      .and_then(|by_format| by_format.get(&format))
      .map(PathBuf::as_path)
  }

  pub fn identifiers(&self) -> Vec<String> {
    let mut identifiers = self.paths.keys().cloned().collect::<Vec<_>>();
    identifiers.sort();
    identifiers
  }
}

#[derive(Debug, Default)]
pub struct Resolver;

impl Resolver {
  /// Specifier an artifact at `importer` must use to import the `format` build of
  /// `dependency`.
  ///
  /// Only meaningful for linked formats: bundled formats inline their dependencies.
  pub fn resolve(
    &self,
    importer: &Path,
    dependency: &str,
    table: &OutputPathTable,
    format: ModuleFormat,
  ) -> packline_error::Result<String> {
    debug_assert!(format.is_linked(), "{format} does not link its dependencies");
    let target = table.get(dependency, format).ok_or_else(|| {
      Error::unresolved_dependency(importer, dependency, format.id(), table.identifiers())
    })?;
    let importer_dir = importer.parent().unwrap_or_else(|| Path::new(""));
    let specifier = relative_specifier(importer_dir, target);
    tracing::trace!(
      importer = %importer.display(),
      dependency,
      %specifier,
      "resolved dependency"
    );
    Ok(specifier)
  }
}

/// Relative import specifier from `from_dir` to `to`.
///
/// Import syntax does not treat a bare file name as relative, so results that stay in the
/// same directory or below get an explicit `./`. Results climbing up start directly with
/// `../`, never `./../`.
pub fn relative_specifier(from_dir: &Path, to: &Path) -> String {
  let relative = to.relative(from_dir);
  normalize_specifier(&relative.to_slash_lossy())
}

fn normalize_specifier(relative: &str) -> String {
  let mut specifier = relative.replace('\\', "/");
  while let Some(rest) = specifier.strip_prefix("./") {
    specifier = rest.to_string();
  }
  if specifier == ".." || specifier.starts_with("../") {
    specifier
  } else {
    format!("./{specifier}")
  }
}
