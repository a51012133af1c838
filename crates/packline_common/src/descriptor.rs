use std::path::{Path, PathBuf};

use hashlink::LinkedHashSet;

use crate::{camelize, ModuleFormat};

/// One logical package to build. Authored once in configuration and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
  pub name: String,
  pub input: PathBuf,
  /// Directory this package's artifacts are written to.
  pub out_dir: PathBuf,
  /// Stem of the artifact file names. Defaults to `name`.
  pub file_name: Option<String>,
  /// How other packages refer to this one in their `externals`. Defaults to `name`.
  pub specifier: Option<String>,
  pub externals: LinkedHashSet<String>,
  pub formats: Vec<ModuleFormat>,
  pub global_name: Option<String>,
  pub extend: bool,
}

impl PackageDescriptor {
  pub fn new(name: impl Into<String>, input: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      input: input.into(),
      out_dir: PathBuf::from("dist"),
      file_name: None,
      specifier: None,
      externals: Default::default(),
      formats: vec![],
      global_name: None,
      extend: false,
    }
  }

  pub fn with_formats(mut self, formats: impl IntoIterator<Item = ModuleFormat>) -> Self {
    self.formats = formats.into_iter().collect();
    self
  }

  pub fn with_externals<S: Into<String>>(mut self, externals: impl IntoIterator<Item = S>) -> Self {
    self.externals = externals.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
    self.out_dir = out_dir.as_ref().to_path_buf();
    self
  }

  pub fn with_specifier(mut self, specifier: impl Into<String>) -> Self {
    self.specifier = Some(specifier.into());
    self
  }

  pub fn with_global_name(mut self, global_name: impl Into<String>, extend: bool) -> Self {
    self.global_name = Some(global_name.into());
    self.extend = extend;
    self
  }

  pub fn identifier(&self) -> &str {
    self.specifier.as_deref().unwrap_or(&self.name)
  }

  pub fn file_stem(&self) -> &str {
    self.file_name.as_deref().unwrap_or(&self.name)
  }

  pub fn global_name(&self) -> String {
    match &self.global_name {
      Some(global_name) => global_name.clone(),
      None => camelize(&self.name),
    }
  }
}
