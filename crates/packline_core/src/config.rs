use std::{
  path::{Path, PathBuf},
  str::FromStr,
};

use packline_error::PathExt;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{
  BundleError, BundleResult, Errors, FileNameTemplate, MatrixOptions, ModuleFormat,
  PackageDescriptor,
};

macro_rules! impl_serde_default {
  ($name:ident) => {
    impl Default for $name {
      fn default() -> Self {
        serde_json::from_str("{}").expect("every field has a default")
      }
    }
  };
}

fn true_by_default() -> bool {
  true
}

fn dot_by_default() -> String {
  ".".to_string()
}

fn dist_by_default() -> String {
  "dist".to_string()
}

fn file_names_by_default() -> String {
  "[name].[ext]".to_string()
}

/// Contents of `packline.json`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PacklineConfig {
  /// Root every package's `outDir` is relative to.
  #[serde(default = "dot_by_default")]
  pub out_dir: String,

  /// Output file name template. Supports `[name]`, `[ext]` and `[format]`.
  #[serde(default = "file_names_by_default")]
  pub file_names: String,

  #[serde(default = "true_by_default")]
  pub sourcemap: bool,

  #[serde(default = "true_by_default")]
  pub minify: bool,

  /// Jobs running at once. Defaults to the available parallelism.
  #[serde(default)]
  pub concurrency: Option<usize>,

  #[serde(default)]
  pub packages: Vec<PackageConfig>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageConfig {
  pub name: String,

  /// Identifier other packages list in their `externals`. Defaults to `name`.
  #[serde(default)]
  pub specifier: Option<String>,

  pub input: String,

  #[serde(default = "dist_by_default")]
  pub out_dir: String,

  /// Stem of the output file names. Defaults to `name`.
  #[serde(default)]
  pub file_name: Option<String>,

  #[serde(default)]
  pub externals: Vec<String>,

  /// Any of `esm`, `cjs` and `iife`.
  #[serde(default)]
  pub formats: Vec<String>,

  /// Global variable of the `iife` build. Defaults to the camel-cased `name`.
  #[serde(default)]
  pub global_name: Option<String>,

  /// Merge into an existing global of the same name instead of replacing it.
  #[serde(default)]
  pub extend: bool,
}

impl_serde_default!(PacklineConfig);

impl PacklineConfig {
  pub fn from_config_path(path: &Path) -> BundleResult<Self> {
    let content = std::fs::read_to_string(path).map_err(|e| {
      BundleError::from(e).context(format!("Could not read {}", path.may_display_relative()))
    })?;
    Self::from_json(&content)
      .map_err(|e| e.context(format!("while loading {}", path.may_display_relative())))
  }

  pub fn from_json(json: &str) -> BundleResult<Self> {
    serde_json::from_str(json).map_err(|e| BundleError::configuration(None, e.to_string()))
  }

  /// Builds the descriptors, resolving relative paths against `root`, normally the
  /// directory holding the config file. Every package is checked before returning.
  pub fn descriptors(&self, root: &Path) -> Result<Vec<PackageDescriptor>, Errors> {
    let mut errors = vec![];
    let mut descriptors = vec![];

    for package in &self.packages {
      let mut formats = vec![];
      for id in &package.formats {
        match ModuleFormat::from_str(id) {
          Ok(format) => formats.push(format),
          Err(e) => errors.push(e.context(format!("in package \"{}\"", package.name))),
        }
      }

      let mut descriptor = PackageDescriptor::new(package.name.clone(), PathBuf::new())
        .with_formats(formats)
        .with_externals(package.externals.iter().cloned())
        .with_out_dir(&package.out_dir);
      if !package.input.is_empty() {
        descriptor.input = root.join(&package.input);
      }
      descriptor.specifier = package.specifier.clone();
      descriptor.file_name = package.file_name.clone();
      descriptor.global_name = package.global_name.clone();
      descriptor.extend = package.extend;
      descriptors.push(descriptor);
    }

    match Errors::from_vec(errors) {
      Some(errors) => Err(errors),
      None => Ok(descriptors),
    }
  }

  pub fn matrix_options(&self, root: &Path) -> MatrixOptions {
    MatrixOptions {
      out_root: root.join(&self.out_dir),
      file_names: FileNameTemplate::from(self.file_names.as_str()),
      sourcemap: self.sourcemap,
      minify: self.minify,
    }
  }

  pub fn json_schema() -> BundleResult<String> {
    let schema = schemars::schema_for!(PacklineConfig);
    serde_json::to_string_pretty(&schema).map_err(|e| BundleError::panic(e.to_string()))
  }
}
