use std::path::PathBuf;

use packline_common::file_name::FileNameTemplate;

#[derive(Debug, Clone)]
pub struct MatrixOptions {
  /// Every package's `out_dir` is relative to this.
  pub out_root: PathBuf,
  pub file_names: FileNameTemplate,
  pub sourcemap: bool,
  pub minify: bool,
}

impl Default for MatrixOptions {
  fn default() -> Self {
    Self {
      out_root: PathBuf::from("."),
      file_names: FileNameTemplate::default(),
      sourcemap: true,
      minify: true,
    }
  }
}
