use crate::ModuleFormat;

/// Format specific options handed to the bundler collaborator as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingOptions {
  pub format: ModuleFormat,
  /// Global variable the artifact assigns its exports to. Bundled formats only.
  pub global_name: Option<String>,
  /// Merge the exports into an existing global of the same name instead of replacing it.
  pub extend: bool,
  pub sourcemap: bool,
  pub minify: bool,
}

impl PackagingOptions {
  pub fn new(format: ModuleFormat) -> Self {
    Self {
      format,
      global_name: None,
      extend: false,
      sourcemap: true,
      minify: true,
    }
  }
}
