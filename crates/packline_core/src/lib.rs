mod artifact;
pub use artifact::*;
mod batteries;
pub use batteries::*;
mod bundle;
pub use bundle::*;
mod bundler;
pub use bundler::*;
mod config;
pub use config::*;
mod esbuild;
pub use esbuild::*;
mod import_specifier;
pub(crate) use import_specifier::*;
mod matrix;
pub use matrix::*;
mod options;
pub use options::*;
mod report;
pub use report::*;

pub use packline_common::{
  file_name::FileNameTemplate, FormatRegistry, FormatSpec, ModuleFormat, PackageDescriptor,
  PackagingOptions,
};
pub use packline_error::Errors;
pub use packline_patch::PositionMap;
pub use packline_resolver::OutputPathTable;

// public exports

pub type BundleResult<T> = packline_error::Result<T>;
pub type BundleError = packline_error::Error;
