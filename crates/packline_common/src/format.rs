use std::{fmt::Display, str::FromStr};

use packline_error::Error;
use phf::phf_map;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
  Esm,
  Cjs,
  Iife,
}

/// Static facts about one output format.
#[derive(Debug, PartialEq, Eq)]
pub struct FormatSpec {
  pub format: ModuleFormat,
  pub id: &'static str,
  pub extension: &'static str,
  /// Linked formats keep cross-package dependencies as import references that must be
  /// pointed at the sibling artifact. Bundled formats inline them.
  pub linked: bool,
  /// Name of the cleanup battery run over artifacts of this format.
  pub battery: &'static str,
}

static FORMAT_SPECS: [FormatSpec; 3] = [
  FormatSpec {
    format: ModuleFormat::Esm,
    id: "esm",
    extension: "mjs",
    linked: true,
    battery: "linked-esm-cleanup",
  },
  FormatSpec {
    format: ModuleFormat::Cjs,
    id: "cjs",
    extension: "js",
    linked: true,
    battery: "linked-cjs-cleanup",
  },
  FormatSpec {
    format: ModuleFormat::Iife,
    id: "iife",
    extension: "iife.js",
    linked: false,
    battery: "bundled-global-cleanup",
  },
];

static FORMAT_BY_ID: phf::Map<&'static str, ModuleFormat> = phf_map! {
  "esm" => ModuleFormat::Esm,
  "cjs" => ModuleFormat::Cjs,
  "iife" => ModuleFormat::Iife,
};

impl ModuleFormat {
  pub const ALL: [ModuleFormat; 3] = [ModuleFormat::Esm, ModuleFormat::Cjs, ModuleFormat::Iife];

  pub fn spec(self) -> &'static FormatSpec {
    match self {
      ModuleFormat::Esm => &FORMAT_SPECS[0],
      ModuleFormat::Cjs => &FORMAT_SPECS[1],
      ModuleFormat::Iife => &FORMAT_SPECS[2],
    }
  }

  pub fn id(self) -> &'static str {
    self.spec().id
  }

  pub fn extension(self) -> &'static str {
    self.spec().extension
  }

  pub fn is_linked(self) -> bool {
    self.spec().linked
  }

  pub fn is_cjs(self) -> bool {
    self == ModuleFormat::Cjs
  }
}

impl Display for ModuleFormat {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.id())
  }
}

impl FromStr for ModuleFormat {
  type Err = Error;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    FORMAT_BY_ID
      .get(value)
      .copied()
      .ok_or_else(|| Error::unknown_format(value))
  }
}

/// Lookups by textual format id, as found in configuration files.
pub struct FormatRegistry;

impl FormatRegistry {
  pub fn lookup(id: &str) -> packline_error::Result<&'static FormatSpec> {
    ModuleFormat::from_str(id).map(ModuleFormat::spec)
  }

  pub fn extension_for(id: &str) -> packline_error::Result<&'static str> {
    Self::lookup(id).map(|spec| spec.extension)
  }

  pub fn is_linked(id: &str) -> packline_error::Result<bool> {
    Self::lookup(id).map(|spec| spec.linked)
  }

  pub fn specs() -> &'static [FormatSpec] {
    &FORMAT_SPECS
  }
}

#[cfg(test)]
mod tests {
  use packline_error::error_code;

  use super::*;

  #[test]
  fn every_format_has_a_consistent_spec() {
    for format in ModuleFormat::ALL {
      let spec = format.spec();
      assert_eq!(spec.format, format);
      assert_eq!(ModuleFormat::from_str(spec.id).unwrap(), format);
      assert_eq!(FormatRegistry::extension_for(spec.id).unwrap(), spec.extension);
    }
    assert_eq!(FormatRegistry::specs().len(), ModuleFormat::ALL.len());
  }

  #[test]
  fn linked_formats() {
    assert!(FormatRegistry::is_linked("esm").unwrap());
    assert!(FormatRegistry::is_linked("cjs").unwrap());
    assert!(!FormatRegistry::is_linked("iife").unwrap());
  }

  #[test]
  fn unknown_format_is_an_error() {
    let err = FormatRegistry::lookup("umd").unwrap_err();
    assert_eq!(err.kind.code(), error_code::UNKNOWN_FORMAT);
    assert!(FormatRegistry::is_linked("ESM").is_err());
  }
}
