//! Cleanup batteries, one per output format.
//!
//! Each battery is a contract against the emission style of the minifier in use: patterns
//! assume its spacing and quoting, and must be revisited whenever it is upgraded. All of
//! them are idempotent: running a battery over its own output rewrites nothing.

use once_cell::sync::Lazy;
use packline_common::ModuleFormat;
use packline_patch::{Battery, RewriteRule};

fn drop_use_strict() -> RewriteRule {
  RewriteRule::template(
    "drop-use-strict",
    r#"(?m)^[ \t]*["']use strict["'];?[ \t]*\n?"#,
    "",
  )
  .unwrap()
}

/// Relative specifiers only: bare identifiers are still waiting to be resolved when this
/// battery runs too early, and must not be touched.
fn tighten_relative_from() -> RewriteRule {
  RewriteRule::new(
    "tighten-relative-from",
    r#"\}(?:\s+from\s*|from\s+)"(\.{1,2}/[^"]*)"|\}\s*from\s*'(\.{1,2}/[^'"]*)'"#,
    |caps| {
      let specifier = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map_or("", |m| m.as_str());
      Ok(format!("}}from\"{specifier}\""))
    },
  )
  .unwrap()
}

fn drop_empty_export() -> RewriteRule {
  RewriteRule::template("drop-empty-export", r"(?m)^export\s*\{\s*\};?\n?", "").unwrap()
}

fn shorten_es_module_flag() -> RewriteRule {
  RewriteRule::template(
    "shorten-es-module-flag",
    r#"Object\.defineProperty\(\s*exports\s*,\s*["']__esModule["']\s*,\s*\{\s*value\s*:\s*(?:true|!0)\s*\}\s*\)"#,
    "exports.__esModule=!0",
  )
  .unwrap()
}

fn normalize_relative_require() -> RewriteRule {
  RewriteRule::new(
    "normalize-relative-require",
    r#"\brequire\((?:\s*'(\.{1,2}/[^'"]*)'\s*|\s+"(\.{1,2}/[^"]*)"\s*|"(\.{1,2}/[^"]*)"\s+)\)"#,
    |caps| {
      let specifier = (1..=3)
        .find_map(|idx| caps.get(idx))
        .map_or("", |m| m.as_str());
      Ok(format!("require(\"{specifier}\")"))
    },
  )
  .unwrap()
}

fn typeof_not_undefined() -> RewriteRule {
  RewriteRule::template(
    "typeof-not-undefined",
    r#"\btypeof\s+([\w$.]+)\s*!==?\s*["']undefined["']"#,
    r#"typeof $1<"u""#,
  )
  .unwrap()
}

fn typeof_is_undefined() -> RewriteRule {
  RewriteRule::template(
    "typeof-is-undefined",
    r#"\btypeof\s+([\w$.]+)\s*===?\s*["']undefined["']"#,
    r#"typeof $1>"u""#,
  )
  .unwrap()
}

static LINKED_ESM_CLEANUP: Lazy<Battery> = Lazy::new(|| {
  Battery::new(
    ModuleFormat::Esm.spec().battery,
    vec![
      drop_use_strict(),
      tighten_relative_from(),
      drop_empty_export(),
    ],
  )
});

static LINKED_CJS_CLEANUP: Lazy<Battery> = Lazy::new(|| {
  Battery::new(
    ModuleFormat::Cjs.spec().battery,
    vec![shorten_es_module_flag(), normalize_relative_require()],
  )
});

static BUNDLED_GLOBAL_CLEANUP: Lazy<Battery> = Lazy::new(|| {
  Battery::new(
    ModuleFormat::Iife.spec().battery,
    vec![typeof_not_undefined(), typeof_is_undefined()],
  )
});

pub fn battery_for(format: ModuleFormat) -> &'static Battery {
  match format {
    ModuleFormat::Esm => &LINKED_ESM_CLEANUP,
    ModuleFormat::Cjs => &LINKED_CJS_CLEANUP,
    ModuleFormat::Iife => &BUNDLED_GLOBAL_CLEANUP,
  }
}
