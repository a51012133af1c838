use packline_common::ModuleFormat;
use packline_patch::RewriteRule;

use crate::BundleResult;

/// Rule pointing every literal import of `dependency` in a linked artifact at `resolved`.
///
/// The bundler leaves externals as string literals equal to the identifier, in either
/// quote style. ESM covers `from "x"`, `import "x"` and `import("x")`; CommonJS covers
/// `require("x")`.
pub(crate) fn import_specifier_rule(
  format: ModuleFormat,
  dependency: &str,
  resolved: &str,
) -> BundleResult<RewriteRule> {
  let literal = regex::escape(dependency);
  let lead = if format.is_cjs() {
    r"\brequire\s*\(\s*"
  } else {
    r"\bfrom\s*|\bimport\s*\(\s*|\bimport\s*"
  };
  let pattern = format!(r#"({lead})(?:"{literal}"|'{literal}')"#);
  let resolved = resolved.to_string();
  RewriteRule::new(
    format!("import-specifier:{dependency}"),
    &pattern,
    move |caps| Ok(format!("{}\"{resolved}\"", &caps[1])),
  )
}
