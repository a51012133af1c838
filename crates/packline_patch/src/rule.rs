use std::{borrow::Cow, sync::Arc};

use derivative::Derivative;
use packline_error::{Error, Result};
use regex::{Captures, Regex};

pub type RewriteFn = Arc<dyn Fn(&Captures) -> anyhow::Result<String> + Send + Sync>;

/// A pattern plus a pure function from its captures to the replacement text.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct RewriteRule {
  name: Cow<'static, str>,
  pattern: Regex,
  #[derivative(Debug = "ignore")]
  rewrite: RewriteFn,
}

impl RewriteRule {
  /// Patterns able to match the empty string are rejected: a global scan over them would
  /// rewrite between every pair of characters.
  pub fn new(
    name: impl Into<Cow<'static, str>>,
    pattern: &str,
    rewrite: impl Fn(&Captures) -> anyhow::Result<String> + Send + Sync + 'static,
  ) -> Result<Self> {
    let name = name.into();
    let pattern =
      Regex::new(pattern).map_err(|e| Error::invalid_rewrite_pattern(name.clone(), e.to_string()))?;
    if pattern.is_match("") {
      return Err(Error::invalid_rewrite_pattern(
        name,
        format!("`{pattern}` matches the empty string"),
      ));
    }
    Ok(Self {
      name,
      pattern,
      rewrite: Arc::new(rewrite),
    })
  }

  /// Replacement written in the regex crate's expansion syntax: `$1`, `${name}`, `$$`.
  /// Use `${1}` when a group reference is directly followed by a word character.
  pub fn template(
    name: impl Into<Cow<'static, str>>,
    pattern: &str,
    template: impl Into<String>,
  ) -> Result<Self> {
    let template = template.into();
    Self::new(name, pattern, move |caps| {
      let mut dst = String::new();
      caps.expand(&template, &mut dst);
      Ok(dst)
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn pattern(&self) -> &Regex {
    &self.pattern
  }

  pub(crate) fn rewrite(&self, caps: &Captures) -> anyhow::Result<String> {
    (self.rewrite)(caps)
  }
}

/// An ordered, named set of rules applied together to one class of artifact. Later rules
/// see the output of earlier ones.
#[derive(Debug, Clone)]
pub struct Battery {
  name: Cow<'static, str>,
  rules: Vec<RewriteRule>,
}

impl Battery {
  pub fn new(name: impl Into<Cow<'static, str>>, rules: Vec<RewriteRule>) -> Self {
    Self {
      name: name.into(),
      rules,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn rules(&self) -> &[RewriteRule] {
    &self.rules
  }
}
