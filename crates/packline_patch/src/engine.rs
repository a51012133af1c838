use packline_error::{Error, Result};

use crate::{
  position_map::{Edit, PositionMap},
  Battery, RewriteRule,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
  pub text: String,
  /// Present when a map was passed in, updated through every pass.
  pub position_map: Option<PositionMap>,
  /// Total number of matches rewritten across all rules.
  pub replacements: usize,
}

impl PatchResult {
  fn apply_rule(&mut self, rule: &RewriteRule) -> Result<()> {
    let mut edits = vec![];
    let mut output = String::with_capacity(self.text.len());
    let mut last_end = 0;

    for caps in rule.pattern().captures_iter(&self.text) {
      let Some(matched) = caps.get(0) else {
        continue;
      };
      if matched.is_empty() {
        return Err(Error::rewrite_failure(
          rule.name(),
          "",
          format!("empty match at byte {}", matched.start()),
        ));
      }
      let replacement = rule
        .rewrite(&caps)
        .map_err(|e| Error::rewrite_failure(rule.name(), matched.as_str(), e))?;

      output.push_str(&self.text[last_end..matched.start()]);
      output.push_str(&replacement);
      last_end = matched.end();
      edits.push(Edit {
        start: matched.start(),
        end: matched.end(),
        replacement_len: replacement.len(),
      });
    }

    if edits.is_empty() {
      return Ok(());
    }
    output.push_str(&self.text[last_end..]);

    tracing::trace!(
      rule = rule.name(),
      replacements = edits.len(),
      "applied rewrite rule"
    );
    if let Some(position_map) = &mut self.position_map {
      position_map.remap(&edits, &output);
    }
    self.text = output;
    self.replacements += edits.len();
    Ok(())
  }
}

/// Runs `rules` over `text` strictly in order. Each rule rewrites every non-overlapping
/// match of its pattern, scanning left to right over the output of the previous rule.
///
/// Any failing rule fails the whole call; no partially patched text is returned.
pub fn apply(
  text: &str,
  position_map: Option<PositionMap>,
  rules: &[RewriteRule],
) -> Result<PatchResult> {
  let mut result = PatchResult {
    text: text.to_string(),
    position_map,
    replacements: 0,
  };
  for rule in rules {
    result.apply_rule(rule)?;
  }
  Ok(result)
}

pub fn apply_battery(
  text: &str,
  position_map: Option<PositionMap>,
  battery: &Battery,
) -> Result<PatchResult> {
  apply(text, position_map, battery.rules())
    .map_err(|e| e.context(format!("while running battery \"{}\"", battery.name())))
}

#[cfg(test)]
mod tests {
  use packline_error::error_code;

  use super::*;
  use crate::position_map::{Mapping, OriginalLocation};

  fn map_at(offsets: &[usize]) -> PositionMap {
    let mut map = PositionMap::new(vec!["src/index.js".to_string()]);
    for (idx, offset) in offsets.iter().enumerate() {
      map
        .push(Mapping {
          generated: *offset,
          original: OriginalLocation {
            source: 0,
            line: 0,
            column: idx as u32,
            name: None,
          },
        })
        .unwrap();
    }
    map
  }

  fn offsets(result: &PatchResult) -> Vec<usize> {
    result
      .position_map
      .as_ref()
      .unwrap()
      .mappings()
      .iter()
      .map(|m| m.generated)
      .collect()
  }

  #[test]
  fn replaces_every_match() {
    let rule = RewriteRule::template("semis", ";{2,}", ";").unwrap();
    let result = apply("a();;b();;;c()", None, &[rule]).unwrap();
    assert_eq!(result.text, "a();b();c()");
    assert_eq!(result.replacements, 2);
    assert!(result.position_map.is_none());
  }

  #[test]
  fn later_rules_see_earlier_output() {
    let rules = [
      RewriteRule::template("a-to-b", "a", "b").unwrap(),
      RewriteRule::template("bb-to-c", "bb", "c").unwrap(),
    ];
    assert_eq!(apply("ab", None, &rules).unwrap().text, "c");

    let reversed = [rules[1].clone(), rules[0].clone()];
    assert_eq!(apply("ab", None, &reversed).unwrap().text, "bb");
  }

  #[test]
  fn rewrites_from_captures_without_overlap() {
    let rule = RewriteRule::new("upper-pairs", r"(\w)(\w)", |caps| {
      Ok(format!("{}{}", &caps[2], caps[1].to_uppercase()))
    })
    .unwrap();
    assert_eq!(apply("abcde", None, &[rule]).unwrap().text, "bAdCe");
  }

  #[test]
  fn zero_width_match_at_runtime_is_a_rewrite_failure() {
    let rule = RewriteRule::template("boundary", r"\b", "|").unwrap();
    let err = apply("word", None, &[rule]).unwrap_err();
    assert_eq!(err.kind.code(), error_code::REWRITE_FAILURE);
  }

  #[test]
  fn failing_rewrite_names_rule_and_match() {
    let rules = [
      RewriteRule::template("first", "x", "y").unwrap(),
      RewriteRule::new("explode", "y+", |_| anyhow::bail!("refusing")).unwrap(),
    ];
    let err = apply("axx", None, &rules).unwrap_err();
    assert_eq!(err.kind.code(), error_code::REWRITE_FAILURE);
    assert_eq!(
      err.kind.to_string(),
      r#"Rewrite rule "explode" failed on "yy": refusing"#
    );
  }

  #[test]
  fn same_length_rewrite_keeps_position_map() {
    let rule = RewriteRule::template("rename", "foo", "bar").unwrap();
    let map = map_at(&[0, 4, 9]);
    let result = apply("foo(foo);foo", Some(map.clone()), &[rule]).unwrap();
    assert_eq!(result.text, "bar(bar);bar");
    assert_eq!(result.position_map, Some(map));
  }

  #[test]
  fn shortening_by_k_shifts_following_mappings_by_k() {
    let rule = RewriteRule::template("void", "undefined", "void 0").unwrap();
    // "undefined" (9 bytes) -> "void 0" (6 bytes): k = 3
    let result = apply("x=undefined;y()", Some(map_at(&[0, 2, 11, 12])), &[rule]).unwrap();
    assert_eq!(result.text, "x=void 0;y()");
    assert_eq!(offsets(&result), vec![0, 2, 8, 9]);
  }

  #[test]
  fn chained_passes_keep_map_ordered_and_resolvable() {
    let rules = [
      RewriteRule::template("strict", r#""use strict";"#, "").unwrap(),
      RewriteRule::template("semis", ";{2,}", ";").unwrap(),
    ];
    let text = r#""use strict";a();;;b();"#;
    let result = apply(text, Some(map_at(&[0, 13, 16, 19])), &rules).unwrap();
    assert_eq!(result.text, "a();b();");
    let map = result.position_map.unwrap();
    assert!(map.is_strictly_ordered());
    // `b();` now starts at byte 4 and still resolves to its own original column.
    assert_eq!(map.resolve(4).unwrap().original.column, 3);
    assert_eq!(map.resolve(0).unwrap().original.column, 1);
  }

  #[test]
  fn multi_byte_replacement_keeps_the_map_encodable() {
    let rule = RewriteRule::template("accent", "abc", "\u{e9}x").unwrap();
    let result = apply("abc;d", Some(map_at(&[0, 1, 4])), &[rule]).unwrap();
    assert_eq!(result.text, "\u{e9}x;d");
    assert_eq!(offsets(&result), vec![0, 4]);

    let json = result
      .position_map
      .as_ref()
      .unwrap()
      .to_source_map_v3(&result.text, None)
      .unwrap();
    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    // "\u{e9}x;" is three UTF-16 units, so `d` sits at column 3.
    assert_eq!(raw["mappings"], "AAAA,GAAE");
  }

  #[test]
  fn battery_errors_carry_the_battery_name() {
    let battery = Battery::new(
      "failing",
      vec![RewriteRule::new("nope", "a", |_| anyhow::bail!("no")).unwrap()],
    );
    let err = apply_battery("a", None, &battery).unwrap_err();
    assert_eq!(err.contexts(), ["while running battery \"failing\""]);
  }
}
