//! Generated offset -> original location table that travels with an artifact while it is
//! being patched.
//!
//! Offsets are byte offsets into the generated text. Mappings are kept strictly increasing
//! by generated offset; a lookup resolves to the closest preceding mapping, which is what
//! keeps debugging tools pointing somewhere sensible after a span has been rewritten.

mod source_map;

use packline_error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalLocation {
  /// Index into [PositionMap::sources].
  pub source: u32,
  /// Zero based.
  pub line: u32,
  /// Zero based, in UTF-16 code units.
  pub column: u32,
  /// Index into [PositionMap::names].
  pub name: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
  pub generated: usize,
  pub original: OriginalLocation,
}

/// `text[start..end]` was replaced by `replacement_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
  pub start: usize,
  pub end: usize,
  pub replacement_len: usize,
}

impl Edit {
  pub fn delta(&self) -> isize {
    self.replacement_len as isize - (self.end - self.start) as isize
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
  pub file: Option<String>,
  pub sources: Vec<String>,
  pub sources_content: Vec<Option<String>>,
  pub names: Vec<String>,
  mappings: Vec<Mapping>,
}

impl PositionMap {
  pub fn new(sources: Vec<String>) -> Self {
    Self {
      sources,
      ..Default::default()
    }
  }

  pub fn mappings(&self) -> &[Mapping] {
    &self.mappings
  }

  pub fn len(&self) -> usize {
    self.mappings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.mappings.is_empty()
  }

  pub fn push(&mut self, mapping: Mapping) -> Result<()> {
    match self.mappings.last() {
      Some(last) if last.generated >= mapping.generated => Err(Error::invalid_position_map(format!(
        "mapping at generated offset {} follows a mapping at offset {}",
        mapping.generated, last.generated
      ))),
      _ => {
        self.mappings.push(mapping);
        Ok(())
      }
    }
  }

  /// The mapping in effect at `offset`: the last one starting at or before it.
  pub fn resolve(&self, offset: usize) -> Option<&Mapping> {
    let idx = self
      .mappings
      .partition_point(|mapping| mapping.generated <= offset);
    idx.checked_sub(1).map(|idx| &self.mappings[idx])
  }

  pub fn is_strictly_ordered(&self) -> bool {
    self
      .mappings
      .windows(2)
      .all(|pair| pair[0].generated < pair[1].generated)
  }

  /// Moves every mapping through `edits`, which must be sorted and non-overlapping, all
  /// expressed in offsets of the text before any of them was applied. `output` is the text
  /// after all of them were applied.
  ///
  /// - Mappings before an edit do not move.
  /// - Mappings at or after an edit's end shift by the edit's delta.
  /// - Mappings strictly inside a replaced span survive only when the replacement has the
  ///   same byte length and they still fall on a character boundary of `output`. Otherwise
  ///   they are dropped and lookups fall back to the mapping at the start of the span.
  /// - When two mappings land on the same offset, the later one wins: it describes the
  ///   text that now follows that offset.
  pub fn remap(&mut self, edits: &[Edit], output: &str) {
    if edits.is_empty() || self.mappings.is_empty() {
      return;
    }

    let mut remapped: Vec<Mapping> = Vec::with_capacity(self.mappings.len());
    let mut pending = edits.iter().peekable();
    let mut delta: isize = 0;

    for mapping in self.mappings.drain(..) {
      let offset = mapping.generated;
      while let Some(edit) = pending.next_if(|edit| edit.end <= offset) {
        delta += edit.delta();
      }

      let generated = (offset as isize + delta) as usize;
      if let Some(edit) = pending.peek() {
        if edit.start < offset && (edit.delta() != 0 || !output.is_char_boundary(generated)) {
          continue;
        }
      }

      let mapping = Mapping {
        generated,
        ..mapping
      };
      match remapped.last_mut() {
        Some(last) if last.generated == mapping.generated => *last = mapping,
        _ => remapped.push(mapping),
      }
    }

    self.mappings = remapped;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn loc(line: u32, column: u32) -> OriginalLocation {
    OriginalLocation {
      source: 0,
      line,
      column,
      name: None,
    }
  }

  fn map_at(offsets: &[usize]) -> PositionMap {
    let mut map = PositionMap::new(vec!["src/index.js".to_string()]);
    for (idx, offset) in offsets.iter().enumerate() {
      map
        .push(Mapping {
          generated: *offset,
          original: loc(0, idx as u32),
        })
        .unwrap();
    }
    map
  }

  fn generated(map: &PositionMap) -> Vec<usize> {
    map.mappings().iter().map(|m| m.generated).collect()
  }

  fn columns(map: &PositionMap) -> Vec<u32> {
    map.mappings().iter().map(|m| m.original.column).collect()
  }

  #[test]
  fn rejects_out_of_order_pushes() {
    let mut map = map_at(&[0, 10]);
    let err = map
      .push(Mapping {
        generated: 10,
        original: loc(1, 0),
      })
      .unwrap_err();
    assert_eq!(
      err.kind.code(),
      packline_error::error_code::INVALID_POSITION_MAP
    );
  }

  #[test]
  fn resolves_to_closest_preceding_mapping() {
    let map = map_at(&[4, 10]);
    assert!(map.resolve(3).is_none());
    assert_eq!(map.resolve(4).unwrap().original.column, 0);
    assert_eq!(map.resolve(9).unwrap().original.column, 0);
    assert_eq!(map.resolve(100).unwrap().original.column, 1);
  }

  #[test]
  fn same_length_edit_leaves_the_map_alone() {
    let mut map = map_at(&[0, 5, 7, 12]);
    let before = map.clone();
    map.remap(
      &[Edit {
        start: 4,
        end: 9,
        replacement_len: 5,
      }],
      &"x".repeat(16),
    );
    assert_eq!(map, before);
  }

  #[test]
  fn shortening_shifts_following_mappings() {
    let mut map = map_at(&[0, 3, 9, 20]);
    map.remap(
      &[Edit {
        start: 3,
        end: 9,
        replacement_len: 2,
      }],
      &"x".repeat(20),
    );
    assert_eq!(generated(&map), vec![0, 3, 5, 16]);
    assert!(map.is_strictly_ordered());
  }

  #[test]
  fn drops_mappings_inside_a_resized_span() {
    let mut map = map_at(&[0, 2, 4, 6, 10]);
    map.remap(
      &[Edit {
        start: 2,
        end: 10,
        replacement_len: 3,
      }],
      &"x".repeat(8),
    );
    // 2 stays at the span start, 10 follows the span, 4 and 6 collapse into it.
    assert_eq!(generated(&map), vec![0, 2, 5]);
    assert_eq!(columns(&map), vec![0, 1, 4]);
  }

  #[test]
  fn drops_mappings_that_would_split_a_character() {
    // "abc;d" -> "\u{e9}x;d": same byte length, but byte 1 is inside the two byte "\u{e9}".
    let mut map = map_at(&[0, 1, 2, 4]);
    map.remap(
      &[Edit {
        start: 0,
        end: 3,
        replacement_len: 3,
      }],
      "\u{e9}x;d",
    );
    assert_eq!(generated(&map), vec![0, 2, 4]);
    assert_eq!(columns(&map), vec![0, 2, 3]);
  }

  #[test]
  fn deletion_prefers_the_mapping_of_the_following_text() {
    let mut map = map_at(&[0, 5, 8]);
    map.remap(
      &[Edit {
        start: 5,
        end: 8,
        replacement_len: 0,
      }],
      &"x".repeat(8),
    );
    assert_eq!(generated(&map), vec![0, 5]);
    assert_eq!(columns(&map), vec![0, 2]);
  }

  #[test]
  fn accumulates_deltas_across_edits() {
    let mut map = map_at(&[1, 6, 11, 16]);
    map.remap(
      &[
        Edit {
          start: 2,
          end: 4,
          replacement_len: 5,
        },
        Edit {
          start: 8,
          end: 10,
          replacement_len: 0,
        },
      ],
      &"x".repeat(20),
    );
    assert_eq!(generated(&map), vec![1, 9, 12, 17]);
  }
}
