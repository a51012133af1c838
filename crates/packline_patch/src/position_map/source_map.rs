use packline_error::{Error, Result};
use serde::Deserialize;
use sourcemap::{SourceMap, SourceMapBuilder};

use super::{Mapping, OriginalLocation, PositionMap};

#[derive(Debug, Deserialize)]
struct Header {
  version: u8,
}

/// Line starts of a generated text, to move between byte offsets and the
/// line/UTF-16 column pairs Source Map v3 speaks in.
struct LineIndex<'a> {
  text: &'a str,
  starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  fn new(text: &'a str) -> Self {
    let starts = std::iter::once(0)
      .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
      .collect();
    Self { text, starts }
  }

  fn line_text(&self, line: usize) -> Option<&'a str> {
    let start = *self.starts.get(line)?;
    let end = self
      .starts
      .get(line + 1)
      .map_or(self.text.len(), |next| next - 1);
    self.text.get(start..end)
  }

  fn offset_of(&self, line: usize, utf16_column: usize) -> Option<usize> {
    let line_text = self.line_text(line)?;
    let mut units = 0;
    for (idx, ch) in line_text.char_indices() {
      if units == utf16_column {
        return Some(self.starts[line] + idx);
      }
      units += ch.len_utf16();
    }
    (units == utf16_column).then(|| self.starts[line] + line_text.len())
  }

  fn position_of(&self, offset: usize) -> Option<(usize, usize)> {
    let line = self.starts.partition_point(|start| *start <= offset) - 1;
    let before = self.text.get(self.starts[line]..offset)?;
    Some((line, before.encode_utf16().count()))
  }
}

fn invalid(e: impl ToString) -> Error {
  Error::invalid_position_map(e.to_string())
}

impl PositionMap {
  /// Parses a Source Map v3 document describing `generated`.
  ///
  /// Segments without an original location carry no information for lookups and are
  /// skipped, as are segments pointing past the end of their line.
  pub fn from_source_map_v3(json: &str, generated: &str) -> Result<Self> {
    let header: Header = serde_json::from_str(json).map_err(invalid)?;
    if header.version != 3 {
      return Err(Error::invalid_position_map(format!(
        "unsupported version {}",
        header.version
      )));
    }
    let source_map = SourceMap::from_slice(json.as_bytes()).map_err(invalid)?;

    let index = LineIndex::new(generated);
    let mut map = PositionMap {
      file: source_map.get_file().map(ToString::to_string),
      sources: source_map.sources().map(ToString::to_string).collect(),
      sources_content: (0..source_map.get_source_count())
        .map(|idx| source_map.get_source_contents(idx).map(ToString::to_string))
        .collect(),
      names: source_map.names().map(ToString::to_string).collect(),
      mappings: vec![],
    };

    for token in source_map.tokens() {
      let raw = token.get_raw_token();
      if raw.src_id == !0 {
        continue;
      }
      let (line, column) = (raw.dst_line as usize, raw.dst_col as usize);
      let Some(offset) = index.offset_of(line, column) else {
        tracing::debug!(line, column, "skipping mapping outside of the generated text");
        continue;
      };
      let mapping = Mapping {
        generated: offset,
        original: OriginalLocation {
          source: raw.src_id,
          line: raw.src_line,
          column: raw.src_col,
          name: (raw.name_id != !0).then_some(raw.name_id),
        },
      };
      match map.mappings.last_mut() {
        Some(last) if last.generated == offset => *last = mapping,
        _ => map.push(mapping)?,
      }
    }

    Ok(map)
  }

  /// Serializes this map as a Source Map v3 document for `generated`, the text the
  /// mappings' offsets point into.
  pub fn to_source_map_v3(&self, generated: &str, file: Option<&str>) -> Result<String> {
    let index = LineIndex::new(generated);
    let mut builder = SourceMapBuilder::new(file.or(self.file.as_deref()));
    let source_ids = self
      .sources
      .iter()
      .enumerate()
      .map(|(idx, source)| {
        let id = builder.add_source(source);
        let contents = self.sources_content.get(idx).and_then(Option::as_deref);
        builder.set_source_contents(id, contents);
        id
      })
      .collect::<Vec<_>>();
    let name_ids = self
      .names
      .iter()
      .map(|name| builder.add_name(name))
      .collect::<Vec<_>>();

    for mapping in &self.mappings {
      let (line, column) = index.position_of(mapping.generated).ok_or_else(|| {
        Error::invalid_position_map(format!(
          "mapping at offset {} does not fall on a character boundary of the generated text",
          mapping.generated
        ))
      })?;
      let original = mapping.original;
      let source = source_ids.get(original.source as usize).ok_or_else(|| {
        Error::invalid_position_map(format!("unknown source index {}", original.source))
      })?;
      let name = match original.name {
        Some(idx) => Some(*name_ids.get(idx as usize).ok_or_else(|| {
          Error::invalid_position_map(format!("unknown name index {idx}"))
        })?),
        None => None,
      };
      builder.add_raw(
        line as u32,
        column as u32,
        original.line,
        original.column,
        Some(*source),
        name,
      );
    }

    let mut out = vec![];
    builder
      .into_sourcemap()
      .to_writer(&mut out)
      .map_err(invalid)?;
    String::from_utf8(out).map_err(invalid)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const GENERATED: &str = "import{a}from\"./a.mjs\";\nexport const b=a+1;\n";

  fn sample_map() -> String {
    // line 0 col 0 -> src 0 line 0 col 0
    // line 0 col 6 -> src 0 line 0 col 9
    // line 1 col 0 -> src 0 line 2 col 0
    // line 1 col 13 -> src 0 line 2 col 17
    serde_json::json!({
      "version": 3,
      "sources": ["src/index.js"],
      "names": [],
      "mappings": "AAAA,MAAS;AAET,aAAiB"
    })
    .to_string()
  }

  #[test]
  fn decodes_offsets_and_locations() {
    let map = PositionMap::from_source_map_v3(&sample_map(), GENERATED).unwrap();
    let generated = map.mappings().iter().map(|m| m.generated).collect::<Vec<_>>();
    assert_eq!(generated, vec![0, 6, 24, 37]);
    let last = map.mappings()[3].original;
    assert_eq!((last.line, last.column), (2, 17));
  }

  #[test]
  fn encodes_what_it_decodes() {
    let map = PositionMap::from_source_map_v3(&sample_map(), GENERATED).unwrap();
    let json = map.to_source_map_v3(GENERATED, Some("b.mjs")).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(raw["mappings"], "AAAA,MAAS;AAET,aAAiB");
    assert_eq!(raw["file"], "b.mjs");
    assert_eq!(raw["sources"][0], "src/index.js");
  }

  #[test]
  fn counts_columns_in_utf16_units() {
    let generated = "const s=\"\u{1F600}\";x();";
    let index = LineIndex::new(generated);
    // The emoji is 2 UTF-16 units but 4 bytes.
    let offset = index.offset_of(0, 13).unwrap();
    assert_eq!(&generated[offset..], "x();");
    assert_eq!(index.position_of(offset), Some((0, 13)));
  }

  #[test]
  fn skips_segments_without_an_original_location() {
    let json = serde_json::json!({
      "version": 3,
      "sources": ["src/index.js"],
      "names": ["b"],
      "mappings": "A,MAAMA"
    })
    .to_string();
    let map = PositionMap::from_source_map_v3(&json, GENERATED).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.mappings()[0].generated, 6);
    assert_eq!(map.mappings()[0].original.name, Some(0));
  }

  #[test]
  fn rejects_unknown_source_indexes() {
    let mut map = PositionMap::new(vec![]);
    map
      .push(Mapping {
        generated: 0,
        original: OriginalLocation {
          source: 3,
          line: 0,
          column: 0,
          name: None,
        },
      })
      .unwrap();
    assert!(map.to_source_map_v3(GENERATED, None).is_err());
  }

  #[test]
  fn rejects_other_versions() {
    let json = serde_json::json!({ "version": 2, "sources": [], "mappings": "" }).to_string();
    assert!(PositionMap::from_source_map_v3(&json, "").is_err());
  }
}
