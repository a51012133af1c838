use std::path::PathBuf;

use derivative::Derivative;
use packline_error::PathExt;

use crate::{BundleError, BundleResult, ModuleFormat, PositionMap};

/// A finished output file: resolved, cleaned up, ready to be written.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Artifact {
  pub name: String,
  pub format: ModuleFormat,
  pub output_path: PathBuf,
  pub code: String,
  #[derivative(Debug = "ignore")]
  pub position_map: Option<PositionMap>,
  /// Rewrites applied by resolution and cleanup together.
  pub replacements: usize,
}

impl Artifact {
  pub fn map_path(&self) -> PathBuf {
    let mut path = self.output_path.clone().into_os_string();
    path.push(".map");
    PathBuf::from(path)
  }

  /// Writes the code and, when present, its map next to it as `<file>.map`.
  ///
  /// The map is serialized before anything touches the disk, so an invalid map never
  /// leaves a code file behind.
  pub fn write(&self) -> BundleResult<()> {
    let map = match &self.position_map {
      Some(position_map) => {
        let file = self
          .output_path
          .file_name()
          .map(|file| file.to_string_lossy().to_string());
        Some(position_map.to_source_map_v3(&self.code, file.as_deref())?)
      }
      None => None,
    };

    if let Some(dir) = self.output_path.parent() {
      std::fs::create_dir_all(dir).map_err(|e| {
        BundleError::from(e).context(format!(
          "Could not create directory for {}",
          dir.may_display_relative()
        ))
      })?;
    }
    std::fs::write(&self.output_path, &self.code).map_err(|e| {
      BundleError::from(e).context(format!(
        "Could not write {}",
        self.output_path.may_display_relative()
      ))
    })?;
    if let Some(map) = map {
      let map_path = self.map_path();
      std::fs::write(&map_path, map).map_err(|e| {
        BundleError::from(e).context(format!("Could not write {}", map_path.may_display_relative()))
      })?;
    }
    tracing::debug!(
      "wrote {} ({} bytes)",
      self.output_path.may_display_relative(),
      self.code.len()
    );
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use packline_patch::position_map::{Mapping, OriginalLocation};

  use super::*;

  fn artifact(output_path: PathBuf) -> Artifact {
    Artifact {
      name: "core".to_string(),
      format: ModuleFormat::Esm,
      output_path,
      code: "export const a=1;\n".to_string(),
      position_map: None,
      replacements: 0,
    }
  }

  #[test]
  fn writes_code_and_map_side_by_side() {
    let dir = tempfile::tempdir().unwrap();
    let mut map = PositionMap::new(vec!["src/index.js".to_string()]);
    map
      .push(Mapping {
        generated: 0,
        original: OriginalLocation {
          source: 0,
          line: 0,
          column: 0,
          name: None,
        },
      })
      .unwrap();
    let artifact = Artifact {
      position_map: Some(map),
      ..artifact(dir.path().join("dist/core.mjs"))
    };

    artifact.write().unwrap();

    let code = std::fs::read_to_string(dir.path().join("dist/core.mjs")).unwrap();
    assert_eq!(code, "export const a=1;\n");
    let map: serde_json::Value =
      serde_json::from_str(&std::fs::read_to_string(dir.path().join("dist/core.mjs.map")).unwrap())
        .unwrap();
    assert_eq!(map["file"], "core.mjs");
    assert_eq!(map["mappings"], "AAAA");
  }

  #[test]
  fn invalid_map_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut map = PositionMap::new(vec![]);
    map
      .push(Mapping {
        generated: 400,
        original: OriginalLocation {
          source: 0,
          line: 0,
          column: 0,
          name: None,
        },
      })
      .unwrap();
    let artifact = Artifact {
      position_map: Some(map),
      ..artifact(dir.path().join("core.mjs"))
    };

    assert!(artifact.write().is_err());
    assert!(!dir.path().join("core.mjs").exists());
  }
}
