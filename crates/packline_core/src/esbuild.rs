use std::{
  path::{Path, PathBuf},
  process::Command,
};

use packline_error::PathExt;

use crate::{
  BuildJob, BundleError, BundleResult, Bundler, BundlerName, ModuleFormat, PositionMap,
  RawOutput,
};

/// Runs the `esbuild` binary once per job.
///
/// Output goes to a scratch directory and is read back, so nothing lands at the job's
/// output path before finalization has succeeded.
#[derive(Debug, Clone)]
pub struct EsbuildBundler {
  binary: PathBuf,
  cwd: PathBuf,
}

impl EsbuildBundler {
  pub fn new(binary: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      binary: binary.into(),
      cwd: cwd.into(),
    }
  }

  /// The `esbuild` binary found through `PATH`.
  pub fn from_path(cwd: impl Into<PathBuf>) -> Self {
    Self::new("esbuild", cwd)
  }

  fn args(&self, job: &BuildJob, outfile: &Path) -> Vec<String> {
    let options = &job.options;
    let mut args = vec![
      job.input.to_string_lossy().to_string(),
      "--bundle".to_string(),
      format!("--format={}", job.format.id()),
      format!("--platform={}", platform(job.format)),
      format!("--outfile={}", outfile.display()),
      "--log-level=warning".to_string(),
    ];
    if options.minify {
      args.push("--minify".to_string());
    }
    if options.sourcemap {
      args.push("--sourcemap".to_string());
    }
    if job.format.is_linked() {
      args.extend(job.externals.iter().map(|id| format!("--external:{id}")));
    }
    if let Some(global_name) = &options.global_name {
      args.push(format!("--global-name={global_name}"));
      if options.extend {
        args.push(format!(
          "--banner:js=var __packline_prev_{global_name}=typeof {global_name}<\"u\"?{global_name}:{{}};"
        ));
        args.push(format!(
          "--footer:js={global_name}=Object.assign(__packline_prev_{global_name},{global_name});"
        ));
      }
    }
    args
  }
}

fn platform(format: ModuleFormat) -> &'static str {
  match format {
    ModuleFormat::Cjs => "node",
    ModuleFormat::Esm | ModuleFormat::Iife => "browser",
  }
}

impl Bundler for EsbuildBundler {
  fn name(&self) -> BundlerName {
    "esbuild".into()
  }

  fn bundle(&self, job: &BuildJob) -> BundleResult<RawOutput> {
    let scratch = tempfile::tempdir()?;
    let file_name = job.output_path.file_name().map_or_else(
      || format!("out.{}", job.format.extension()),
      |name| name.to_string_lossy().to_string(),
    );
    let outfile = scratch.path().join(file_name);
    let args = self.args(job, &outfile);
    tracing::trace!("{} {}", self.binary.display(), args.join(" "));

    let output = Command::new(&self.binary)
      .args(&args)
      .current_dir(&self.cwd)
      .output()
      .map_err(|e| {
        BundleError::bundler_failed(
          self.name(),
          format!("could not run {}: {e}", self.binary.may_display_relative()),
        )
      })?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BundleError::bundler_failed(
        self.name(),
        format!("{}\n{}", output.status, stderr.trim_end()),
      ));
    }

    let code = std::fs::read_to_string(&outfile)?;
    if !job.options.sourcemap {
      return Ok(RawOutput::new(code));
    }
    let mut map_path = outfile.into_os_string();
    map_path.push(".map");
    let json = std::fs::read_to_string(PathBuf::from(map_path))?;
    let position_map = PositionMap::from_source_map_v3(&json, &code)?;
    Ok(RawOutput::new(code).with_position_map(position_map))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{BundleMatrix, MatrixOptions, PackageDescriptor};

  fn jobs() -> Vec<BuildJob> {
    BundleMatrix::expand(
      vec![
        PackageDescriptor::new("signals", "src/index.js")
          .with_externals(["core"])
          .with_global_name("preactSignals", true)
          .with_formats([ModuleFormat::Esm, ModuleFormat::Iife]),
        PackageDescriptor::new("core", "core.js"),
      ],
      &MatrixOptions {
        minify: false,
        ..Default::default()
      },
    )
    .unwrap()
    .jobs()
    .to_vec()
  }

  #[test]
  fn linked_jobs_keep_externals() {
    let bundler = EsbuildBundler::from_path(".");
    let jobs = jobs();
    let args = bundler.args(&jobs[0], Path::new("/tmp/x/signals.mjs"));
    assert_eq!(
      args,
      [
        "src/index.js",
        "--bundle",
        "--format=esm",
        "--platform=browser",
        "--outfile=/tmp/x/signals.mjs",
        "--log-level=warning",
        "--sourcemap",
        "--external:core",
      ]
    );
  }

  #[test]
  fn bundled_jobs_inline_externals_and_extend_their_global() {
    let bundler = EsbuildBundler::from_path(".");
    let jobs = jobs();
    let args = bundler.args(&jobs[1], Path::new("/tmp/x/signals.iife.js"));
    assert!(!args.iter().any(|arg| arg.starts_with("--external")));
    assert!(args.contains(&"--format=iife".to_string()));
    assert!(args.contains(&"--global-name=preactSignals".to_string()));
    assert!(args.contains(
      &r#"--banner:js=var __packline_prev_preactSignals=typeof preactSignals<"u"?preactSignals:{};"#
        .to_string()
    ));
    assert!(args.contains(
      &"--footer:js=preactSignals=Object.assign(__packline_prev_preactSignals,preactSignals);"
        .to_string()
    ));
  }

  #[test]
  fn missing_binary_is_a_bundler_failure() {
    let bundler = EsbuildBundler::new("/nonexistent/esbuild", ".");
    let err = bundler.bundle(&jobs()[0]).unwrap_err();
    assert_eq!(err.kind.code(), packline_error::error_code::BUNDLER_FAILED);
  }
}
