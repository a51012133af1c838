use std::{
  path::{Path, PathBuf},
  process::ExitCode,
  sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use packline_core::{
  BundleMatrix, EsbuildBundler, Errors, JobOutcome, PacklineConfig, Pipeline, Summary,
};
use packline_error::{PathExt, CWD};
use sugar_path::SugarPath;

#[derive(Parser, Debug)]
#[command(name = "packline")]
#[command(about = "Builds every package of a repository in every format it ships")]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Bundle, resolve and clean up every selected package
  Build(BuildArgs),
  /// Print the jobs a build would run
  List(ConfigArgs),
  /// Print the JSON schema of the configuration file
  Schema,
}

#[derive(Args, Debug)]
struct ConfigArgs {
  /// Configuration file. Relative paths inside it resolve against its directory
  #[arg(short, long, value_name = "FILE", default_value = "packline.json")]
  config: PathBuf,
}

#[derive(Args, Debug)]
struct BuildArgs {
  #[command(flatten)]
  config: ConfigArgs,

  /// Only build the named packages. May be repeated
  #[arg(long, value_name = "NAME")]
  only: Vec<String>,

  /// Jobs running at once
  #[arg(short, long, value_name = "N")]
  jobs: Option<usize>,

  /// Skip writing `.map` files
  #[arg(long)]
  no_sourcemap: bool,

  /// esbuild binary to run. Looked up through PATH by default
  #[arg(long, value_name = "PATH")]
  esbuild: Option<PathBuf>,
}

struct Loaded {
  config: PacklineConfig,
  root: PathBuf,
}

fn load(args: &ConfigArgs, cwd: &Path) -> anyhow::Result<Loaded> {
  let config_path = cwd.join(&args.config).normalize();
  let config = PacklineConfig::from_config_path(&config_path)?;
  let root = config_path
    .parent()
    .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
  Ok(Loaded { config, root })
}

fn expand(loaded: &Loaded) -> Result<BundleMatrix, Errors> {
  let descriptors = loaded.config.descriptors(&loaded.root)?;
  BundleMatrix::expand(descriptors, &loaded.config.matrix_options(&loaded.root))
}

fn report(errors: Errors) -> ExitCode {
  for err in errors.iter() {
    eprintln!("{}: {}", err.kind.code(), err);
  }
  ExitCode::FAILURE
}

fn build(args: BuildArgs, cwd: &Path) -> anyhow::Result<ExitCode> {
  let mut loaded = load(&args.config, cwd)?;
  if args.no_sourcemap {
    loaded.config.sourcemap = false;
  }
  let selected = expand(&loaded)
    .and_then(|matrix| matrix.select(args.only.as_slice()).map_err(Errors::from));
  let matrix = match selected {
    Ok(matrix) => matrix,
    Err(errors) => return Ok(report(errors)),
  };

  let bundler = match args.esbuild {
    Some(binary) => EsbuildBundler::new(cwd.join(binary).normalize(), &loaded.root),
    None => EsbuildBundler::from_path(&loaded.root),
  };
  let mut pipeline = Pipeline::new(Arc::new(bundler));
  if let Some(concurrency) = args.jobs.or(loaded.config.concurrency) {
    pipeline = pipeline.with_concurrency(concurrency);
  }
  let outcomes = pipeline.write(&matrix)?;

  for line in outcomes.iter().filter_map(JobOutcome::failure_line) {
    eprintln!("{line}");
  }
  let summary = Summary::from_outcomes(&outcomes);
  println!(
    "{} of {} jobs succeeded, {} bytes written, {} rewrites",
    summary.succeeded,
    outcomes.len(),
    summary.total_bytes,
    summary.replacements
  );
  Ok(if summary.is_success() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn list(args: ConfigArgs, cwd: &Path) -> anyhow::Result<ExitCode> {
  let loaded = load(&args, cwd)?;
  let matrix = match expand(&loaded) {
    Ok(matrix) => matrix,
    Err(errors) => return Ok(report(errors)),
  };
  for job in matrix.jobs() {
    println!(
      "{}\t{}\t{}",
      job.name(),
      job.format,
      job.output_path.may_display_relative()
    );
  }
  Ok(ExitCode::SUCCESS)
}

fn run(cli: Cli, cwd: &Path) -> anyhow::Result<ExitCode> {
  match cli.command {
    Command::Build(args) => build(args, cwd),
    Command::List(args) => list(args, cwd),
    Command::Schema => {
      println!("{}", PacklineConfig::json_schema()?);
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn main() -> ExitCode {
  packline_tracing::enable_tracing_on_demand();
  let cli = Cli::parse();
  let cwd = match std::env::current_dir() {
    Ok(cwd) => cwd,
    Err(e) => {
      eprintln!("Could not read the current directory: {e}");
      return ExitCode::FAILURE;
    }
  };
  tracing::debug!("{cli:?}");

  CWD.set(&cwd, || match run(cli, &cwd) {
    Ok(code) => code,
    Err(e) => {
      eprintln!("{e}");
      ExitCode::FAILURE
    }
  })
}
