use std::sync::atomic::AtomicBool;

use tracing::Level;
use tracing_subscriber::{
  filter::{LevelFilter, Targets},
  fmt,
  prelude::*,
  EnvFilter,
};

/// Setting this variable turns tracing on. Its value is the level for `packline*` targets.
pub const PACKLINE_LOG: &str = "PACKLINE_LOG";

static IS_INIT: AtomicBool = AtomicBool::new(false);

/// `env_var` may narrow things further with `RUST_LOG` syntax; when unset, `level` applies.
fn subscriber(level: Level, env_var: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .with_env_var(env_var)
        .from_env_lossy(),
    )
    .with(Targets::new().with_targets(vec![
      ("packline", level),
      ("packline_common", level),
      ("packline_core", level),
      ("packline_patch", level),
      ("packline_resolver", level),
    ]))
}

pub fn init(level: Level) {
  if !IS_INIT.swap(true, std::sync::atomic::Ordering::SeqCst) {
    subscriber(level, EnvFilter::DEFAULT_ENV).init();
  }
}

fn parse_level(value: &str) -> Level {
  value.trim().parse::<Level>().unwrap_or(Level::TRACE)
}

pub fn enable_tracing_on_demand() {
  if let Ok(value) = std::env::var(PACKLINE_LOG) {
    init(parse_level(&value));
  }
}
