mod error;
pub use error::*;
mod error_kind;
pub use error_kind::*;
mod errors;
pub use errors::*;
mod utils;
pub use utils::*;

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;
pub use anyhow;
pub use anyhow::format_err;

scoped_tls::scoped_thread_local!(pub static CWD: PathBuf);
