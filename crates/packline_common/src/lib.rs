mod format;
pub use format::*;
mod descriptor;
pub use descriptor::*;
mod packaging_options;
pub use packaging_options::*;
pub mod file_name;
mod name_helpers;
pub use name_helpers::*;
