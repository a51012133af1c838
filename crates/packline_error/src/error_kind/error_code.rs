// --- Run-fatal: raised while validating configuration, before any job starts
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
pub const UNKNOWN_FORMAT: &str = "UNKNOWN_FORMAT";
pub const INVALID_REWRITE_PATTERN: &str = "INVALID_REWRITE_PATTERN";

// --- Job-fatal: only the job that hit them fails
pub const UNRESOLVED_DEPENDENCY: &str = "UNRESOLVED_DEPENDENCY";
pub const REWRITE_FAILURE: &str = "REWRITE_FAILURE";
pub const BUNDLER_FAILED: &str = "BUNDLER_FAILED";
pub const INVALID_POSITION_MAP: &str = "INVALID_POSITION_MAP";
pub const IO_ERROR: &str = "IO_ERROR";

pub const PANIC: &str = "PANIC";
