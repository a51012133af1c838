//! Ordered, regex driven text rewriting that keeps a [PositionMap] valid across passes.
//!
//! - `rule`: [RewriteRule] and named, ordered [Battery] lists of them
//! - `engine`: [apply] runs rules over a text one after another
//! - `position_map`: the offset table being kept in sync, plus a Source Map v3 codec

mod engine;
pub use engine::*;
mod rule;
pub use rule::*;
pub mod position_map;
pub use position_map::PositionMap;

pub use regex::Captures;
