//! CLI command implementations.

pub mod compose;
pub mod concat;
pub mod export;
pub mod info;
pub mod split;
