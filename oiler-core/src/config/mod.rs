//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware build script
//! parses `machine.toml` into these types, validates them, and embeds them
//! as postcard binary data.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::ConfigError;
