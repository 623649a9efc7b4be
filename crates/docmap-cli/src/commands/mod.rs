//! CLI command implementations

pub mod inspect;
pub mod map;
pub mod validate;
