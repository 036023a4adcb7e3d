//! CLI command implementations.

pub mod build;
pub mod circuit;
pub mod common;
pub mod run;
pub mod version;
