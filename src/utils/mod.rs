//! Shared helpers

pub mod debug;
pub mod http;
pub mod keywords;
