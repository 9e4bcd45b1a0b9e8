//! Report surfaces over a loaded review snapshot: terminal tables and the
//! HTTP API.

pub mod api;
pub mod render;
