//! Economic indicator panels: catalog, country selection, panel alignment
//! and first/last cross-section extraction under missing data.
//!
//! The desktop viewer in `main.rs` is one presentation layer on top of
//! [`session::Session`]; everything here is I/O-free apart from the file
//! loaders and exporters.

pub mod analysis;
pub mod config;
pub mod data;
pub mod notice;
pub mod session;
