//! Shelf application library
//!
//! Book catalog, reviews and the rating ranking, packaged as modules for the
//! Shelf kernel.

pub mod bootstrap;
pub mod catalog;
pub mod entity;
pub mod modules;
pub mod utils;

pub use bootstrap::{build_registry, prepare, serve};
