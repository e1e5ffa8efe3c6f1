//! Shelf kernel: layered settings, the `Module` contract and the registry
//! that drives module lifecycle.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{AppState, InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
