//! Core traits, settings, and the module registry for libris.

pub mod module;
pub mod registry;
pub mod settings;

pub use libris_db::Migration;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
