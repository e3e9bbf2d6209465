//! Terminal output for the `standalone-agent` binary

pub mod console;
pub mod renderer;
pub mod validate;

pub use console::Console;
pub use renderer::{format_message, ExecutionRenderer, DEFAULT_TRUNCATE};
pub use validate::{validate_store, FileCheck, ValidationReport};
