pub mod commands;
pub mod document;

pub use commands::{Cli, Commands};
pub use document::{language_for_path, FileDocument};
