//! Core application functionality
//!
//! This module contains the core application logic, including:
//! - Error types shared by every stage
//! - Settings, config file and CLI handling
//! - The command runner

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;
pub mod settings;

// Re-export commonly used items
pub use cli::{CliArgs, Command};
pub use config_file::ConfigFile;
pub use errors::{
    BubbleKernError, BubbleKernResult, GeometryError, PreconditionError, SchemaError, SyntaxError,
};
pub use runner::run_app;
pub use settings::Settings;
