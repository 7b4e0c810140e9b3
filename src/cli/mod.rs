//! CLI command implementations

pub mod error;
pub mod export;
pub mod platforms;
pub mod validate;

pub use error::CliError;
pub use export::{Cli, Commands, ExportArgs, ExportReport, OutputFormat};
pub use platforms::PlatformsCommand;
pub use validate::ValidateCommand;
