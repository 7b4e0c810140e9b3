//! CLI error types and conversions

use crate::client::ClientError;
use crate::identifier::IdentifierError;
use crate::output::OutputError;
use crate::riot::RiotError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Identifier error
    #[error("identifier error: {0}")]
    IdentifierError(#[from] IdentifierError),

    /// Client error
    #[error("client error: {0}")]
    ClientError(#[from] ClientError),

    /// Riot API error
    #[error("riot API error: {0}")]
    RiotError(#[from] RiotError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Interrupted by Ctrl+C
    #[error("interrupted")]
    Interrupted,
}
