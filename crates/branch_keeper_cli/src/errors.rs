use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the branch-keeper CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file is missing, unreadable or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A provider configuration names a token variable that is not set.
    #[error("Token variable {variable} for provider config '{provider}' is not set")]
    MissingToken { provider: String, variable: String },

    /// Failed to read a resource document.
    #[error("Failed to load resource document {path:?}")]
    LoadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The resource document is not a valid protected branch.
    #[error("Failed to parse resource document {path:?}")]
    ParseResource {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write the updated resource document back.
    #[error("Failed to write resource document {path:?}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The convergence engine returned an error.
    #[error(transparent)]
    Core(#[from] branch_keeper_core::Error),
}
