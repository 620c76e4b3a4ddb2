//! Error types for page rendering, theming and capture

use thiserror::Error;

/// Result type alias for linkpage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or capturing the page
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start the browser engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load the page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Failed to render or capture content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// A script evaluated in the page failed
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// The page did not settle in time
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem access failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image decode or encode failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
