//! Error types for bundle-swc-rs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the host bundler.
///
/// Resolution misses and filtered-out modules are not errors; hooks report
/// them as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// A tsconfig file (or one it extends) could not be read.
    #[error("Failed to read {path}: {source}")]
    TsconfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tsconfig file is not valid JSONC or has an unexpected shape.
    #[error("Failed to parse {path}: {message}")]
    TsconfigParse { path: PathBuf, message: String },

    /// A tsconfig `extends` chain refers back to itself.
    #[error("Circular tsconfig extends chain at {0}")]
    TsconfigCycle(PathBuf),

    /// An include/exclude pattern failed to compile.
    #[error("Invalid filter pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The compilation target is not an ECMAScript version the compiler knows.
    #[error("Unknown compilation target: {0}")]
    UnknownTarget(String),

    /// The target is older than the syntax the compiler emits. No downleveling
    /// passes run, so honoring it is not possible.
    #[error("Compilation target {0} is not supported, the lowest supported target is es2022")]
    UnsupportedTarget(String),

    /// The compiler rejected a module. The message is the compiler diagnostic.
    #[error("{message}")]
    Transform { id: String, message: String },

    /// The compiler failed to minify a chunk. The message is the compiler diagnostic.
    #[error("{message}")]
    Minify { chunk: String, message: String },

    /// The compiler worker thread is gone.
    #[error("Compiler unavailable: {0}")]
    CompilerUnavailable(String),
}

impl Error {
    /// Module id or chunk file name the failure belongs to, when known.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Error::Transform { id, .. } => Some(id),
            Error::Minify { chunk, .. } => Some(chunk),
            _ => None,
        }
    }
}
