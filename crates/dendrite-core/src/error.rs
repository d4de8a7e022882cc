//! Error types for Dendrite.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Dendrite operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading source bytes from a file failed
    #[error("reading {url:?} failed: {source}")]
    FileRead {
        url: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No registered parser matches the content type
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Parsing failed
    #[error("parsing error: {0}")]
    Parsing(#[from] ParseError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parser errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Bytes could not be decoded into text with the named encoding
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// Parser-internal failure
    #[error("{parser} failed: {message}")]
    Failed { parser: String, message: String },
}

impl ParseError {
    /// Create a parser failure carrying the parser name.
    pub fn failed(parser: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            parser: parser.into(),
            message: message.into(),
        }
    }
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("chunking failed: {0}")]
    Failed(String),

    /// Tokenizer failure observed by the chunker
    #[error("{0}")]
    Tokenizer(#[from] TokenizeError),
}

/// Tokenizer errors.
#[derive(Error, Debug)]
pub enum TokenizeError {
    #[error("tokenizer failed: {0}")]
    Failed(String),
}

/// Result type alias for Dendrite operations.
pub type Result<T> = std::result::Result<T, Error>;
