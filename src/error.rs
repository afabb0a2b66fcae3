//! Error types for identity, trust and message operations

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by every fallible operation of the crate.
///
/// Construction and self-signing errors are fatal to the identity being
/// built: no partially signed identity is ever handed out. Import, encrypt
/// and decrypt errors leave the owning identity untouched.
#[derive(Debug, Error)]
pub enum GpgError {
    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("self-signing failed: {0}")]
    Signing(String),

    #[error("failed to import public key: {0}")]
    Import(String),

    #[error("key export failed: {0}")]
    Export(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid message encoding: {0}")]
    Decoding(#[from] base64::DecodeError),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("no {0} public key attached")]
    MissingPeer(&'static str),

    #[error("integrity verification failed for {}", .0.display())]
    Integrity(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GpgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GpgError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GpgError>;
