//! gpg_identity - self-signed OpenPGP identities with a trusted admin peer
//!
//! This crate generates a complete, self-signed PGP identity, imports a
//! counterpart's public key, exports its own public key and exchanges
//! signed and encrypted messages with the counterpart.

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod model;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items for convenience
pub use crate::config::{IdentityConfig, KeyAlgorithm};
pub use crate::core::{GpgResource, IdentityStore};
pub use crate::crypto::{
    DecryptedMessage, EncryptedMessage, Identity, MessageCipher, Recipient, SignerStatus,
    TrustedPeer,
};
pub use crate::error::{GpgError, Result};
pub use crate::model::ResourceState;
