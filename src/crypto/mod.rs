//! Cryptographic operations
//!
//! - PGP identity lifecycle and peer import
//! - Message encryption and decryption between identities

pub mod message_crypto;
pub mod pgp;

pub use message_crypto::{DecryptedMessage, EncryptedMessage, MessageCipher, SignerStatus};
pub use self::pgp::{Identity, Recipient, TrustedPeer};
