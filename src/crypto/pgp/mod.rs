//! PGP cryptographic operations.
//!
//! This module handles:
//! - Identity key generation (Ed25519 and RSA)
//! - Self-signatures advertising the algorithm preference policy
//! - Import of trusted peer public keys

pub mod identity;
pub mod import;
pub mod keypair;
pub mod preferences;
pub mod signing;

pub use identity::{Identity, Recipient};
pub use import::TrustedPeer;
pub use keypair::{IdentityDraft, SecurePassphrase, UserIdSpec};
pub use preferences::PreferencePolicy;
pub use signing::{verify_bindings, verify_self_signatures};
