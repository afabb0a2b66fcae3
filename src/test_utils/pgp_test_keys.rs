//! PGP identity generation utilities for testing
//!
//! Provides helpers for generating identities and peers without touching disk.

use crate::config::IdentityConfig;
use crate::crypto::pgp::{Identity, TrustedPeer};

/// Generate a self-signed Ed25519 identity.
pub fn test_identity(name: &str, email: &str) -> Identity {
    Identity::create(name, "", email, &IdentityConfig::default())
        .expect("test identity generation")
}

/// Round-trip an identity's public key through the importer.
pub fn test_peer(identity: &Identity) -> TrustedPeer {
    let bytes = identity
        .public_key_bytes()
        .expect("public key serialization");
    TrustedPeer::from_bytes(&bytes).expect("public key import")
}

/// Generate an identity and the peer view other parties hold of it.
pub fn test_pair(name: &str, email: &str) -> (Identity, TrustedPeer) {
    let identity = test_identity(name, email);
    let peer = test_peer(&identity);
    (identity, peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::pgp::Recipient;

    #[test]
    fn test_generate_test_identity() {
        let identity = test_identity("alice", "alice@example.com");
        assert!(!identity.fingerprint().is_empty());
        assert_eq!(identity.name(), "alice");
    }

    #[test]
    fn test_peer_matches_identity() {
        let (identity, peer) = test_pair("bob", "bob@example.com");
        assert_eq!(identity.fingerprint(), peer.fingerprint());
        assert_eq!(identity.primary_user_id(), peer.primary_user_id());
    }
}
