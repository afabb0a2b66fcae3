//! Importing a counterpart's public key as a trusted peer

use crate::crypto::pgp::identity::Recipient;
use crate::crypto::pgp::signing::has_encryption_key;
use crate::error::{GpgError, Result};
use pgp::armor::Dearmor;
use pgp::composed::{Deserializable, SignedPublicKey};
use pgp::packet::{PacketHeader, PacketParser};
use pgp::types::PacketLength;
use std::io::Read;
use std::{fs, path::Path};

const ARMOR_HEADER: &[u8] = b"-----BEGIN PGP";

/// A public-key-only entity whose key was supplied by the caller.
///
/// Its identity bindings are taken as asserted by its own self-signatures;
/// trust comes from where the key material was obtained.
#[derive(Debug, Clone)]
pub struct TrustedPeer {
    public_key: SignedPublicKey,
}

impl TrustedPeer {
    /// Parse a single public key in binary packet encoding or ASCII armor.
    ///
    /// The input must consist of complete packets only, and the key must
    /// be able to receive encrypted messages.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let trimmed = trim_leading_whitespace(bytes);
        if trimmed.is_empty() {
            return Err(GpgError::Import("public key source is empty".to_string()));
        }

        let binary = if trimmed.starts_with(ARMOR_HEADER) {
            let mut binary = Vec::new();
            Dearmor::new(trimmed)
                .read_to_end(&mut binary)
                .map_err(|e| GpgError::Import(format!("Failed to dearmor key: {}", e)))?;
            binary
        } else {
            trimmed.to_vec()
        };
        check_packet_framing(&binary)?;

        let public_key = SignedPublicKey::from_bytes(&binary[..])
            .map_err(|e| GpgError::Import(format!("Failed to parse public key: {}", e)))?;

        if public_key.details.users.is_empty() {
            return Err(GpgError::Import(
                "public key carries no user ID".to_string(),
            ));
        }
        // Structural completeness only; signatures are not re-verified.
        if public_key
            .details
            .users
            .iter()
            .any(|user| user.signatures.is_empty())
        {
            return Err(GpgError::Import(
                "public key has a user ID without self-signature".to_string(),
            ));
        }
        if public_key
            .public_subkeys
            .iter()
            .any(|subkey| subkey.signatures.is_empty())
        {
            return Err(GpgError::Import(
                "public key has a subkey without binding signature".to_string(),
            ));
        }
        if !has_encryption_key(&public_key) {
            return Err(GpgError::Import(
                "public key has no encryption-capable key".to_string(),
            ));
        }

        let peer = Self { public_key };
        log::info!(
            "Imported public key {} for {}",
            peer.fingerprint(),
            peer.primary_user_id().unwrap_or_default()
        );
        Ok(peer)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Reading public key file: {}", path.display());
        let bytes = fs::read(path)
            .map_err(|e| GpgError::Import(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn public_key(&self) -> &SignedPublicKey {
        &self.public_key
    }

    pub fn public_key_armored(&self) -> Result<String> {
        self.public_key
            .to_armored_string(Default::default())
            .map_err(|e| GpgError::Export(format!("Failed to armor public key: {}", e)))
    }
}

impl Recipient for TrustedPeer {
    fn recipient_key(&self) -> &SignedPublicKey {
        &self.public_key
    }
}

/// Every packet header must be complete and every body fully present.
fn check_packet_framing(binary: &[u8]) -> Result<()> {
    let mut rest = binary;
    let mut count = 0usize;
    while !rest.is_empty() {
        let header = PacketHeader::try_from_reader(&mut rest).map_err(|e| {
            GpgError::Import(format!("Truncated packet header after {} packet(s): {}", count, e))
        })?;
        let len = match header.packet_length() {
            PacketLength::Fixed(len) => len as usize,
            other => {
                return Err(GpgError::Import(format!(
                    "Unsupported packet length {:?} in public key",
                    other
                )))
            }
        };
        if rest.len() < len {
            return Err(GpgError::Import(format!(
                "Truncated {:?} packet: {} of {} bytes present",
                header.tag(),
                rest.len(),
                len
            )));
        }
        rest = &rest[len..];
        count += 1;
    }

    if let Some(err) = PacketParser::new(binary).find_map(|packet| packet.err()) {
        return Err(GpgError::Import(format!("Malformed packet: {}", err)));
    }
    log::debug!("Public key consists of {} complete packet(s)", count);
    Ok(())
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_identity;

    #[test]
    fn test_import_binary_key() {
        let admin = test_identity("Admin", "admin@example.com");
        let bytes = admin.public_key_bytes().unwrap();

        let peer = TrustedPeer::from_bytes(&bytes).unwrap();
        assert_eq!(peer.fingerprint(), admin.fingerprint());
        assert_eq!(
            peer.primary_user_id().as_deref(),
            Some("Admin <admin@example.com>")
        );
    }

    #[test]
    fn test_import_armored_key() {
        let admin = test_identity("Admin", "admin@example.com");
        let armored = admin.public_key_armored().unwrap();

        let peer = TrustedPeer::from_bytes(armored.as_bytes()).unwrap();
        assert_eq!(peer.fingerprint(), admin.fingerprint());
    }

    #[test]
    fn test_import_empty_fails() {
        assert!(matches!(
            TrustedPeer::from_bytes(b""),
            Err(GpgError::Import(_))
        ));
        assert!(matches!(
            TrustedPeer::from_bytes(b"  \n"),
            Err(GpgError::Import(_))
        ));
    }

    #[test]
    fn test_import_every_truncation_fails() {
        let admin = test_identity("Admin", "admin@example.com");
        let bytes = admin.public_key_bytes().unwrap();

        for len in 0..bytes.len() {
            assert!(
                matches!(
                    TrustedPeer::from_bytes(&bytes[..len]),
                    Err(GpgError::Import(_))
                ),
                "prefix of {} of {} bytes was accepted",
                len,
                bytes.len()
            );
        }
        assert!(TrustedPeer::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_import_trailing_garbage_fails() {
        let admin = test_identity("Admin", "admin@example.com");
        let mut bytes = admin.public_key_bytes().unwrap();
        bytes.push(0xc2);

        assert!(matches!(
            TrustedPeer::from_bytes(&bytes),
            Err(GpgError::Import(_))
        ));
    }

    #[test]
    fn test_import_key_without_subkey_fails() {
        let admin = test_identity("Admin", "admin@example.com");
        let mut public_key = admin.public_key().clone();
        public_key.public_subkeys.clear();
        let bytes = pgp::ser::Serialize::to_bytes(&public_key).unwrap();

        let err = TrustedPeer::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, GpgError::Import(msg) if msg.contains("encryption-capable")));
    }

    #[test]
    fn test_import_garbage_fails() {
        assert!(matches!(
            TrustedPeer::from_bytes(b"definitely not a key"),
            Err(GpgError::Import(_))
        ));
        assert!(matches!(
            TrustedPeer::from_bytes(b"-----BEGIN PGP PUBLIC KEY BLOCK-----\n\nnope\n"),
            Err(GpgError::Import(_))
        ));
    }

    #[test]
    fn test_import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TrustedPeer::from_file(dir.path().join("admin.gpg")),
            Err(GpgError::Import(_))
        ));
    }
}
