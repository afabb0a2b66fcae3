//! The embedding API: one identity, an optional admin peer, and the files
//! exchanged with the admin.

use crate::config::IdentityConfig;
use crate::core::storage::write_atomic;
use crate::crypto::message_crypto::{DecryptedMessage, EncryptedMessage, MessageCipher};
use crate::crypto::pgp::{Identity, Recipient, TrustedPeer};
use crate::error::{GpgError, Result};
use crate::model::resource_state::{GpgState, ResourceState};
use std::path::{Path, PathBuf};

/// File name of the exported public key.
pub const PUBLIC_KEY_EXPORT: &str = "PubGPG1.gpg";
/// File name of the message written for the admin.
pub const ADMIN_MESSAGE_FILE: &str = "MessageForAdmin.gpg";

/// A self-signed identity holding at most one trusted admin key.
#[derive(Debug)]
pub struct GpgResource {
    identity: Identity,
    admin: Option<TrustedPeer>,
}

impl GpgResource {
    /// Create and self-sign an identity, then import the admin key if given.
    ///
    /// Any failure is returned; a resource is never produced with a
    /// half-built identity or a silently missing admin key.
    pub fn new(
        name: &str,
        email: &str,
        admin_key_path: Option<&Path>,
        config: &IdentityConfig,
    ) -> Result<Self> {
        log::info!("Initializing PGP resource for {} <{}>", name, email);
        let identity = Identity::create(name, &config.comment, email, config)?;
        let admin = admin_key_path.map(TrustedPeer::from_file).transpose()?;
        Ok(Self { identity, admin })
    }

    pub fn from_parts(identity: Identity, admin: Option<TrustedPeer>) -> Self {
        Self { identity, admin }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn admin(&self) -> Option<&TrustedPeer> {
        self.admin.as_ref()
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn comment(&self) -> &str {
        self.identity.comment()
    }

    pub fn email(&self) -> &str {
        self.identity.email()
    }

    /// Write the full transferable public key to `prefix/PubGPG1.gpg`.
    pub fn export_public_key(&self, prefix: impl AsRef<Path>) -> Result<PathBuf> {
        let path = prefix.as_ref().join(PUBLIC_KEY_EXPORT);
        log::info!("Exporting public key to {}", path.display());
        let bytes = self.identity.public_key_bytes()?;
        write_atomic(&path, &bytes, 0o644)?;
        Ok(path)
    }

    pub fn public_key_armored(&self) -> Result<String> {
        self.identity.public_key_armored()
    }

    /// Sign and encrypt `plaintext` for `recipient`, base64 encoded.
    pub fn encrypt_to(&self, recipient: &dyn Recipient, plaintext: &str) -> Result<String> {
        MessageCipher::encrypt(&self.identity, recipient, plaintext)
            .map(EncryptedMessage::into_string)
    }

    /// Encrypt `plaintext` for the admin into `prefix/MessageForAdmin.gpg`.
    pub fn write_to_admin(&self, plaintext: &str, prefix: impl AsRef<Path>) -> Result<PathBuf> {
        let admin = self.admin.as_ref().ok_or(GpgError::MissingPeer("admin"))?;
        log::info!("Writing message for admin");

        let encrypted = MessageCipher::encrypt(&self.identity, admin, plaintext)?;
        let path = prefix.as_ref().join(ADMIN_MESSAGE_FILE);
        write_atomic(&path, encrypted.as_str().as_bytes(), 0o644)?;

        log::info!("Wrote admin message to {}", path.display());
        Ok(path)
    }

    /// Decrypt a message addressed to this identity.
    ///
    /// The signer is checked against this identity and the admin key.
    pub fn decrypt(&self, encoded: &str) -> Result<DecryptedMessage> {
        let mut candidates: Vec<&dyn Recipient> = vec![&self.identity];
        if let Some(admin) = &self.admin {
            candidates.push(admin);
        }
        MessageCipher::decrypt(&self.identity, encoded, &candidates)
    }

    /// Serializable snapshot of the public parts of this resource.
    pub fn state(&self) -> Result<ResourceState> {
        Ok(ResourceState::Gpg(GpgState {
            name: self.name().to_string(),
            comment: self.comment().to_string(),
            email: self.email().to_string(),
            fingerprint: self.identity.fingerprint(),
            public_key: self.identity.public_key_armored()?,
            admin_public_key: self
                .admin
                .as_ref()
                .map(TrustedPeer::public_key_armored)
                .transpose()?,
        }))
    }
}
