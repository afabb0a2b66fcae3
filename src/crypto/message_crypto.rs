//! Message cryptography operations
//!
//! Messages are signed by the sender's primary key, encrypted to the
//! recipient's encryption key and carried as standard base64 text.

use crate::crypto::pgp::identity::{Identity, Recipient};
use crate::crypto::pgp::preferences::{PreferencePolicy, MESSAGE_HASH};
use crate::crypto::pgp::signing::{encryption_subkey, primary_can_encrypt, signing_subkeys};
use crate::error::{GpgError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pgp::composed::{Message, MessageBuilder};
use pgp::packet::OpsVersionSpecific;
use rand::thread_rng;
use std::fmt;

/// Signed and encrypted message in a text-safe encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage(String);

impl EncryptedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Binary OpenPGP message behind the text encoding.
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        decode_text(&self.0)
    }
}

impl fmt::Display for EncryptedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who signed a decrypted message, as far as the caller's keys can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerStatus {
    /// The embedded signature verifies under one of the candidate keys.
    Verified {
        user_id: String,
        fingerprint: String,
    },
    /// None of the candidate keys verifies the signature.
    ///
    /// `issuer` is the fingerprint or key id the signature claims, and
    /// `None` for an unsigned message.
    Unverified { issuer: Option<String> },
}

impl SignerStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, SignerStatus::Verified { .. })
    }
}

/// Result of message decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub plaintext: String,
    pub signer: SignerStatus,
}

/// Message cryptography handler
pub struct MessageCipher;

impl MessageCipher {
    /// Sign `plaintext` with `sender` and encrypt it for `recipient`.
    pub fn encrypt(
        sender: &Identity,
        recipient: &dyn Recipient,
        plaintext: &str,
    ) -> Result<EncryptedMessage> {
        let binary = Self::encrypt_binary(sender, recipient, plaintext)?;
        Ok(EncryptedMessage(STANDARD.encode(binary)))
    }

    /// Same as [`MessageCipher::encrypt`] without the text encoding.
    pub fn encrypt_binary(
        sender: &Identity,
        recipient: &dyn Recipient,
        plaintext: &str,
    ) -> Result<Vec<u8>> {
        let recipient_key = recipient.recipient_key();
        let cipher = PreferencePolicy::standard().negotiate_cipher(&recipient.advertised_ciphers());
        log::info!(
            "Encrypting {} bytes for {}",
            plaintext.len(),
            recipient.primary_user_id().unwrap_or_else(|| recipient.fingerprint())
        );
        log::debug!("Negotiated cipher {:?}, signing hash {:?}", cipher, MESSAGE_HASH);

        let mut rng = thread_rng();
        let mut builder = MessageBuilder::from_bytes("", plaintext.as_bytes().to_vec())
            .seipd_v1(&mut rng, cipher);
        builder.sign(
            &sender.secret_key().primary_key,
            sender.passphrase().to_pgp_password(),
            MESSAGE_HASH,
        );

        match encryption_subkey(recipient_key) {
            Some(subkey) => builder.encrypt_to_key(&mut rng, &subkey.key),
            None if primary_can_encrypt(recipient_key) => {
                builder.encrypt_to_key(&mut rng, &recipient_key.primary_key)
            }
            None => {
                return Err(GpgError::Encryption(format!(
                    "recipient {} has no encryption-capable key",
                    recipient.fingerprint()
                )))
            }
        }
        .map_err(|e| GpgError::Encryption(format!("Failed to encrypt session key: {}", e)))?;

        let binary = builder
            .to_vec(&mut rng)
            .map_err(|e| GpgError::Encryption(format!("Failed to write message: {}", e)))?;

        log::info!("Encrypted message: {} bytes", binary.len());
        Ok(binary)
    }

    /// Decode and decrypt a message addressed to `identity`.
    ///
    /// The sender's signature is checked against `candidates`; a signature
    /// no candidate verifies is reported as [`SignerStatus::Unverified`]
    /// rather than rejected.
    pub fn decrypt(
        identity: &Identity,
        encoded: &str,
        candidates: &[&dyn Recipient],
    ) -> Result<DecryptedMessage> {
        let binary = decode_text(encoded)?;
        Self::decrypt_binary(identity, &binary, candidates)
    }

    pub fn decrypt_binary(
        identity: &Identity,
        binary: &[u8],
        candidates: &[&dyn Recipient],
    ) -> Result<DecryptedMessage> {
        log::info!("Decrypting message of {} bytes", binary.len());

        let message = Message::from_bytes(binary)
            .map_err(|e| GpgError::Decryption(format!("Failed to parse message: {}", e)))?;
        let mut message = message
            .decrypt(&identity.passphrase().to_pgp_password(), identity.secret_key())
            .map_err(|e| GpgError::Decryption(format!("Failed to decrypt message: {}", e)))?;
        if message.is_compressed() {
            message = message
                .decompress()
                .map_err(|e| GpgError::Decryption(format!("Failed to decompress: {}", e)))?;
        }

        let data = message
            .as_data_vec()
            .map_err(|e| GpgError::Decryption(format!("Failed to read message body: {}", e)))?;
        let plaintext = String::from_utf8(data)
            .map_err(|e| GpgError::Decryption(format!("Plaintext is not UTF-8: {}", e)))?;

        let signer = candidates
            .iter()
            .find(|candidate| {
                let key = candidate.recipient_key();
                message.verify(&key.primary_key).is_ok()
                    || signing_subkeys(key).any(|subkey| message.verify(&subkey.key).is_ok())
            })
            .map(|candidate| SignerStatus::Verified {
                user_id: candidate.primary_user_id().unwrap_or_default(),
                fingerprint: candidate.fingerprint(),
            })
            .unwrap_or_else(|| SignerStatus::Unverified {
                issuer: claimed_issuer(&message),
            });

        match &signer {
            SignerStatus::Verified { user_id, .. } => {
                log::info!("Decrypted message signed by {}", user_id)
            }
            SignerStatus::Unverified { issuer: Some(issuer) } => {
                log::warn!("Decrypted message signed by unknown key {}", issuer)
            }
            SignerStatus::Unverified { issuer: None } => {
                log::warn!("Decrypted message carries no signature")
            }
        }

        Ok(DecryptedMessage { plaintext, signer })
    }
}

/// Decode base64 text, tolerating line breaks inside the encoding.
fn decode_text(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();
    Ok(STANDARD.decode(compact.trim())?)
}

/// Issuer the message signature claims, whether or not it verifies.
fn claimed_issuer(message: &Message<'_>) -> Option<String> {
    let signature = match message {
        Message::Signed { reader, .. } => Some(reader.signature()),
        Message::SignedOnePass { reader, .. } => reader.signature(),
        _ => None,
    };
    if let Some(sig) = signature {
        if let Some(fingerprint) = sig.issuer_fingerprint().first() {
            return Some(fingerprint.to_string());
        }
        if let Some(key_id) = sig.issuer().first() {
            return Some(key_id.to_string());
        }
    }

    match message {
        Message::SignedOnePass {
            one_pass_signature, ..
        } => match one_pass_signature.version_specific() {
            OpsVersionSpecific::V3 { key_id } => Some(key_id.to_string()),
            OpsVersionSpecific::V6 { fingerprint, .. } => Some(hex::encode(fingerprint)),
            _ => None,
        },
        _ => None,
    }
}
