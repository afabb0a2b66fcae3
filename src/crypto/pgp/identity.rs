//! The signed local identity and the recipient abstraction

use crate::config::IdentityConfig;
use crate::crypto::pgp::keypair::{IdentityDraft, SecurePassphrase, UserIdSpec};
use crate::crypto::pgp::preferences::PreferencePolicy;
use crate::crypto::pgp::signing::verify_self_signatures;
use crate::error::{GpgError, Result};
use pgp::composed::{SignedPublicKey, SignedSecretKey};
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::ser::Serialize as PgpSerialize;
use pgp::types::KeyDetails;

/// Anything holding a public key we can encrypt to.
pub trait Recipient {
    fn recipient_key(&self) -> &SignedPublicKey;

    /// First user id on the key, as asserted by its own self-signature.
    fn primary_user_id(&self) -> Option<String> {
        self.recipient_key()
            .details
            .users
            .first()
            .map(|user| String::from_utf8_lossy(user.id.id()).to_string())
    }

    fn fingerprint(&self) -> String {
        self.recipient_key().fingerprint().to_string()
    }

    /// Ciphers advertised by the first user-id self-signature, in order.
    fn advertised_ciphers(&self) -> Vec<SymmetricKeyAlgorithm> {
        self.recipient_key()
            .details
            .users
            .iter()
            .flat_map(|user| user.signatures.iter())
            .map(|sig| sig.preferred_symmetric_algs().to_vec())
            .find(|algs| !algs.is_empty())
            .unwrap_or_default()
    }
}

/// A complete, self-signed local identity.
///
/// Immutable once built: there is no API to alter its bindings, so
/// it can be shared freely between threads.
pub struct Identity {
    user_id: UserIdSpec,
    secret_key: SignedSecretKey,
    public_key: SignedPublicKey,
    passphrase: SecurePassphrase,
}

impl Identity {
    /// Generate and self-sign a new identity in one step.
    pub fn create(
        name: &str,
        comment: &str,
        email: &str,
        config: &IdentityConfig,
    ) -> Result<Self> {
        let user_id = UserIdSpec::new(name, comment, email)?;
        IdentityDraft::generate(user_id, config)?.self_sign()
    }

    pub(crate) fn from_parts(
        user_id: UserIdSpec,
        secret_key: SignedSecretKey,
        public_key: SignedPublicKey,
        passphrase: SecurePassphrase,
    ) -> Self {
        Self {
            user_id,
            secret_key,
            public_key,
            passphrase,
        }
    }

    /// Rebuild an identity from a stored, already signed secret key.
    ///
    /// The bindings are re-verified so a tampered key never becomes usable.
    pub fn from_signed_secret_key(
        secret_key: SignedSecretKey,
        passphrase: SecurePassphrase,
    ) -> Result<Self> {
        let public_key = SignedPublicKey::from(secret_key.clone());
        verify_self_signatures(&public_key, &PreferencePolicy::standard())?;

        let raw_user_id = public_key
            .details
            .users
            .first()
            .map(|user| String::from_utf8_lossy(user.id.id()).to_string())
            .ok_or_else(|| GpgError::Signing("PGP key has no user IDs".to_string()))?;
        let user_id = UserIdSpec::parse(&raw_user_id)?;

        Ok(Self::from_parts(user_id, secret_key, public_key, passphrase))
    }

    pub fn user_id(&self) -> &UserIdSpec {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.user_id.name
    }

    pub fn comment(&self) -> &str {
        &self.user_id.comment
    }

    pub fn email(&self) -> &str {
        &self.user_id.email
    }

    pub fn secret_key(&self) -> &SignedSecretKey {
        &self.secret_key
    }

    pub fn public_key(&self) -> &SignedPublicKey {
        &self.public_key
    }

    pub(crate) fn passphrase(&self) -> &SecurePassphrase {
        &self.passphrase
    }

    /// Full transferable public key in binary packet encoding.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        PgpSerialize::to_bytes(&self.public_key)
            .map_err(|e| GpgError::Export(format!("Failed to serialize public key: {}", e)))
    }

    pub fn public_key_armored(&self) -> Result<String> {
        self.public_key
            .to_armored_string(Default::default())
            .map_err(|e| GpgError::Export(format!("Failed to armor public key: {}", e)))
    }

    pub(crate) fn secret_key_armored(&self) -> Result<String> {
        self.secret_key
            .to_armored_string(Default::default())
            .map_err(|e| GpgError::Export(format!("Failed to armor secret key: {}", e)))
    }
}

impl Recipient for Identity {
    fn recipient_key(&self) -> &SignedPublicKey {
        &self.public_key
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id.to_string())
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

impl UserIdSpec {
    /// Parse `Name (Comment) <email>`; comment and email are optional.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut rest = raw.trim();

        let mut email = String::new();
        if let Some(stripped) = rest.strip_suffix('>') {
            let open = stripped
                .rfind('<')
                .ok_or_else(|| GpgError::InvalidUserId(raw.to_string()))?;
            email = stripped[open + 1..].to_string();
            rest = stripped[..open].trim_end();
        }

        let mut comment = String::new();
        if let Some(stripped) = rest.strip_suffix(')') {
            let open = stripped
                .rfind('(')
                .ok_or_else(|| GpgError::InvalidUserId(raw.to_string()))?;
            comment = stripped[open + 1..].to_string();
            rest = stripped[..open].trim_end();
        }

        UserIdSpec::new(rest, comment, email)
    }
}
