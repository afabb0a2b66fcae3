//! Identity key generation using rPGP 0.16

use crate::config::{IdentityConfig, KeyAlgorithm};
use crate::crypto::pgp::preferences::PreferencePolicy;
use crate::error::{GpgError, Result};
use pgp::composed::{KeyType, SecretKey, SecretKeyParamsBuilder, SubkeyParamsBuilder};
use pgp::crypto::ecc_curve::ECCCurve;
use pgp::types::Password;
use rand::thread_rng;
use std::fmt;
use zeroize::ZeroizeOnDrop;

/// Secure passphrase for PGP operations.
///
/// Implements ZeroizeOnDrop to securely clear passphrase from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecurePassphrase {
    passphrase: String,
}

impl SecurePassphrase {
    pub fn new(passphrase: String) -> Self {
        Self { passphrase }
    }

    /// No passphrase; secret key material stays unencrypted.
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// Generate a strong random passphrase (32 alphanumeric characters).
    pub fn generate_strong() -> Self {
        use rand::distributions::{Alphanumeric, DistString};
        let passphrase = Alphanumeric.sample_string(&mut thread_rng(), 32);
        Self::new(passphrase)
    }

    pub fn as_str(&self) -> &str {
        &self.passphrase
    }

    pub fn is_empty(&self) -> bool {
        self.passphrase.is_empty()
    }

    /// Convert to PGP Password type for use with rPGP.
    pub fn to_pgp_password(&self) -> Password {
        if self.is_empty() {
            Password::empty()
        } else {
            Password::from(self.passphrase.as_str())
        }
    }
}

impl fmt::Debug for SecurePassphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurePassphrase(..)")
    }
}

/// The (name, comment, email) triple bound to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdSpec {
    pub name: String,
    pub comment: String,
    pub email: String,
}

impl UserIdSpec {
    pub fn new(
        name: impl Into<String>,
        comment: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        let spec = Self {
            name: name.into(),
            comment: comment.into(),
            email: email.into(),
        };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        const RESERVED: [char; 5] = ['(', ')', '<', '>', '\0'];
        for (field, value) in [
            ("name", &self.name),
            ("comment", &self.comment),
            ("email", &self.email),
        ] {
            if value.contains(&RESERVED[..]) {
                return Err(GpgError::InvalidUserId(format!(
                    "{} must not contain any of ( ) < > or NUL: {:?}",
                    field, value
                )));
            }
        }
        if self.name.trim().is_empty() && self.email.trim().is_empty() {
            return Err(GpgError::InvalidUserId(
                "name and email are both empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for UserIdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.comment.is_empty() {
            write!(f, " ({})", self.comment)?;
        }
        if !self.email.is_empty() {
            write!(f, " <{}>", self.email)?;
        }
        Ok(())
    }
}

/// A freshly generated keypair whose bindings are not yet self-signed.
///
/// A draft offers no cryptographic operations. The only way forward is
/// [`IdentityDraft::self_sign`], which yields a usable `Identity`.
pub struct IdentityDraft {
    pub(crate) user_id: UserIdSpec,
    pub(crate) secret_key: SecretKey,
    pub(crate) passphrase: SecurePassphrase,
    pub(crate) policy: PreferencePolicy,
}

impl IdentityDraft {
    /// Generate the primary key and an encryption subkey for `user_id`.
    ///
    /// The primary key certifies and signs; the subkey encrypts. The
    /// preference policy is attached to the user-id binding and embedded
    /// once the draft is self-signed.
    pub fn generate(user_id: UserIdSpec, config: &IdentityConfig) -> Result<Self> {
        let policy = PreferencePolicy::standard();
        let passphrase = config.passphrase();
        log::info!(
            "Generating {:?} PGP keypair for user: {}",
            config.key_algorithm,
            user_id
        );

        let (primary_type, encryption_type) = match config.key_algorithm {
            KeyAlgorithm::Ed25519 => (
                KeyType::Ed25519Legacy,
                KeyType::ECDH(ECCCurve::Curve25519),
            ),
            KeyAlgorithm::Rsa => (
                KeyType::Rsa(config.rsa_bits),
                KeyType::Rsa(config.rsa_bits),
            ),
        };
        let protection = (!passphrase.is_empty()).then(|| passphrase.as_str().to_string());

        let mut encryptkey = SubkeyParamsBuilder::default();
        encryptkey
            .key_type(encryption_type)
            .can_sign(false)
            .can_encrypt(true)
            .can_authenticate(false)
            .passphrase(protection.clone());

        let mut key_params = SecretKeyParamsBuilder::default();
        key_params
            .key_type(primary_type)
            .can_certify(true)
            .can_sign(true)
            .can_encrypt(false)
            .primary_user_id(user_id.to_string())
            .preferred_symmetric_algorithms(policy.symmetric_list())
            .preferred_hash_algorithms(policy.hash_list())
            .preferred_compression_algorithms(policy.compression_list())
            .passphrase(protection)
            .subkeys(vec![encryptkey.build().map_err(|e| {
                GpgError::KeyGeneration(format!("Failed to build encryption subkey: {}", e))
            })?]);

        let secret_key_params = key_params.build().map_err(|e| {
            GpgError::KeyGeneration(format!("Failed to build secret key params: {}", e))
        })?;
        let secret_key = secret_key_params.generate(thread_rng()).map_err(|e| {
            GpgError::KeyGeneration(format!("Failed to generate secret key: {}", e))
        })?;

        log::info!("Generated unsigned PGP keypair for user: {}", user_id);
        Ok(Self {
            user_id,
            secret_key,
            passphrase,
            policy,
        })
    }

    pub fn user_id(&self) -> &UserIdSpec {
        &self.user_id
    }

    pub fn policy(&self) -> &PreferencePolicy {
        &self.policy
    }
}
