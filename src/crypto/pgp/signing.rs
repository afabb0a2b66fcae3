//! Self-signatures binding identities and subkeys to the primary key

use crate::crypto::pgp::identity::Identity;
use crate::crypto::pgp::keypair::IdentityDraft;
use crate::crypto::pgp::preferences::PreferencePolicy;
use crate::error::{GpgError, Result};
use pgp::composed::{SignedPublicKey, SignedPublicSubKey};
use pgp::crypto::public_key::PublicKeyAlgorithm;
use pgp::packet::{KeyFlags, Signature, SubpacketData};
use pgp::types::KeyDetails;
use rand::thread_rng;

impl IdentityDraft {
    /// Self-sign the draft, producing an immutable [`Identity`].
    ///
    /// Every user-id binding gets a self-signature carrying the preference
    /// policy, every subkey a binding signature from the primary key. The
    /// result is verified before it is returned; on any failure the draft
    /// is consumed and no identity exists.
    pub fn self_sign(self) -> Result<Identity> {
        let IdentityDraft {
            user_id,
            secret_key,
            passphrase,
            policy,
        } = self;
        log::info!("Self-signing PGP identity: {}", user_id);

        let signed_secret_key = secret_key
            .sign(&mut thread_rng(), &passphrase.to_pgp_password())
            .map_err(|e| GpgError::Signing(format!("Failed to sign secret key: {}", e)))?;
        let signed_public_key = SignedPublicKey::from(signed_secret_key.clone());

        verify_self_signatures(&signed_public_key, &policy)?;

        log::info!("Successfully self-signed PGP identity: {}", user_id);
        Ok(Identity::from_parts(
            user_id,
            signed_secret_key,
            signed_public_key,
            passphrase,
        ))
    }
}

/// Verify that every binding on `public_key` is a valid self-signature and
/// that each user-id self-signature advertises `policy`.
pub fn verify_self_signatures(
    public_key: &SignedPublicKey,
    policy: &PreferencePolicy,
) -> Result<()> {
    verify_bindings(public_key)?;

    for user in &public_key.details.users {
        for sig in &user.signatures {
            if !policy.is_advertised_by(
                sig.preferred_symmetric_algs(),
                sig.preferred_hash_algs(),
                sig.preferred_compression_algs(),
            ) {
                return Err(GpgError::Signing(format!(
                    "Self-signature for {} does not advertise the preference policy",
                    String::from_utf8_lossy(user.id.id())
                )));
            }
        }
    }
    Ok(())
}

/// Cryptographically check all user-id and subkey bindings.
pub fn verify_bindings(public_key: &SignedPublicKey) -> Result<()> {
    if public_key.details.users.is_empty() {
        return Err(GpgError::Signing("PGP key has no user IDs".to_string()));
    }
    if let Some(user) = public_key
        .details
        .users
        .iter()
        .find(|user| user.signatures.is_empty())
    {
        return Err(GpgError::Signing(format!(
            "User ID {} carries no self-signature",
            String::from_utf8_lossy(user.id.id())
        )));
    }
    if public_key
        .public_subkeys
        .iter()
        .any(|subkey| subkey.signatures.is_empty())
    {
        return Err(GpgError::Signing(
            "Subkey carries no binding signature".to_string(),
        ));
    }

    public_key
        .verify()
        .map_err(|e| GpgError::Signing(format!("Self-signature verification failed: {}", e)))?;

    log::debug!(
        "Verified {} user ID(s) and {} subkey(s)",
        public_key.details.users.len(),
        public_key.public_subkeys.len()
    );
    Ok(())
}

/// Key flags from the hashed area of a binding signature, if it has any.
fn binding_key_flags(sig: &Signature) -> Option<&KeyFlags> {
    sig.config()?
        .hashed_subpackets
        .iter()
        .find_map(|subpkt| match &subpkt.data {
            SubpacketData::KeyFlags(flags) => Some(flags),
            _ => None,
        })
}

fn grants_encryption(flags: &KeyFlags) -> bool {
    flags.encrypt_comms() || flags.encrypt_storage()
}

/// First subkey whose binding grants the encryption capability.
pub fn encryption_subkey(public_key: &SignedPublicKey) -> Option<&SignedPublicSubKey> {
    public_key.public_subkeys.iter().find(|subkey| {
        subkey
            .signatures
            .iter()
            .any(|sig| binding_key_flags(sig).map_or(false, grants_encryption))
    })
}

/// Whether messages may be encrypted to an RSA primary key directly.
///
/// Holds when no user-id self-signature restricts the primary key to
/// flags without an encryption capability.
pub fn primary_can_encrypt(public_key: &SignedPublicKey) -> bool {
    matches!(
        public_key.primary_key.algorithm(),
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt
    ) && public_key
        .details
        .users
        .iter()
        .flat_map(|user| user.signatures.iter())
        .all(|sig| binding_key_flags(sig).map_or(true, grants_encryption))
}

/// Whether the key can receive encrypted messages at all.
pub fn has_encryption_key(public_key: &SignedPublicKey) -> bool {
    encryption_subkey(public_key).is_some() || primary_can_encrypt(public_key)
}

/// Subkeys whose binding grants the signing capability.
pub fn signing_subkeys(
    public_key: &SignedPublicKey,
) -> impl Iterator<Item = &SignedPublicSubKey> {
    public_key.public_subkeys.iter().filter(|subkey| {
        subkey
            .signatures
            .iter()
            .any(|sig| binding_key_flags(sig).map_or(false, KeyFlags::sign))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentityConfig;
    use crate::crypto::pgp::keypair::UserIdSpec;
    use crate::test_utils::test_identity;

    #[test]
    fn test_self_sign_produces_verifiable_bindings() {
        let identity = test_identity("Alice", "alice@example.com");
        let public = identity.public_key();

        assert_eq!(public.details.users.len(), 1);
        assert_eq!(
            String::from_utf8_lossy(public.details.users[0].id.id()),
            "Alice <alice@example.com>"
        );
        assert!(verify_bindings(public).is_ok());
        assert!(encryption_subkey(public).is_some());
        assert!(has_encryption_key(public));
        assert!(!primary_can_encrypt(public));
        assert_eq!(signing_subkeys(public).count(), 0);
    }

    #[test]
    fn test_self_signature_carries_policy_in_order() {
        let identity = test_identity("Bob", "bob@example.com");
        let policy = PreferencePolicy::standard();

        for user in &identity.public_key().details.users {
            assert!(!user.signatures.is_empty());
            for sig in &user.signatures {
                assert_eq!(sig.preferred_symmetric_algs(), policy.symmetric);
                assert_eq!(sig.preferred_hash_algs(), policy.hash);
                assert_eq!(sig.preferred_compression_algs(), policy.compression);
            }
        }
        assert!(verify_self_signatures(identity.public_key(), &policy).is_ok());
    }

    #[test]
    fn test_every_subkey_is_bound() {
        let identity = test_identity("Carol", "carol@example.com");
        let public = identity.public_key();

        assert!(!public.public_subkeys.is_empty());
        for subkey in &public.public_subkeys {
            assert!(!subkey.signatures.is_empty());
        }
    }

    #[test]
    fn test_comment_is_part_of_the_binding() {
        let user = UserIdSpec::new("Dave", "ops", "dave@example.com").unwrap();
        let identity = IdentityDraft::generate(user, &IdentityConfig::default())
            .and_then(IdentityDraft::self_sign)
            .unwrap();

        assert_eq!(
            String::from_utf8_lossy(identity.public_key().details.users[0].id.id()),
            "Dave (ops) <dave@example.com>"
        );
    }

    #[test]
    fn test_passphrase_protected_identity_signs() {
        let config = IdentityConfig {
            passphrase: Some("correct horse battery staple".to_string()),
            ..IdentityConfig::default()
        };
        let user = UserIdSpec::new("Erin", "", "erin@example.com").unwrap();
        let identity = IdentityDraft::generate(user, &config)
            .and_then(IdentityDraft::self_sign)
            .unwrap();

        assert!(verify_bindings(identity.public_key()).is_ok());
    }
}
