//! Algorithm preferences advertised in every user-id self-signature

use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use pgp::types::CompressionAlgorithm;
use smallvec::SmallVec;

/// Strongest first. Peers encrypting to us pick the first entry they support.
pub const PREFERRED_SYMMETRIC: [SymmetricKeyAlgorithm; 5] = [
    SymmetricKeyAlgorithm::AES256,
    SymmetricKeyAlgorithm::AES192,
    SymmetricKeyAlgorithm::AES128,
    SymmetricKeyAlgorithm::CAST5,
    SymmetricKeyAlgorithm::TripleDES,
];

/// SHA-256 leads for interoperability, ahead of the longer digests.
pub const PREFERRED_HASH: [HashAlgorithm; 5] = [
    HashAlgorithm::Sha256,
    HashAlgorithm::Sha1,
    HashAlgorithm::Sha384,
    HashAlgorithm::Sha512,
    HashAlgorithm::Sha224,
];

pub const PREFERRED_COMPRESSION: [CompressionAlgorithm; 2] =
    [CompressionAlgorithm::ZLIB, CompressionAlgorithm::ZIP];

/// Cipher used when a recipient advertises nothing we share.
pub const FALLBACK_CIPHER: SymmetricKeyAlgorithm = SymmetricKeyAlgorithm::AES128;

/// Hash used for message signatures.
pub const MESSAGE_HASH: HashAlgorithm = HashAlgorithm::Sha256;

/// Ordered preference lists embedded in self-signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferencePolicy {
    pub symmetric: &'static [SymmetricKeyAlgorithm],
    pub hash: &'static [HashAlgorithm],
    pub compression: &'static [CompressionAlgorithm],
}

impl Default for PreferencePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl PreferencePolicy {
    pub fn standard() -> Self {
        Self {
            symmetric: &PREFERRED_SYMMETRIC,
            hash: &PREFERRED_HASH,
            compression: &PREFERRED_COMPRESSION,
        }
    }

    pub fn symmetric_list(&self) -> SmallVec<[SymmetricKeyAlgorithm; 8]> {
        SmallVec::from_slice(self.symmetric)
    }

    pub fn hash_list(&self) -> SmallVec<[HashAlgorithm; 8]> {
        SmallVec::from_slice(self.hash)
    }

    pub fn compression_list(&self) -> SmallVec<[CompressionAlgorithm; 8]> {
        SmallVec::from_slice(self.compression)
    }

    /// Pick the message cipher for a recipient.
    ///
    /// Walks the recipient's own ordering and takes the first cipher this
    /// policy also lists.
    pub fn negotiate_cipher(
        &self,
        recipient_prefs: &[SymmetricKeyAlgorithm],
    ) -> SymmetricKeyAlgorithm {
        recipient_prefs
            .iter()
            .copied()
            .find(|alg| self.symmetric.contains(alg))
            .unwrap_or(FALLBACK_CIPHER)
    }

    /// Whether a self-signature's advertised lists match this policy exactly.
    pub fn is_advertised_by(
        &self,
        symmetric: &[SymmetricKeyAlgorithm],
        hash: &[HashAlgorithm],
        compression: &[CompressionAlgorithm],
    ) -> bool {
        symmetric == self.symmetric && hash == self.hash && compression == self.compression
    }
}
