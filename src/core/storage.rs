//! On-disk persistence for a single identity
//!
//! Key files are written atomically next to HMAC-SHA256 side files keyed
//! by the identity passphrase.

use crate::crypto::pgp::{Identity, SecurePassphrase};
use crate::error::{GpgError, Result};
use hmac::{Hmac, Mac};
use pgp::composed::{Deserializable, SignedSecretKey};
use sha2::Sha256;
use std::io::Write;
use std::{
    fs,
    path::{Path, PathBuf},
};
use subtle::ConstantTimeEq;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_KEY_FILE: &str = "secret.asc";
pub const PUBLIC_KEY_FILE: &str = "public.asc";

/// Write `contents` to `path` through a temp file in the same directory.
///
/// The target either keeps its previous contents or receives the complete
/// new contents; the temp file is removed on every error path.
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| GpgError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| GpgError::io(path, e))?;

    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| GpgError::io(path, e))?;
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path).map_err(|e| GpgError::io(path, e.error))?;
    Ok(())
}

/// Stores one identity per directory.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    dir: PathBuf,
}

impl IdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn secret_path(&self) -> PathBuf {
        self.dir.join(SECRET_KEY_FILE)
    }

    fn public_path(&self) -> PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    /// Check if an identity has been saved here.
    pub fn exists(&self) -> bool {
        self.secret_path().exists() && self.public_path().exists()
    }

    /// Save the identity with HMAC integrity protection.
    ///
    /// Saves files with secure permissions:
    /// - Directory: 0o700 (owner rwx only)
    /// - Secret key: 0o600 (owner rw only)
    /// - Public key: 0o644 (world readable)
    pub fn save(&self, identity: &Identity) -> Result<()> {
        log::info!(
            "Saving PGP identity {} to {}",
            identity.user_id(),
            self.dir.display()
        );
        fs::create_dir_all(&self.dir).map_err(|e| GpgError::io(&self.dir, e))?;

        #[cfg(unix)]
        fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| GpgError::io(&self.dir, e))?;

        let passphrase = identity.passphrase();
        let secret_armored = identity.secret_key_armored()?;
        let public_armored = identity.public_key_armored()?;

        for (path, content, mode) in [
            (self.secret_path(), secret_armored, 0o600),
            (self.public_path(), public_armored, 0o644),
        ] {
            let hmac = Self::compute_file_hmac(&content, passphrase)?;
            write_atomic(&path, content.as_bytes(), mode)?;
            write_atomic(&path.with_extension("hmac"), hmac.as_bytes(), mode)?;
        }

        log::info!("Saved PGP identity to {}", self.dir.display());
        Ok(())
    }

    /// Load the stored identity, verifying file integrity and bindings.
    ///
    /// Returns None if nothing is stored, or an error if integrity check fails.
    pub fn load(&self, passphrase: SecurePassphrase) -> Result<Option<Identity>> {
        if !self.exists() {
            return Ok(None);
        }
        log::info!("Loading PGP identity from {}", self.dir.display());

        let secret_path = self.secret_path();
        let secret_armored =
            fs::read_to_string(&secret_path).map_err(|e| GpgError::io(&secret_path, e))?;
        Self::verify_file_hmac(&secret_path, &secret_armored, &passphrase)?;

        let public_path = self.public_path();
        let public_armored =
            fs::read_to_string(&public_path).map_err(|e| GpgError::io(&public_path, e))?;
        Self::verify_file_hmac(&public_path, &public_armored, &passphrase)?;

        let (secret_key, _) = SignedSecretKey::from_string(&secret_armored)
            .map_err(|e| GpgError::Import(format!("Failed to parse secret key: {}", e)))?;
        let identity = Identity::from_signed_secret_key(secret_key, passphrase)?;

        let stored_public = identity.public_key_armored()?;
        if stored_public.trim() != public_armored.trim() {
            return Err(GpgError::Integrity(public_path));
        }

        log::info!("Loaded PGP identity {}", identity.user_id());
        Ok(Some(identity))
    }

    /// Compute HMAC-SHA256 for file integrity verification.
    fn compute_file_hmac(content: &str, passphrase: &SecurePassphrase) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(passphrase.as_str().as_bytes())
            .map_err(|e| GpgError::Config(format!("Failed to create HMAC: {}", e)))?;
        mac.update(content.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn verify_file_hmac(path: &Path, content: &str, passphrase: &SecurePassphrase) -> Result<()> {
        let hmac_path = path.with_extension("hmac");
        if !hmac_path.exists() {
            log::warn!(
                "No HMAC file for {} - integrity verification skipped",
                path.display()
            );
            return Ok(());
        }

        let stored = fs::read_to_string(&hmac_path).map_err(|e| GpgError::io(&hmac_path, e))?;
        let computed = Self::compute_file_hmac(content, passphrase)?;
        if !bool::from(stored.trim().as_bytes().ct_eq(computed.as_bytes())) {
            return Err(GpgError::Integrity(path.to_path_buf()));
        }
        Ok(())
    }
}
