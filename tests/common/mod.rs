//! Common test setup and utilities for integration tests

#![allow(dead_code)]

use anyhow::Result;
use gpg_identity::{GpgResource, Identity, IdentityConfig, TrustedPeer};
use pgp::composed::{Deserializable, SignedSecretKey};
use std::path::{Path, PathBuf};

/// gpg-generated admin key: certify-only primary, separate signing and
/// encryption subkeys.
pub const FIXTURE_ADMIN_PUBLIC: &str = "admin_signing_subkey.gpg";
pub const FIXTURE_ADMIN_SECRET: &str = "admin_signing_subkey.sec.asc";
pub const FIXTURE_ADMIN_USER_ID: &str = "Fixture Admin <admin@fixture.example>";
pub const FIXTURE_ADMIN_FINGERPRINT: &str = "214ffe020a9355d3210474b7e3f854b60f06c0a2";
pub const FIXTURE_ADMIN_SIGNING_SUBKEY: &str = "f25cd6e00c9a8e857a16fc3739e6f38d1e5cfa5f";

/// Initialize test logging (safe to call from every test)
pub fn init_test_logging() {
    let _ = env_logger::Builder::new()
        .filter_module("gpg_identity", log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Test context owning a scratch directory
pub struct TestContext {
    pub dir: tempfile::TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        init_test_logging();
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Create an identity and write its binary public key to `file`.
    pub fn identity_with_key_file(
        &self,
        name: &str,
        email: &str,
        file: &str,
    ) -> Result<(Identity, PathBuf)> {
        let identity = Identity::create(name, "", email, &IdentityConfig::default())?;
        let path = self.dir.path().join(file);
        std::fs::write(&path, identity.public_key_bytes()?)?;
        Ok((identity, path))
    }

    pub fn resource(&self, name: &str, email: &str, admin: Option<&Path>) -> Result<GpgResource> {
        Ok(GpgResource::new(
            name,
            email,
            admin,
            &IdentityConfig::default(),
        )?)
    }
}

/// The view other parties hold of `identity`.
pub fn peer_of(identity: &Identity) -> Result<TrustedPeer> {
    Ok(TrustedPeer::from_bytes(&identity.public_key_bytes()?)?)
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Unprotected secret half of the fixture admin key.
pub fn fixture_admin_secret() -> Result<SignedSecretKey> {
    let armored = std::fs::read_to_string(fixture_path(FIXTURE_ADMIN_SECRET))?;
    let (secret, _headers) = SignedSecretKey::from_string(&armored)?;
    Ok(secret)
}
