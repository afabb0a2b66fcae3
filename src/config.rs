//! Identity configuration
//!
//! Loaded from a JSON file by the binary; library callers usually start
//! from `IdentityConfig::default()`.

use crate::crypto::pgp::SecurePassphrase;
use crate::error::{GpgError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Public key algorithm family used for new identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    /// Ed25519 primary key with a Curve25519 encryption subkey.
    #[default]
    Ed25519,
    /// RSA primary key with an RSA encryption subkey of the same size.
    Rsa,
}

fn default_rsa_bits() -> u32 {
    2048
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default)]
    pub key_algorithm: KeyAlgorithm,
    #[serde(default = "default_rsa_bits")]
    pub rsa_bits: u32,
    /// Comment placed in the user id of new identities.
    #[serde(default)]
    pub comment: String,
    /// Protects the secret key material when set.
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_algorithm: KeyAlgorithm::default(),
            rsa_bits: default_rsa_bits(),
            comment: String::new(),
            passphrase: None,
        }
    }
}

impl IdentityConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| GpgError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| GpgError::Config(format!("malformed configuration: {}", e)))?;
        if config.key_algorithm == KeyAlgorithm::Rsa && config.rsa_bits < 2048 {
            return Err(GpgError::Config(format!(
                "rsa_bits must be at least 2048, got {}",
                config.rsa_bits
            )));
        }
        Ok(config)
    }

    pub fn passphrase(&self) -> SecurePassphrase {
        match &self.passphrase {
            Some(p) => SecurePassphrase::new(p.clone()),
            None => SecurePassphrase::empty(),
        }
    }
}
