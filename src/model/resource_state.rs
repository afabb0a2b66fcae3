//! Serializable snapshots of resources.
//!
//! Only public material is carried: a restored state can be inspected and
//! its keys imported, but it never holds a secret key.

use crate::crypto::pgp::TrustedPeer;
use crate::error::{GpgError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceState {
    Gpg(GpgState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgState {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    pub email: String,
    pub fingerprint: String,
    /// ASCII-armored transferable public key.
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_public_key: Option<String>,
}

impl ResourceState {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GpgError::Config(format!("Failed to serialize state: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GpgError::Config(format!("Invalid resource state: {}", e)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResourceState::Gpg(_) => "gpg",
        }
    }
}

impl GpgState {
    /// The stored public key as an importable peer.
    pub fn peer(&self) -> Result<TrustedPeer> {
        TrustedPeer::from_bytes(self.public_key.as_bytes())
    }

    pub fn admin_peer(&self) -> Result<Option<TrustedPeer>> {
        self.admin_public_key
            .as_deref()
            .map(|armored| TrustedPeer::from_bytes(armored.as_bytes()))
            .transpose()
    }
}
