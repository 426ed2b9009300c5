use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of a voter's auth-provider key, stored on the registry
/// book row so a ballot can be tied back to the login that produced it
/// without storing the key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityAnchor(pub [u8; 32]);

impl IdentityAnchor {
    pub fn from_provider_key(provider_key: &str) -> Self {
        let digest = Sha256::digest(provider_key.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
