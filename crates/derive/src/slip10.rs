//! SLIP-0010 key derivation for the ed25519 curve.
//!
//! ed25519 only defines hardened children; a normal index anywhere in the
//! path is rejected.

use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::DerivationError;
use crate::path::{ChildIndex, DerivationPath};

type HmacSha512 = Hmac<Sha512>;

const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// A private key together with its chain code.
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Master node from a BIP-39 seed.
    pub fn master(seed: &[u8]) -> Result<Self, DerivationError> {
        let digest = hmac_sha512(ED25519_CURVE_KEY, &[seed])?;
        Ok(Self::from_digest(&digest))
    }

    /// Derive one hardened child.
    pub fn derive_child(&self, index: ChildIndex) -> Result<Self, DerivationError> {
        if !index.is_hardened() {
            return Err(DerivationError::KeyDerivation(format!(
                "ed25519 supports hardened derivation only, got index {index}"
            )));
        }

        let digest = hmac_sha512(
            &self.chain_code,
            &[&[0u8], &self.private_key, &index.to_u32().to_be_bytes()],
        )?;
        Ok(Self::from_digest(&digest))
    }

    /// Walk every level of `path` starting from this node.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, DerivationError> {
        path.indices()
            .iter()
            .try_fold(self.clone(), |key, index| key.derive_child(*index))
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Raw 32-byte ed25519 public key.
    pub fn public_key(&self) -> [u8; 32] {
        SigningKey::from_bytes(&self.private_key)
            .verifying_key()
            .to_bytes()
    }

    fn from_digest(digest: &[u8; 64]) -> Self {
        let mut private_key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        private_key.copy_from_slice(&digest[..32]);
        chain_code.copy_from_slice(&digest[32..]);
        Self {
            private_key,
            chain_code,
        }
    }
}

impl std::fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private_key", &"<redacted>")
            .field("chain_code", &hex::encode(self.chain_code))
            .finish()
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64], DerivationError> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|e| DerivationError::KeyDerivation(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}
