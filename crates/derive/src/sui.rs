use bip39::{Language, Mnemonic};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use seedscan_common::types::{DerivedAddress, SeedPhrase};

use crate::path::DerivationPath;
use crate::slip10::ExtendedKey;
use crate::{AddressDeriver, DerivationError};

type Blake2b256 = Blake2b<U32>;

/// SLIP-0044 coin type registered for Sui.
pub const SUI_COIN_TYPE: u32 = 784;

/// Account 0, external chain, first address.
pub const SUI_DERIVATION_PATH: &str = "m/44'/784'/0'/0'/0'";

/// Signature-scheme flag prepended to the public key before hashing.
const ED25519_FLAG: u8 = 0x00;

/// Derives Sui ed25519 addresses from English BIP-39 mnemonics.
#[derive(Debug, Clone)]
pub struct SuiDeriver {
    path: DerivationPath,
}

impl SuiDeriver {
    pub fn new() -> Self {
        Self {
            path: DerivationPath::bip44_hardened(SUI_COIN_TYPE, 0, 0, 0),
        }
    }

    /// Use a different (fully hardened) path, e.g. another account index.
    pub fn with_path(path: DerivationPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// 64-byte BIP-39 seed with an empty passphrase.
    pub fn seed_from_phrase(phrase: &SeedPhrase) -> Result<[u8; 64], DerivationError> {
        let normalized = phrase
            .as_str()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| DerivationError::InvalidMnemonic(e.to_string()))?;
        Ok(mnemonic.to_seed_normalized(""))
    }
}

impl Default for SuiDeriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressDeriver for SuiDeriver {
    fn derive(&self, phrase: &SeedPhrase) -> Result<DerivedAddress, DerivationError> {
        let seed = Self::seed_from_phrase(phrase)?;
        let key = ExtendedKey::master(&seed)?.derive_path(&self.path)?;
        Ok(address_from_public_key(&key.public_key()))
    }

    fn name(&self) -> &'static str {
        "Sui ed25519"
    }
}

/// `0x` + hex(BLAKE2b-256(flag || public key)).
pub fn address_from_public_key(public_key: &[u8; 32]) -> DerivedAddress {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    let digest = hasher.finalize();
    DerivedAddress::new(format!("0x{}", hex::encode(digest)))
}
