//! Mnemonic-to-address derivation.
//!
//! A phrase goes through BIP-39 seed generation, SLIP-0010 ed25519 key
//! derivation along a hardened path, and finally chain-specific address
//! encoding. Only Sui is implemented; other chains would add another
//! [`AddressDeriver`].

pub mod path;
pub mod slip10;
pub mod sui;


use seedscan_common::types::{DerivedAddress, SeedPhrase};
use thiserror::Error;

pub use path::{ChildIndex, DerivationPath};
pub use sui::{SUI_COIN_TYPE, SUI_DERIVATION_PATH, SuiDeriver};

/// Reasons a phrase could not be turned into an address.
///
/// Messages never include the phrase itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Trait implemented by every chain-specific address deriver.
pub trait AddressDeriver: Send + Sync {
    /// Deterministically derive one address from one phrase.
    fn derive(&self, phrase: &SeedPhrase) -> Result<DerivedAddress, DerivationError>;

    /// Human-readable name for this deriver (e.g., "Sui ed25519").
    fn name(&self) -> &'static str;
}
