use std::fmt;
use std::str::FromStr;

use crate::DerivationError;

/// Bit set on hardened child indices.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One level of a hierarchical derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildIndex {
    Normal(u32),
    Hardened(u32),
}

impl ChildIndex {
    pub fn is_hardened(&self) -> bool {
        matches!(self, ChildIndex::Hardened(_))
    }

    /// Serialized 32-bit index, with the hardened bit applied.
    pub fn to_u32(&self) -> u32 {
        match self {
            ChildIndex::Normal(i) => *i,
            ChildIndex::Hardened(i) => i | HARDENED_OFFSET,
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildIndex::Normal(i) => write!(f, "{i}"),
            ChildIndex::Hardened(i) => write!(f, "{i}'"),
        }
    }
}

/// A BIP-32 style path such as `m/44'/784'/0'/0'/0'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    /// BIP-44 layout: purpose / coin / account / change / address index, all hardened.
    pub fn bip44_hardened(coin_type: u32, account: u32, change: u32, index: u32) -> Self {
        Self(vec![
            ChildIndex::Hardened(44),
            ChildIndex::Hardened(coin_type),
            ChildIndex::Hardened(account),
            ChildIndex::Hardened(change),
            ChildIndex::Hardened(index),
        ])
    }

    pub fn indices(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(DerivationError::InvalidPath(format!(
                "path must start with 'm': {s}"
            )));
        }

        let indices = parts
            .map(|part| {
                let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                    Some(digits) => (digits, true),
                    None => (part, false),
                };
                let value: u32 = digits.parse().map_err(|_| {
                    DerivationError::InvalidPath(format!("bad path component '{part}'"))
                })?;
                if value >= HARDENED_OFFSET {
                    return Err(DerivationError::InvalidPath(format!(
                        "path component '{part}' out of range"
                    )));
                }
                Ok(if hardened {
                    ChildIndex::Hardened(value)
                } else {
                    ChildIndex::Normal(value)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(indices))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}
