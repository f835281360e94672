//! Credential hashing boundary.
//!
//! # Responsibility
//! - Turn plaintext passwords into salted bcrypt hashes with a fixed cost.
//! - Verify plaintext candidates against stored hashes.
//!
//! # Invariants
//! - Plaintext and hashes never appear in `Debug`/`Display` output or logs.
//! - Cost is validated once at construction; hashing never picks its own cost.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Work factor used when no explicit cost is configured.
pub const DEFAULT_PASSWORD_COST: u32 = 10;
/// Smallest cost accepted by bcrypt.
pub const MIN_PASSWORD_COST: u32 = 4;
/// Largest cost accepted by bcrypt.
pub const MAX_PASSWORD_COST: u32 = 31;

/// Errors produced by the credential hasher.
#[derive(Debug)]
pub enum CredentialError {
    /// Configured cost lies outside `MIN_PASSWORD_COST..=MAX_PASSWORD_COST`.
    InvalidCost(u32),
    /// The bcrypt backend rejected the input or the stored hash.
    Backend(bcrypt::BcryptError),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCost(cost) => write!(
                f,
                "password cost {cost} outside supported range {MIN_PASSWORD_COST}..={MAX_PASSWORD_COST}"
            ),
            Self::Backend(err) => write!(f, "credential backend failure: {err}"),
        }
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCost(_) => None,
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<bcrypt::BcryptError> for CredentialError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Backend(value)
    }
}

/// One-way password hasher with a fixed work factor.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// Creates a hasher using `cost` as bcrypt work factor.
    ///
    /// # Errors
    /// - `CredentialError::InvalidCost` when `cost` is not accepted by bcrypt.
    pub fn new(cost: u32) -> Result<Self, CredentialError> {
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&cost) {
            return Err(CredentialError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    /// Returns the configured work factor.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes `plaintext` with a fresh random salt.
    ///
    /// Hashing the same plaintext twice yields two different strings that both
    /// verify against it.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Returns whether `plaintext` matches `hash`.
    ///
    /// # Errors
    /// - `CredentialError::Backend` when `hash` is not a bcrypt hash.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        Ok(bcrypt::verify(plaintext, hash)?)
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_PASSWORD_COST,
        }
    }
}

impl Debug for CredentialHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("cost", &self.cost)
            .finish()
    }
}
