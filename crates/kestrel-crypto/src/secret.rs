//! Destroyable secret bytes.

use alloc::vec::Vec;
use core::fmt;

use subtle::{Choice, ConstantTimeEq};
use zeroize::{ZeroizeOnDrop, Zeroizing};

/// Returned when reading a secret that has been destroyed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SecretError {
    /// The secret has already been destroyed.
    #[error("secret has been destroyed")]
    Destroyed,
}

/// Variable-length secret key material.
///
/// The bytes are wiped when [`destroy`][Self::destroy] is
/// called or when the value is dropped, whichever happens
/// first. Once destroyed every read fails with
/// [`SecretError::Destroyed`] rather than returning zeros.
pub struct SecretBytes(Option<Zeroizing<Vec<u8>>>);

impl SecretBytes {
    /// Takes ownership of `secret`.
    pub fn new(secret: Zeroizing<Vec<u8>>) -> Self {
        Self(Some(secret))
    }

    /// Returns the secret bytes.
    pub fn expose(&self) -> Result<&[u8], SecretError> {
        self.0.as_deref().map(Vec::as_slice).ok_or(SecretError::Destroyed)
    }

    /// Returns the length of the secret in bytes.
    pub fn len(&self) -> Result<usize, SecretError> {
        self.expose().map(<[u8]>::len)
    }

    /// Reports whether the secret is empty.
    pub fn is_empty(&self) -> Result<bool, SecretError> {
        self.expose().map(<[u8]>::is_empty)
    }

    /// Wipes the secret.
    ///
    /// Calling this more than once is harmless.
    pub fn destroy(&mut self) {
        // Dropping the `Zeroizing` wipes the buffer.
        drop(self.0.take());
    }

    /// Reports whether the secret has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.0.is_none()
    }
}

impl ZeroizeOnDrop for SecretBytes {}

impl ConstantTimeEq for SecretBytes {
    /// Destroyed secrets are never equal to anything.
    fn ct_eq(&self, other: &Self) -> Choice {
        match (self.expose(), other.expose()) {
            (Ok(lhs), Ok(rhs)) => lhs.ct_eq(rhs),
            _ => Choice::from(0),
        }
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_destroyed() {
            f.write_str("SecretBytes(<destroyed>)")
        } else {
            f.write_str("SecretBytes(<redacted>)")
        }
    }
}
