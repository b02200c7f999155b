//! Key Encapsulation Mechanisms.
//!
//! A KEM engine performs the math. [`KemProtocol`] wraps an
//! engine and handles everything around it: constraint checks,
//! single use, secret length validation and the lifecycle of
//! the raw shared secret.

use alloc::{boxed::Box, string::String, vec::Vec};
use core::{error, fmt};

use zeroize::Zeroizing;

use crate::{
    constraints::ConstraintViolation,
    csprng::RandomGenerator,
    secret::{SecretBytes, SecretError},
};

mod protocol;
mod x25519;

pub use protocol::*;
pub use x25519::*;

/// A Key Encapsulation Mechanism engine.
///
/// Implementations only perform the cryptography. Use
/// [`KemProtocol`] to run them.
pub trait KemEngine {
    /// The public key used to generate encapsulations.
    type PublicKey;
    /// The private key used to extract secrets.
    type PrivateKey;
    /// An error returned by the engine.
    type Error: error::Error + Send + Sync + 'static;

    /// The name of the algorithm, e.g. `"FrodoKEM-976-AES"`.
    fn algorithm(&self) -> &str;

    /// The security strength in bits provided by `key`.
    fn security_bits(&self, key: &Self::PublicKey) -> u32;

    /// The size in bytes of every shared secret.
    fn secret_len(&self) -> usize;

    /// Creates a fresh shared secret and its encapsulation for
    /// `key`.
    fn generate_encapsulated(
        &self,
        key: &Self::PublicKey,
        rng: &dyn RandomGenerator,
    ) -> Result<RawEncapsulation, Self::Error>;

    /// Recovers the shared secret from `encapsulation`.
    fn extract_secret(
        &self,
        key: &Self::PrivateKey,
        encapsulation: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, Self::Error>;
}

/// The output of [`KemEngine::generate_encapsulated`].
pub struct RawEncapsulation {
    /// The shared secret.
    pub secret: Zeroizing<Vec<u8>>,
    /// The encapsulation to send to the private key holder.
    pub encapsulation: Vec<u8>,
}

impl fmt::Debug for RawEncapsulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEncapsulation")
            .field("secret", &"<redacted>")
            .field("encapsulation", &self.encapsulation)
            .finish()
    }
}

/// A shared secret paired with its encapsulation.
///
/// The secret is wiped by [`destroy`][Self::destroy], by
/// [`with_secret`][Self::with_secret], or on drop, whichever
/// comes first. The encapsulation is public and outlives the
/// secret.
pub struct EncapsulatedSecret {
    secret: SecretBytes,
    encapsulation: Vec<u8>,
    key_algorithm: String,
}

impl EncapsulatedSecret {
    pub(crate) fn new(
        secret: Zeroizing<Vec<u8>>,
        encapsulation: Vec<u8>,
        key_algorithm: String,
    ) -> Self {
        Self {
            secret: SecretBytes::new(secret),
            encapsulation,
            key_algorithm,
        }
    }

    /// Returns the shared secret.
    pub fn secret(&self) -> Result<&[u8], SecretError> {
        self.secret.expose()
    }

    /// Returns the encapsulation.
    pub fn encapsulation(&self) -> &[u8] {
        &self.encapsulation
    }

    /// Returns the name of the algorithm the secret is intended
    /// to key, e.g. `"AES"`.
    pub fn key_algorithm(&self) -> &str {
        &self.key_algorithm
    }

    /// Wipes the shared secret.
    pub fn destroy(&mut self) {
        self.secret.destroy()
    }

    /// Reports whether the shared secret has been wiped.
    pub fn is_destroyed(&self) -> bool {
        self.secret.is_destroyed()
    }

    /// Calls `f` with the shared secret, then wipes it.
    ///
    /// The secret is wiped even if `f` panics.
    pub fn with_secret<F, R>(mut self, f: F) -> Result<R, SecretError>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let result = f(self.secret.expose()?);
        self.secret.destroy();
        Ok(result)
    }
}

impl fmt::Debug for EncapsulatedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncapsulatedSecret")
            .field("secret", &self.secret)
            .field("encapsulation", &self.encapsulation)
            .field("key_algorithm", &self.key_algorithm)
            .finish()
    }
}

/// An error from [`KemProtocol`].
#[derive(Debug, thiserror::Error)]
pub enum KemError {
    /// The protocol was configured more than once.
    #[error("protocol is already configured")]
    InvalidConfiguration,
    /// The operation is not allowed in the protocol's current
    /// state.
    #[error("invalid protocol state: {0}")]
    InvalidState(ProtocolState),
    /// The engine does not meet the security constraints.
    #[error(transparent)]
    PolicyViolation(#[from] ConstraintViolation),
    /// The engine failed.
    #[error("engine failure: {0}")]
    EngineFailure(#[source] Box<dyn error::Error + Send + Sync>),
}

impl KemError {
    pub(crate) fn engine<E>(err: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self::EngineFailure(Box::new(err))
    }
}

/// The engine returned a shared secret of the wrong size.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("engine produced a {actual} byte secret, expected {expected}")]
pub struct SecretLengthMismatch {
    /// The size the engine advertises.
    pub expected: usize,
    /// The size it produced.
    pub actual: usize,
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString, vec};

    use super::*;

    fn secret() -> EncapsulatedSecret {
        EncapsulatedSecret::new(
            Zeroizing::new(vec![1, 2, 3]),
            vec![9, 9],
            String::from("AES"),
        )
    }

    #[test]
    fn test_destroy() {
        let mut s = secret();
        assert_eq!(s.secret(), Ok(&[1u8, 2, 3][..]));
        s.destroy();
        assert!(s.is_destroyed());
        assert_eq!(s.secret(), Err(SecretError::Destroyed));
        // The encapsulation is not secret.
        assert_eq!(s.encapsulation(), [9, 9]);
        assert_eq!(s.key_algorithm(), "AES");
        s.destroy();
    }

    #[test]
    fn test_with_secret() {
        let sum = secret()
            .with_secret(|b| b.iter().map(|&x| u32::from(x)).sum::<u32>())
            .unwrap();
        assert_eq!(sum, 6);

        let mut s = secret();
        s.destroy();
        assert_eq!(s.with_secret(|_| ()), Err(SecretError::Destroyed));
    }

    #[test]
    fn test_debug_redacts() {
        let s = secret();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("<redacted>"), "{dbg}");
        assert!(!dbg.contains("[1, 2, 3]"), "{dbg}");
    }

    #[test]
    fn test_engine_failure_source() {
        use core::error::Error as _;

        let err = KemError::engine(SecretLengthMismatch {
            expected: 32,
            actual: 31,
        });
        assert_eq!(
            err.to_string(),
            "engine failure: engine produced a 31 byte secret, expected 32"
        );
        assert!(err.source().is_some());
    }
}
