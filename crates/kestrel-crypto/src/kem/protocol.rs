use alloc::{string::String, vec::Vec};
use core::{fmt, mem};

use tracing::{debug, instrument};
use zeroize::Zeroizing;

use super::{EncapsulatedSecret, KemEngine, KemError, SecretLengthMismatch};
use crate::{
    constraints::{ConstraintRegistry, Purpose, SecurityProperty, ServiceParams},
    csprng::SharedRandom,
};

/// Where a [`KemProtocol`] is in its lifecycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProtocolState {
    /// Not yet configured.
    Uninitialized,
    /// Configured to generate a new shared secret.
    ConfiguredGenerate,
    /// Configured to extract a shared secret.
    ConfiguredExtract,
    /// [`KemProtocol::run`] succeeded.
    Completed,
    /// [`KemProtocol::run`] failed.
    Failed,
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::ConfiguredGenerate => "configured to generate",
            Self::ConfiguredExtract => "configured to extract",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

enum State<E: KemEngine> {
    Uninitialized,
    Configured(Intent<E>),
    Completed,
    Failed,
}

enum Intent<E: KemEngine> {
    Generate {
        public_key: E::PublicKey,
        key_algorithm: String,
        rng: SharedRandom,
    },
    Extract {
        private_key: E::PrivateKey,
        encapsulation: Vec<u8>,
        key_algorithm: String,
    },
}

impl<E: KemEngine> State<E> {
    fn public(&self) -> ProtocolState {
        match self {
            Self::Uninitialized => ProtocolState::Uninitialized,
            Self::Configured(Intent::Generate { .. }) => ProtocolState::ConfiguredGenerate,
            Self::Configured(Intent::Extract { .. }) => ProtocolState::ConfiguredExtract,
            Self::Completed => ProtocolState::Completed,
            Self::Failed => ProtocolState::Failed,
        }
    }
}

/// Runs a [`KemEngine`] exactly once, either generating a new
/// shared secret for a public key or extracting one with a
/// private key.
///
/// ```text
/// Uninitialized -> Configured(Generate | Extract) -> Completed | Failed
/// ```
///
/// ```
/// use std::sync::Arc;
///
/// use kestrel_crypto::{
///     csprng::OsRandom,
///     kem::{ClassicalKem, KemProtocol, generate_keypair},
/// };
///
/// let (sk, pk) = generate_keypair(&OsRandom);
///
/// let mut alice = KemProtocol::new(ClassicalKem);
/// alice.configure_generate(pk, "AES", Arc::new(OsRandom))?;
/// let sent = alice.run()?;
///
/// let mut bob = KemProtocol::new(ClassicalKem);
/// bob.configure_extract(sk, sent.encapsulation(), "AES")?;
/// let received = bob.run()?;
///
/// assert_eq!(sent.secret()?, received.secret()?);
/// # Ok::<(), kestrel_crypto::Error>(())
/// ```
pub struct KemProtocol<'r, E: KemEngine> {
    engine: E,
    registry: Option<&'r ConstraintRegistry>,
    state: State<E>,
}

impl<E: KemEngine> KemProtocol<'static, E> {
    /// Creates a protocol that does not check security
    /// constraints.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            registry: None,
            state: State::Uninitialized,
        }
    }
}

impl<'r, E: KemEngine> KemProtocol<'r, E> {
    /// Creates a protocol that checks generated secrets against
    /// `registry`.
    pub fn with_registry(engine: E, registry: &'r ConstraintRegistry) -> Self {
        Self {
            engine,
            registry: Some(registry),
            state: State::Uninitialized,
        }
    }

    /// Returns the protocol's state.
    pub fn state(&self) -> ProtocolState {
        self.state.public()
    }

    /// Returns the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Configures the protocol to generate a shared secret for
    /// `public_key`.
    ///
    /// `key_algorithm` names the algorithm the secret will key.
    pub fn configure_generate(
        &mut self,
        public_key: E::PublicKey,
        key_algorithm: impl Into<String>,
        rng: SharedRandom,
    ) -> Result<(), KemError> {
        self.configure(Intent::Generate {
            public_key,
            key_algorithm: key_algorithm.into(),
            rng,
        })
    }

    /// Configures the protocol to extract the shared secret
    /// from `encapsulation`.
    ///
    /// `key_algorithm` names the algorithm the secret will key.
    pub fn configure_extract(
        &mut self,
        private_key: E::PrivateKey,
        encapsulation: impl Into<Vec<u8>>,
        key_algorithm: impl Into<String>,
    ) -> Result<(), KemError> {
        self.configure(Intent::Extract {
            private_key,
            encapsulation: encapsulation.into(),
            key_algorithm: key_algorithm.into(),
        })
    }

    fn configure(&mut self, intent: Intent<E>) -> Result<(), KemError> {
        match self.state {
            State::Uninitialized => {
                self.state = State::Configured(intent);
                debug!(state = %self.state(), "configured KEM protocol");
                Ok(())
            }
            State::Configured(_) => Err(KemError::InvalidConfiguration),
            State::Completed | State::Failed => Err(KemError::InvalidState(self.state())),
        }
    }

    /// Runs the protocol.
    ///
    /// The protocol can only be run once. Running it again, or
    /// before it was configured, fails with
    /// [`KemError::InvalidState`] and changes nothing.
    #[instrument(skip_all, fields(algorithm = self.engine.algorithm()))]
    pub fn run(&mut self) -> Result<EncapsulatedSecret, KemError> {
        let intent = match mem::replace(&mut self.state, State::Failed) {
            State::Configured(intent) => intent,
            state => {
                self.state = state;
                return Err(KemError::InvalidState(self.state()));
            }
        };

        let result = self.execute(intent);
        self.state = match result {
            Ok(_) => State::Completed,
            Err(_) => State::Failed,
        };
        debug!(state = %self.state(), "KEM protocol finished");
        result
    }

    fn execute(&self, intent: Intent<E>) -> Result<EncapsulatedSecret, KemError> {
        match intent {
            Intent::Generate {
                public_key,
                key_algorithm,
                rng,
            } => {
                if let Some(registry) = self.registry {
                    let property = SecurityProperty::with_purpose(
                        self.engine.algorithm(),
                        self.engine.security_bits(&public_key),
                        ServiceParams::None,
                        Purpose::KeyAgreement,
                    );
                    registry.evaluate(&property)?;
                }
                let raw = self
                    .engine
                    .generate_encapsulated(&public_key, &*rng)
                    .map_err(KemError::engine)?;
                let secret = self.check_len(raw.secret)?;
                Ok(EncapsulatedSecret::new(
                    secret,
                    raw.encapsulation,
                    key_algorithm,
                ))
            }
            Intent::Extract {
                private_key,
                encapsulation,
                key_algorithm,
            } => {
                let secret = self
                    .engine
                    .extract_secret(&private_key, &encapsulation)
                    .map_err(KemError::engine)?;
                let secret = self.check_len(secret)?;
                Ok(EncapsulatedSecret::new(secret, encapsulation, key_algorithm))
            }
        }
    }

    /// Rejects secrets that are not [`KemEngine::secret_len`]
    /// bytes. Dropping a rejected secret wipes it.
    fn check_len(&self, secret: Zeroizing<Vec<u8>>) -> Result<Zeroizing<Vec<u8>>, KemError> {
        let expected = self.engine.secret_len();
        if secret.len() != expected {
            return Err(KemError::engine(SecretLengthMismatch {
                expected,
                actual: secret.len(),
            }));
        }
        Ok(secret)
    }
}

impl<E: KemEngine + fmt::Debug> fmt::Debug for KemProtocol<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KemProtocol")
            .field("engine", &self.engine)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
