use crate::{
    constraints::{ConstraintViolation, PatternError},
    kem::KemError,
    prng::WindowError,
    secret::SecretError,
};

/// Encompasses the different errors directly returned by this
/// crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An operation was rejected by a security constraint.
    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
    /// An algorithm pattern could not be parsed.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// A KEM protocol failure.
    #[error(transparent)]
    Kem(#[from] KemError),
    /// A windowed generator could not be constructed.
    #[error(transparent)]
    Window(#[from] WindowError),
    /// Secret material was used after being destroyed.
    #[error(transparent)]
    Secret(#[from] SecretError),
}
