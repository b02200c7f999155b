//! Random generators built on top of [`RandomGenerator`].
//!
//! [`RandomGenerator`]: crate::csprng::RandomGenerator

mod chacha;
mod reversed_window;

pub use chacha::*;
pub use reversed_window::*;

/// An invalid generator configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum WindowError {
    /// The window must hold at least two bytes.
    #[error("window size must be at least 2, got {0}")]
    TooSmall(usize),
}
