//! The Kestrel provider core.
//!
//! # Overview
//!
//! Kestrel does not implement cipher math itself. Algorithm
//! engines are supplied from outside and this crate provides
//! the scaffolding that makes them safe to use:
//!
//! - [`constraints`]: checks that an operation meets a
//!   configured minimum security strength before it runs.
//! - [`csprng`] and [`prng`]: random generators that can be
//!   seeded, layered, and shared between threads.
//! - [`kem`]: the generate/extract lifecycle shared by key
//!   encapsulation mechanisms, including destruction of the
//!   raw shared secret.
//!
//! Selector based certificate and credential stores live in
//! the `kestrel-store` crate.
//!
//! # Example
//!
//! ```
//! use kestrel_crypto::constraints::{
//!     AlgorithmPattern, ConstraintPolicy, ConstraintRegistry, Mode, Purpose, SecurityProperty,
//! };
//!
//! let registry = ConstraintRegistry::new([ConstraintPolicy::new(
//!     AlgorithmPattern::exact("AES"),
//!     Purpose::Encryption,
//!     128,
//!     Mode::Enforce,
//! )]);
//!
//! let ok = SecurityProperty::with_purpose("AES", 128, Default::default(), Purpose::Encryption);
//! assert!(registry.evaluate(&ok).is_ok());
//!
//! let weak = SecurityProperty::with_purpose("AES", 80, Default::default(), Purpose::Encryption);
//! assert!(registry.evaluate(&weak).is_err());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod constraints;
pub mod csprng;
mod error;
pub mod kem;
pub mod prng;
pub mod secret;
pub mod test_util;

pub use csprng::{RandomGenerator, SharedRandom};
pub use error::*;
pub use kem::{EncapsulatedSecret, KemEngine, KemError, KemProtocol};
#[doc(inline)]
pub use subtle;
#[doc(inline)]
pub use zeroize;
