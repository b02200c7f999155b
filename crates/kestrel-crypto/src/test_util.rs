//! Utilities for testing generators, engines, and protocols.
//!
//! # Warning
//!
//! Nothing in this module is secure. It exists so that tests
//! can make deterministic assertions.

#![cfg(any(test, doctest, feature = "test_util"))]
#![cfg_attr(docsrs, doc(cfg(feature = "test_util")))]

use alloc::{string::String, vec, vec::Vec};
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;
use zeroize::Zeroizing;

use crate::{
    csprng::RandomGenerator,
    kem::{KemEngine, RawEncapsulation},
};

/// A deterministic [`RandomGenerator`] that emits
/// `0, 1, 2, ..., 255, 0, 1, ...`.
///
/// Seeds are recorded, not mixed in, and do not reset the
/// counter. This lets tests tell fresh output apart from
/// buffered output.
#[derive(Debug, Default)]
pub struct CountingGenerator {
    next: Mutex<u8>,
    seeds: Mutex<Vec<Vec<u8>>>,
    fills: AtomicUsize,
}

impl CountingGenerator {
    /// Creates a generator starting at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a generator starting at `first`.
    pub fn starting_at(first: u8) -> Self {
        Self {
            next: Mutex::new(first),
            seeds: Mutex::new(Vec::new()),
            fills: AtomicUsize::new(0),
        }
    }

    /// Returns every seed passed to the generator, in order.
    pub fn seeds(&self) -> Vec<Vec<u8>> {
        self.seeds.lock().clone()
    }

    /// Returns the number of `fill_bytes` calls.
    pub fn fills(&self) -> usize {
        self.fills.load(Ordering::SeqCst)
    }
}

impl RandomGenerator for CountingGenerator {
    fn add_seed_material(&self, seed: &[u8]) {
        self.seeds.lock().push(seed.to_vec());
    }

    fn fill_bytes(&self, dst: &mut [u8]) {
        self.fills.fetch_add(1, Ordering::SeqCst);
        let mut next = self.next.lock();
        for b in dst {
            *b = *next;
            *next = next.wrapping_add(1);
        }
    }
}

/// A fault that [`XorKem`] can be told to inject.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    /// `generate_encapsulated` fails.
    Generate,
    /// `extract_secret` fails.
    Extract,
    /// Both directions return a secret one byte too short.
    ShortSecret,
}

/// An error returned by [`XorKem`].
#[derive(Debug, thiserror::Error)]
pub enum XorKemError {
    /// The encapsulation has the wrong length.
    #[error("invalid encapsulation length: {0}")]
    InvalidEncapsulation(usize),
    /// An injected fault.
    #[error("injected fault: {0:?}")]
    Injected(Fault),
}

/// A key for [`XorKem`]. The same key is used for both
/// directions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XorKey(pub [u8; XorKem::SECRET_LEN]);

/// A trivially insecure KEM: the encapsulation is the secret
/// XORed with the key.
#[derive(Clone, Debug)]
pub struct XorKem {
    name: String,
    bits: u32,
    fault: Option<Fault>,
}

impl XorKem {
    /// The size in bytes of the shared secret.
    pub const SECRET_LEN: usize = 32;

    /// Creates an engine that claims `bits` bits of security.
    pub fn new(bits: u32) -> Self {
        Self {
            name: String::from("XOR-KEM"),
            bits,
            fault: None,
        }
    }

    /// Makes the engine inject `fault`.
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    fn xor(key: &XorKey, data: &[u8]) -> Vec<u8> {
        data.iter().zip(key.0.iter()).map(|(a, b)| a ^ b).collect()
    }

    fn produced_len(&self) -> usize {
        match self.fault {
            Some(Fault::ShortSecret) => Self::SECRET_LEN.saturating_sub(1),
            _ => Self::SECRET_LEN,
        }
    }
}

impl KemEngine for XorKem {
    type PublicKey = XorKey;
    type PrivateKey = XorKey;
    type Error = XorKemError;

    fn algorithm(&self) -> &str {
        &self.name
    }

    fn security_bits(&self, _key: &XorKey) -> u32 {
        self.bits
    }

    fn secret_len(&self) -> usize {
        Self::SECRET_LEN
    }

    fn generate_encapsulated(
        &self,
        key: &XorKey,
        rng: &dyn RandomGenerator,
    ) -> Result<RawEncapsulation, XorKemError> {
        if self.fault == Some(Fault::Generate) {
            return Err(XorKemError::Injected(Fault::Generate));
        }
        let mut secret = Zeroizing::new(vec![0u8; self.produced_len()]);
        rng.fill_bytes(&mut secret);
        let encapsulation = Self::xor(key, &secret);
        Ok(RawEncapsulation {
            secret,
            encapsulation,
        })
    }

    fn extract_secret(
        &self,
        key: &XorKey,
        encapsulation: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, XorKemError> {
        if self.fault == Some(Fault::Extract) {
            return Err(XorKemError::Injected(Fault::Extract));
        }
        if encapsulation.len() != Self::SECRET_LEN {
            return Err(XorKemError::InvalidEncapsulation(encapsulation.len()));
        }
        let mut secret = Zeroizing::new(Self::xor(key, encapsulation));
        secret.truncate(self.produced_len());
        Ok(secret)
    }
}
