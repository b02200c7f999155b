//! Random byte generators.

use alloc::{boxed::Box, sync::Arc};

/// A cryptographically secure random byte generator that can
/// absorb additional seed material.
///
/// Every method takes `&self` so that one generator can sit
/// behind an [`Arc`] and be shared. Implementations with
/// mutable state must synchronize internally.
pub trait RandomGenerator {
    /// Mixes `seed` into the generator's state.
    ///
    /// Seeding never replaces existing entropy, it only adds to
    /// it. Generators backed by an external entropy source may
    /// ignore the seed entirely.
    fn add_seed_material(&self, seed: &[u8]);

    /// Mixes `seed` into the generator's state.
    fn add_seed_u64(&self, seed: u64) {
        self.add_seed_material(&seed.to_le_bytes())
    }

    /// Entirely fills `dst` with random bytes.
    ///
    /// To fill part of a buffer, pass the sub-slice, e.g.
    /// `rng.fill_bytes(&mut buf[off..off + len])`.
    ///
    /// # Error Handling
    ///
    /// If the underlying source encounters transient errors it
    /// must block until the error condition subsides. If it
    /// encounters a fatal error it must panic or abort.
    fn fill_bytes(&self, dst: &mut [u8]);

    /// Returns a fixed number of random bytes.
    fn bytes<T: AsMut<[u8]> + Default>(&self) -> T
    where
        Self: Sized,
    {
        let mut b = T::default();
        self.fill_bytes(b.as_mut());
        b
    }
}

/// A [`RandomGenerator`] that can be shared between threads.
pub type SharedRandom = Arc<dyn RandomGenerator + Send + Sync>;

impl<R: RandomGenerator + ?Sized> RandomGenerator for &R {
    fn add_seed_material(&self, seed: &[u8]) {
        (**self).add_seed_material(seed)
    }

    fn add_seed_u64(&self, seed: u64) {
        (**self).add_seed_u64(seed)
    }

    fn fill_bytes(&self, dst: &mut [u8]) {
        (**self).fill_bytes(dst)
    }
}

impl<R: RandomGenerator + ?Sized> RandomGenerator for Box<R> {
    fn add_seed_material(&self, seed: &[u8]) {
        (**self).add_seed_material(seed)
    }

    fn add_seed_u64(&self, seed: u64) {
        (**self).add_seed_u64(seed)
    }

    fn fill_bytes(&self, dst: &mut [u8]) {
        (**self).fill_bytes(dst)
    }
}

impl<R: RandomGenerator + ?Sized> RandomGenerator for Arc<R> {
    fn add_seed_material(&self, seed: &[u8]) {
        (**self).add_seed_material(seed)
    }

    fn add_seed_u64(&self, seed: u64) {
        (**self).add_seed_u64(seed)
    }

    fn fill_bytes(&self, dst: &mut [u8]) {
        (**self).fill_bytes(dst)
    }
}

impl rand_core::CryptoRng for &dyn RandomGenerator {}

impl rand_core::RngCore for &dyn RandomGenerator {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        RandomGenerator::fill_bytes(*self, dst);
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), rand_core::Error> {
        RandomGenerator::fill_bytes(*self, dst);
        Ok(())
    }
}

/// A source of shared [`RandomGenerator`]s.
pub trait RandomProvider {
    /// Returns a generator.
    fn get(&self) -> SharedRandom;
}

impl<F> RandomProvider for F
where
    F: Fn() -> SharedRandom,
{
    fn get(&self) -> SharedRandom {
        self()
    }
}

/// The operating system's random number generator.
///
/// Seed material is ignored: the OS maintains its own entropy
/// pool.
#[cfg(feature = "getrandom")]
#[cfg_attr(docsrs, doc(cfg(feature = "getrandom")))]
#[derive(Copy, Clone, Debug, Default)]
pub struct OsRandom;

#[cfg(feature = "getrandom")]
impl RandomGenerator for OsRandom {
    fn add_seed_material(&self, _seed: &[u8]) {}

    fn add_seed_u64(&self, _seed: u64) {}

    #[allow(clippy::panic)]
    fn fill_bytes(&self, dst: &mut [u8]) {
        if let Err(err) = getrandom::getrandom(dst) {
            panic!("OS random source failed: {err}");
        }
    }
}
