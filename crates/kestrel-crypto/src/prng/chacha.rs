use core::fmt;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use spin::Mutex;
use zeroize::Zeroizing;

use crate::csprng::RandomGenerator;

/// A ChaCha20 fast key erasure CSPRNG.
///
/// After every request the generator rekeys itself from its
/// own output, so earlier output cannot be recovered from the
/// current state. Seed material is hashed together with fresh
/// key stream, which means seeding only ever adds entropy.
///
/// For more information on "fast key erasure", see
/// <https://blog.cr.yp.to/20170723-random.html>.
pub struct ChaChaRandom {
    rng: Mutex<ChaCha20Rng>,
}

impl ChaChaRandom {
    /// Creates a generator from `seed`.
    ///
    /// The same seed always produces the same stream.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::from_seed(seed)),
        }
    }

    /// Creates a generator seeded by the operating system.
    #[cfg(feature = "getrandom")]
    #[cfg_attr(docsrs, doc(cfg(feature = "getrandom")))]
    pub fn from_os() -> Result<Self, getrandom::Error> {
        let mut seed = Zeroizing::new([0u8; 32]);
        getrandom::getrandom(&mut *seed)?;
        Ok(Self::from_seed(*seed))
    }

    /// Replaces the key with the next 32 bytes of key stream.
    fn rekey(rng: &mut ChaCha20Rng) {
        let mut key = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *key);
        *rng = ChaCha20Rng::from_seed(*key);
    }
}

impl RandomGenerator for ChaChaRandom {
    fn add_seed_material(&self, seed: &[u8]) {
        let mut rng = self.rng.lock();
        let mut block = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *block);
        let digest = Sha256::new()
            .chain_update(block.as_slice())
            .chain_update(seed)
            .finalize();
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&digest);
        *rng = ChaCha20Rng::from_seed(*key);
    }

    fn fill_bytes(&self, dst: &mut [u8]) {
        let mut rng = self.rng.lock();
        rng.fill_bytes(dst);
        Self::rekey(&mut rng);
    }
}

impl fmt::Debug for ChaChaRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaChaRandom").finish_non_exhaustive()
    }
}
