use alloc::{vec, vec::Vec};

use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, SharedSecret, StaticSecret};
use zeroize::Zeroizing;

use super::{KemEngine, RawEncapsulation};
use crate::csprng::RandomGenerator;

/// Domain separation for the key schedule.
const LABEL: &[u8] = b"kestrel DHKEM-X25519-HKDF-SHA256";

/// An error returned by [`ClassicalKem`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum X25519Error {
    /// The encapsulation is not a 32-byte public key.
    #[error("invalid encapsulation length: {0}")]
    InvalidEncapsulation(usize),
    /// The Diffie-Hellman output was all zeros.
    #[error("non-contributory Diffie-Hellman output")]
    NonContributory,
    /// Key derivation failed.
    #[error("key derivation failed")]
    Kdf,
}

/// A classical KEM built from X25519 Diffie-Hellman and
/// HKDF-SHA256.
///
/// The encapsulation is an ephemeral public key. The shared
/// secret is derived from the Diffie-Hellman output, bound to
/// both the encapsulation and the recipient's public key.
#[derive(Copy, Clone, Debug, Default)]
pub struct ClassicalKem;

impl ClassicalKem {
    /// The size in bytes of the shared secret.
    pub const SECRET_LEN: usize = 32;

    fn derive(
        dh: &SharedSecret,
        enc: &[u8],
        pk: &PublicKey,
    ) -> Result<Zeroizing<Vec<u8>>, X25519Error> {
        if !dh.was_contributory() {
            return Err(X25519Error::NonContributory);
        }
        let hk = Hkdf::<Sha256>::new(Some(LABEL), dh.as_bytes());
        let mut secret = Zeroizing::new(vec![0u8; Self::SECRET_LEN]);
        hk.expand_multi_info(&[enc, pk.as_bytes().as_slice()], &mut secret)
            .map_err(|_| X25519Error::Kdf)?;
        Ok(secret)
    }
}

impl KemEngine for ClassicalKem {
    type PublicKey = PublicKey;
    type PrivateKey = StaticSecret;
    type Error = X25519Error;

    fn algorithm(&self) -> &str {
        "DHKEM-X25519"
    }

    fn security_bits(&self, _key: &PublicKey) -> u32 {
        128
    }

    fn secret_len(&self) -> usize {
        Self::SECRET_LEN
    }

    fn generate_encapsulated(
        &self,
        key: &PublicKey,
        rng: &dyn RandomGenerator,
    ) -> Result<RawEncapsulation, X25519Error> {
        let (esk, epk) = generate_keypair(rng);
        let dh = esk.diffie_hellman(key);
        let secret = Self::derive(&dh, epk.as_bytes(), key)?;
        Ok(RawEncapsulation {
            secret,
            encapsulation: epk.as_bytes().to_vec(),
        })
    }

    fn extract_secret(
        &self,
        key: &StaticSecret,
        encapsulation: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, X25519Error> {
        let epk: [u8; 32] = encapsulation
            .try_into()
            .map_err(|_| X25519Error::InvalidEncapsulation(encapsulation.len()))?;
        let dh = key.diffie_hellman(&PublicKey::from(epk));
        Self::derive(&dh, encapsulation, &PublicKey::from(key))
    }
}

/// Generates an X25519 key pair for [`ClassicalKem`].
pub fn generate_keypair(rng: &dyn RandomGenerator) -> (StaticSecret, PublicKey) {
    let mut bytes = Zeroizing::new([0u8; 32]);
    rng.fill_bytes(&mut *bytes);
    let sk = StaticSecret::from(*bytes);
    let pk = PublicKey::from(&sk);
    (sk, pk)
}
