//! Security constraint enforcement.
//!
//! Before a service runs it describes itself with
//! [`ServiceProperties`]: the algorithm, the strength it
//! provides, and what it will be used for. A
//! [`ConstraintRegistry`] compares that description against
//! its configured [`ConstraintPolicy`]s and either permits the
//! operation or rejects it with a [`ConstraintViolation`].

use alloc::{string::String, vec::Vec};
use core::fmt;

use serde::{Deserialize, Serialize};

pub mod global;
mod policy;
mod registry;

pub use policy::*;
pub use registry::*;

/// The intended use of a cryptographic service.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Any purpose.
    #[default]
    Any,
    /// Creating signatures.
    Signing,
    /// Verifying signatures.
    Verifying,
    /// Encrypting data.
    Encryption,
    /// Decrypting data.
    Decryption,
    /// Key agreement and key encapsulation.
    KeyAgreement,
    /// Key generation.
    #[serde(rename = "keygen")]
    KeyGen,
    /// Random number generation.
    Prng,
    /// Hashing.
    Digest,
    /// Message authentication.
    Mac,
    /// Exporting key material in the clear.
    PlaintextExport,
}

impl Purpose {
    /// Every purpose, [`Purpose::Any`] first.
    pub const ALL: [Self; 11] = [
        Self::Any,
        Self::Signing,
        Self::Verifying,
        Self::Encryption,
        Self::Decryption,
        Self::KeyAgreement,
        Self::KeyGen,
        Self::Prng,
        Self::Digest,
        Self::Mac,
        Self::PlaintextExport,
    ];

    /// Returns the purpose's name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Signing => "signing",
            Self::Verifying => "verifying",
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::KeyAgreement => "key_agreement",
            Self::KeyGen => "keygen",
            Self::Prng => "prng",
            Self::Digest => "digest",
            Self::Mac => "mac",
            Self::PlaintextExport => "plaintext_export",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm specific parameters attached to a
/// [`SecurityProperty`].
///
/// No variant can hold a [`Purpose`], so the two cannot be
/// swapped by mistake.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum ServiceParams {
    /// No parameters.
    #[default]
    None,
    /// A key size in bits.
    KeySize(u32),
    /// A named parameter set, e.g. `"FrodoKEM-976-AES"`.
    Named(String),
    /// Encoded parameters.
    Bytes(Vec<u8>),
}

/// Describes a cryptographic service for constraint checking.
pub trait ServiceProperties {
    /// The name of the algorithm.
    fn service_name(&self) -> &str;

    /// The estimated security strength in bits.
    fn bits_of_security(&self) -> u32;

    /// What the service will be used for.
    fn purpose(&self) -> Purpose;

    /// Algorithm specific parameters.
    fn params(&self) -> &ServiceParams;
}

/// The default [`ServiceProperties`] implementation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SecurityProperty {
    algorithm: String,
    bits_of_security: u32,
    params: ServiceParams,
    purpose: Purpose,
}

impl SecurityProperty {
    /// Describes `algorithm` for [`Purpose::Any`] with no
    /// parameters.
    pub fn new(algorithm: impl Into<String>, bits_of_security: u32) -> Self {
        Self::with_purpose(algorithm, bits_of_security, ServiceParams::None, Purpose::Any)
    }

    /// Describes `algorithm` for [`Purpose::Any`].
    pub fn with_params(
        algorithm: impl Into<String>,
        bits_of_security: u32,
        params: ServiceParams,
    ) -> Self {
        Self::with_purpose(algorithm, bits_of_security, params, Purpose::Any)
    }

    /// Describes `algorithm` for `purpose`.
    pub fn with_purpose(
        algorithm: impl Into<String>,
        bits_of_security: u32,
        params: ServiceParams,
        purpose: Purpose,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            bits_of_security,
            params,
            purpose,
        }
    }
}

impl ServiceProperties for SecurityProperty {
    fn service_name(&self) -> &str {
        &self.algorithm
    }

    fn bits_of_security(&self) -> u32 {
        self.bits_of_security
    }

    fn purpose(&self) -> Purpose {
        self.purpose
    }

    fn params(&self) -> &ServiceParams {
        &self.params
    }
}

impl<P: ServiceProperties + ?Sized> ServiceProperties for &P {
    fn service_name(&self) -> &str {
        (**self).service_name()
    }

    fn bits_of_security(&self) -> u32 {
        (**self).bits_of_security()
    }

    fn purpose(&self) -> Purpose {
        (**self).purpose()
    }

    fn params(&self) -> &ServiceParams {
        (**self).params()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_constructors() {
        let p = SecurityProperty::new("AES", 128);
        assert_eq!(p.service_name(), "AES");
        assert_eq!(p.bits_of_security(), 128);
        assert_eq!(p.purpose(), Purpose::Any);
        assert_eq!(p.params(), &ServiceParams::None);

        let p = SecurityProperty::with_params("AES", 256, ServiceParams::KeySize(256));
        assert_eq!(p.purpose(), Purpose::Any);
        assert_eq!(p.params(), &ServiceParams::KeySize(256));

        let p = SecurityProperty::with_purpose(
            "FrodoKEM",
            192,
            ServiceParams::Named("FrodoKEM-976-AES".to_string()),
            Purpose::KeyAgreement,
        );
        assert_eq!(p.purpose(), Purpose::KeyAgreement);
    }

    #[test]
    fn test_purpose_names() {
        for p in Purpose::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, alloc::format!("\"{p}\""));
        }
    }
}
