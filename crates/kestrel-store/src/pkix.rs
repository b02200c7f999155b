//! Certificate and CRL selection.
//!
//! Parsing and path validation are out of scope. Callers
//! describe their own certificate and CRL types through
//! [`Certificate`] and [`Crl`], then search stores of them with
//! [`CertSelector`] and [`CrlSelector`].
//!
//! Times are seconds since the Unix epoch.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::convert::Infallible;

use crate::{CollectionStore, Selector, Store, StoreError};

/// An X.509 style certificate.
pub trait Certificate {
    /// The subject's distinguished name.
    fn subject(&self) -> &str;
    /// The issuer's distinguished name.
    fn issuer(&self) -> &str;
    /// The serial number, big-endian.
    fn serial_number(&self) -> &[u8];
    /// The first second the certificate is valid.
    fn not_before(&self) -> u64;
    /// The last second the certificate is valid.
    fn not_after(&self) -> u64;
    /// The subject key identifier extension, if present.
    fn subject_key_id(&self) -> Option<&[u8]> {
        None
    }
}

/// A certificate revocation list.
pub trait Crl {
    /// The issuer's distinguished name.
    fn issuer(&self) -> &str;
    /// When the list was issued.
    fn this_update(&self) -> u64;
    /// When the next list will be issued, if known.
    fn next_update(&self) -> Option<u64>;
    /// Reports whether the certificate with `serial` is revoked.
    fn is_revoked(&self, serial: &[u8]) -> bool;
}

/// Matches certificates. Every criterion that is set must
/// match; an empty selector matches everything.
///
/// ```
/// use kestrel_store::pkix::CertSelector;
///
/// let sel = CertSelector::new()
///     .issuer("CN=Root")
///     .valid_at(1_700_000_000);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CertSelector {
    subject: Option<String>,
    issuer: Option<String>,
    serial_number: Option<Vec<u8>>,
    subject_key_id: Option<Vec<u8>>,
    valid_at: Option<u64>,
}

impl CertSelector {
    /// Creates a selector that matches every certificate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the subject to be `name`.
    pub fn subject(mut self, name: impl Into<String>) -> Self {
        self.subject = Some(name.into());
        self
    }

    /// Requires the issuer to be `name`.
    pub fn issuer(mut self, name: impl Into<String>) -> Self {
        self.issuer = Some(name.into());
        self
    }

    /// Requires the serial number to be `serial`.
    pub fn serial_number(mut self, serial: impl Into<Vec<u8>>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Requires the subject key identifier to be `id`.
    /// Certificates without one never match.
    pub fn subject_key_id(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.subject_key_id = Some(id.into());
        self
    }

    /// Requires the certificate to be valid at `time`.
    pub fn valid_at(mut self, time: u64) -> Self {
        self.valid_at = Some(time);
        self
    }

    fn is_match<C: Certificate + ?Sized>(&self, cert: &C) -> bool {
        self.subject.as_deref().is_none_or(|s| s == cert.subject())
            && self.issuer.as_deref().is_none_or(|s| s == cert.issuer())
            && self
                .serial_number
                .as_deref()
                .is_none_or(|s| s == cert.serial_number())
            && self
                .subject_key_id
                .as_deref()
                .is_none_or(|id| cert.subject_key_id() == Some(id))
            && self
                .valid_at
                .is_none_or(|t| cert.not_before() <= t && t <= cert.not_after())
    }
}

impl<C: Certificate + ?Sized> Selector<C> for CertSelector {
    type Error = Infallible;

    fn matches(&self, cert: &C) -> Result<bool, Infallible> {
        Ok(self.is_match(cert))
    }
}

/// Matches CRLs. Every criterion that is set must match; an
/// empty selector matches everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CrlSelector {
    issuers: Vec<String>,
    valid_at: Option<u64>,
    revokes: Option<Vec<u8>>,
}

impl CrlSelector {
    /// Creates a selector that matches every CRL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` to the accepted issuers. A CRL matches if it
    /// was issued by any of them.
    pub fn issuer(mut self, name: impl Into<String>) -> Self {
        self.issuers.push(name.into());
        self
    }

    /// Requires the CRL to be current at `time`.
    pub fn valid_at(mut self, time: u64) -> Self {
        self.valid_at = Some(time);
        self
    }

    /// Requires the CRL to revoke `serial`.
    pub fn revokes(mut self, serial: impl Into<Vec<u8>>) -> Self {
        self.revokes = Some(serial.into());
        self
    }

    fn is_match<L: Crl + ?Sized>(&self, crl: &L) -> bool {
        (self.issuers.is_empty() || self.issuers.iter().any(|s| s == crl.issuer()))
            && self.valid_at.is_none_or(|t| {
                crl.this_update() <= t && crl.next_update().is_none_or(|next| t <= next)
            })
            && self
                .revokes
                .as_deref()
                .is_none_or(|serial| crl.is_revoked(serial))
    }
}

impl<L: Crl + ?Sized> Selector<L> for CrlSelector {
    type Error = Infallible;

    fn matches(&self, crl: &L) -> Result<bool, Infallible> {
        Ok(self.is_match(crl))
    }
}

/// A store of certificates.
pub type CertStore<C> = CollectionStore<C>;

/// A store of CRLs.
pub type CrlStore<L> = CollectionStore<L>;

/// Certificate specific queries.
pub trait CertStoreExt<C: Certificate>: Store<C> {
    /// Returns the certificates whose subject is `cert`'s
    /// issuer.
    fn issuers_of(&self, cert: &C) -> Result<Vec<Arc<C>>, StoreError> {
        self.get_matches(&CertSelector::new().subject(cert.issuer()))
    }
}

impl<C: Certificate, St: Store<C> + ?Sized> CertStoreExt<C> for St {}
