use alloc::{string::String, vec::Vec};

use tracing::{debug, warn};

use super::{ConstraintPolicy, Mode, Purpose, RegistryConfig, ServiceProperties};

/// An operation does not meet an enforced security constraint.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{algorithm} provides {actual} bits of security for {purpose}, {required} required")]
pub struct ConstraintViolation {
    /// The algorithm that was rejected.
    pub algorithm: String,
    /// The purpose it was requested for.
    pub purpose: Purpose,
    /// The minimum bits of security required by the policy.
    pub required: u32,
    /// The bits of security the algorithm provides.
    pub actual: u32,
}

/// Evaluates [`ServiceProperties`] against a fixed set of
/// [`ConstraintPolicy`]s.
///
/// The policy set is fixed at construction. Changing policies
/// means building a new registry, so a registry can be shared
/// between threads without locking.
#[derive(Clone, Debug, Default)]
pub struct ConstraintRegistry {
    policies: Vec<ConstraintPolicy>,
}

impl ConstraintRegistry {
    /// Creates a registry from `policies`.
    pub fn new<I>(policies: I) -> Self
    where
        I: IntoIterator<Item = ConstraintPolicy>,
    {
        Self {
            policies: policies.into_iter().collect(),
        }
    }

    /// Creates a registry from its serialized form.
    pub fn from_config(config: RegistryConfig) -> Self {
        Self::new(config.policies)
    }

    /// Creates a registry without policies. It permits every
    /// operation.
    pub const fn permissive() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Creates a registry that requires at least `minimum_bits`
    /// of every algorithm, whatever it is used for.
    pub fn legacy_use(minimum_bits: u32) -> Self {
        Self::new([ConstraintPolicy::minimum(minimum_bits)])
    }

    /// Returns the policies, in registration order.
    pub fn policies(&self) -> &[ConstraintPolicy] {
        &self.policies
    }

    /// Finds the most specific policy for `algorithm` used for
    /// `purpose`.
    ///
    /// More specific algorithm patterns win. Between equally
    /// specific patterns a purpose specific policy beats a
    /// [`Purpose::Any`] policy, and then earlier registrations
    /// win. A wildcard never overrides a policy that names the
    /// algorithm. When `purpose` is [`Purpose::Any`] only
    /// [`Purpose::Any`] policies are considered.
    pub fn lookup(&self, algorithm: &str, purpose: Purpose) -> Option<&ConstraintPolicy> {
        let mut best: Option<(&ConstraintPolicy, ((u8, usize), bool))> = None;
        for policy in &self.policies {
            let applies = policy.purpose == purpose || policy.purpose == Purpose::Any;
            if !applies || !policy.algorithm.matches(algorithm) {
                continue;
            }
            let rank = (
                policy.algorithm.specificity(),
                policy.purpose != Purpose::Any,
            );
            if best.is_none_or(|(_, best_rank)| rank > best_rank) {
                best = Some((policy, rank));
            }
        }
        best.map(|(policy, _)| policy)
    }

    /// Checks `property` against the registry's policies.
    ///
    /// - No matching policy permits the operation.
    /// - A shortfall against an [`Mode::Enforce`] policy fails
    ///   with [`ConstraintViolation`].
    /// - A shortfall against a [`Mode::Warn`] policy is logged
    ///   and the operation is permitted.
    ///
    /// A property whose purpose is [`Purpose::Any`] could be
    /// used for anything, so it is checked against the most
    /// specific policy for every purpose and the largest
    /// enforced shortfall is reported.
    pub fn evaluate<P>(&self, property: &P) -> Result<(), ConstraintViolation>
    where
        P: ServiceProperties + ?Sized,
    {
        let algorithm = property.service_name();
        let purpose = property.purpose();
        if purpose != Purpose::Any {
            return match self.lookup(algorithm, purpose) {
                Some(policy) => Self::check(policy, property),
                None => Ok(()),
            };
        }

        let mut applicable: Vec<&ConstraintPolicy> = Vec::new();
        for p in Purpose::ALL {
            if let Some(policy) = self.lookup(algorithm, p) {
                if !applicable.iter().any(|seen| core::ptr::eq(*seen, policy)) {
                    applicable.push(policy);
                }
            }
        }

        let mut worst: Option<ConstraintViolation> = None;
        for policy in applicable {
            if let Err(err) = Self::check(policy, property) {
                if worst.as_ref().is_none_or(|w| err.required > w.required) {
                    worst = Some(err);
                }
            }
        }
        worst.map_or(Ok(()), Err)
    }

    fn check<P>(policy: &ConstraintPolicy, property: &P) -> Result<(), ConstraintViolation>
    where
        P: ServiceProperties + ?Sized,
    {
        let actual = property.bits_of_security();
        if actual >= policy.minimum_bits {
            return Ok(());
        }
        let algorithm = property.service_name();
        match policy.mode {
            Mode::Enforce => {
                debug!(
                    algorithm,
                    purpose = %property.purpose(),
                    required = policy.minimum_bits,
                    actual,
                    "security constraint violated"
                );
                Err(ConstraintViolation {
                    algorithm: String::from(algorithm),
                    purpose: property.purpose(),
                    required: policy.minimum_bits,
                    actual,
                })
            }
            Mode::Warn => {
                warn!(
                    algorithm,
                    purpose = %property.purpose(),
                    required = policy.minimum_bits,
                    actual,
                    "security constraint not met, permitting anyway"
                );
                Ok(())
            }
        }
    }
}

impl From<RegistryConfig> for ConstraintRegistry {
    fn from(config: RegistryConfig) -> Self {
        Self::from_config(config)
    }
}
