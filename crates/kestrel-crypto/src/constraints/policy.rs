use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Purpose;

/// Matches algorithm names.
///
/// The textual form is either an exact name (`"AES"`), a
/// prefix followed by a single trailing `*` (`"AES*"`), or a
/// lone `*`. Matching ignores ASCII case.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AlgorithmPattern {
    /// Matches every algorithm.
    Any,
    /// Matches algorithms starting with the prefix.
    Prefix(String),
    /// Matches exactly one algorithm.
    Exact(String),
}

impl AlgorithmPattern {
    /// Matches `name` exactly.
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// Matches names starting with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Reports whether the pattern matches `algorithm`.
    pub fn matches(&self, algorithm: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => algorithm
                .as_bytes()
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes())),
            Self::Exact(name) => name.eq_ignore_ascii_case(algorithm),
        }
    }

    /// Orders patterns from least to most specific.
    ///
    /// `*` < shorter prefix < longer prefix < exact name.
    pub(crate) fn specificity(&self) -> (u8, usize) {
        match self {
            Self::Any => (0, 0),
            Self::Prefix(prefix) => (1, prefix.len()),
            Self::Exact(_) => (2, 0),
        }
    }
}

impl fmt::Display for AlgorithmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Exact(name) => f.write_str(name),
        }
    }
}

/// An invalid [`AlgorithmPattern`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// The pattern is empty.
    #[error("empty algorithm pattern")]
    Empty,
    /// A `*` appears somewhere other than the end.
    #[error("`*` may only appear at the end of a pattern: {0:?}")]
    MisplacedWildcard(String),
}

impl FromStr for AlgorithmPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PatternError::Empty);
        }
        if s == "*" {
            return Ok(Self::Any);
        }
        match s.strip_suffix('*') {
            Some(prefix) if !prefix.contains('*') => Ok(Self::Prefix(prefix.to_string())),
            None if !s.contains('*') => Ok(Self::Exact(s.to_string())),
            _ => Err(PatternError::MisplacedWildcard(s.to_string())),
        }
    }
}

impl TryFrom<String> for AlgorithmPattern {
    type Error = PatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AlgorithmPattern> for String {
    fn from(pattern: AlgorithmPattern) -> Self {
        pattern.to_string()
    }
}

/// What happens when a property falls short of a policy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Reject the operation.
    #[default]
    Enforce,
    /// Log a warning and permit the operation.
    Warn,
}

/// A minimum security strength for algorithms matching a
/// pattern, used for a purpose.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintPolicy {
    /// The algorithms the policy applies to.
    pub algorithm: AlgorithmPattern,
    /// The purpose the policy applies to.
    ///
    /// [`Purpose::Any`] policies apply to every purpose unless
    /// a purpose specific policy also matches.
    #[serde(default)]
    pub purpose: Purpose,
    /// The minimum acceptable bits of security.
    pub minimum_bits: u32,
    /// Whether a shortfall is fatal.
    #[serde(default)]
    pub mode: Mode,
}

impl ConstraintPolicy {
    /// Creates a policy.
    pub fn new(algorithm: AlgorithmPattern, purpose: Purpose, minimum_bits: u32, mode: Mode) -> Self {
        Self {
            algorithm,
            purpose,
            minimum_bits,
            mode,
        }
    }

    /// Creates an [`Mode::Enforce`] policy for every algorithm
    /// and purpose.
    pub fn minimum(minimum_bits: u32) -> Self {
        Self::new(AlgorithmPattern::Any, Purpose::Any, minimum_bits, Mode::Enforce)
    }
}

/// The serialized form of a [`ConstraintRegistry`][super::ConstraintRegistry].
///
/// ```
/// use kestrel_crypto::constraints::{Mode, Purpose, RegistryConfig};
///
/// let config: RegistryConfig = serde_json::from_str(r#"{
///     "policies": [
///         { "algorithm": "AES", "purpose": "encryption", "minimum_bits": 128 },
///         { "algorithm": "SHA*", "minimum_bits": 112, "mode": "warn" }
///     ]
/// }"#).unwrap();
/// assert_eq!(config.policies[0].purpose, Purpose::Encryption);
/// assert_eq!(config.policies[1].mode, Mode::Warn);
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// The policies, in registration order.
    #[serde(default)]
    pub policies: Vec<ConstraintPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        assert_eq!("*".parse::<AlgorithmPattern>(), Ok(AlgorithmPattern::Any));
        assert_eq!(
            " AES ".parse::<AlgorithmPattern>(),
            Ok(AlgorithmPattern::exact("AES"))
        );
        assert_eq!(
            "SHA3-*".parse::<AlgorithmPattern>(),
            Ok(AlgorithmPattern::prefix("SHA3-"))
        );
        assert_eq!("".parse::<AlgorithmPattern>(), Err(PatternError::Empty));
        assert!(matches!(
            "A*ES".parse::<AlgorithmPattern>(),
            Err(PatternError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            "**".parse::<AlgorithmPattern>(),
            Err(PatternError::MisplacedWildcard(_))
        ));
    }

    #[test]
    fn test_pattern_display_round_trips() {
        for s in ["*", "AES", "SHA3-*"] {
            let pattern: AlgorithmPattern = s.parse().unwrap();
            assert_eq!(pattern.to_string(), s);
        }
    }

    #[test]
    fn test_pattern_matches() {
        let exact = AlgorithmPattern::exact("AES");
        assert!(exact.matches("AES"));
        assert!(exact.matches("aes"));
        assert!(!exact.matches("AES-GCM"));

        let prefix = AlgorithmPattern::prefix("AES");
        assert!(prefix.matches("AES"));
        assert!(prefix.matches("aes-gcm"));
        assert!(!prefix.matches("AE"));
        assert!(!prefix.matches("ChaCha20"));

        // Multi-byte names must not panic on non char boundaries.
        let prefix = AlgorithmPattern::prefix("GOS");
        assert!(!prefix.matches("ГОСТ"));

        assert!(AlgorithmPattern::Any.matches(""));
    }

    #[test]
    fn test_specificity() {
        let any = AlgorithmPattern::Any.specificity();
        let short = AlgorithmPattern::prefix("A").specificity();
        let long = AlgorithmPattern::prefix("AES").specificity();
        let exact = AlgorithmPattern::exact("AES").specificity();
        assert!(any < short && short < long && long < exact);
    }

    #[test]
    fn test_config_rejects_bad_pattern() {
        let err = serde_json::from_str::<RegistryConfig>(
            r#"{ "policies": [ { "algorithm": "A*B", "minimum_bits": 1 } ] }"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config: RegistryConfig = serde_json::from_str(r#"{}"#).unwrap();
        assert!(config.policies.is_empty());

        let config: RegistryConfig =
            serde_json::from_str(r#"{ "policies": [ { "algorithm": "*", "minimum_bits": 112 } ] }"#)
                .unwrap();
        assert_eq!(config.policies, [ConstraintPolicy::minimum(112)]);
    }
}
