//! Strong type definitions for kvrecord.
//!
//! Identifiers, principals and scores are newtypes so that a record id can
//! never be passed where an owner is expected.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Seconds since the Unix epoch.
pub type UnixSeconds = i64;

/// Alphabet for the random id suffix.
const ID_SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random id suffix.
pub const ID_SUFFIX_LEN: usize = 7;

/// Opaque record identifier, also the suffix of the record's storage key.
///
/// Freshly generated ids have the form `<unix-millis>-<7 base36 chars>`,
/// but any non-empty string without whitespace is accepted so that ids
/// written by other clients still resolve.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Parse an id, rejecting empty strings and whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidId(id));
        }
        Ok(Self(id))
    }

    /// Generate a fresh id from a millisecond timestamp and a random suffix.
    pub fn generate<R: Rng + ?Sized>(unix_millis: i64, rng: &mut R) -> Self {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!("{}-{}", unix_millis, suffix))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The principal that created a record (typically a hex account address).
///
/// The text is stored verbatim; comparisons for authorization ignore ASCII
/// case, so `0xAbC` and `0xabc` name the same principal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(String);

impl Owner {
    /// Parse an owner, rejecting blank strings.
    pub fn new(owner: impl Into<String>) -> Result<Self, CoreError> {
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(CoreError::InvalidOwner(owner));
        }
        Ok(Self(owner))
    }

    /// Whether `other` names the same principal.
    pub fn matches(&self, other: &Owner) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({})", self.0)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Owner {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Owner {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.0
    }
}

/// A creativity score in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Score(u8);

impl Score {
    /// Highest valid score.
    pub const MAX: u8 = 100;

    /// The zero score (also the decode default for legacy records).
    pub const ZERO: Self = Self(0);

    /// Validate a raw score.
    pub fn new(value: u64) -> Result<Self, CoreError> {
        if value > u64::from(Self::MAX) {
            return Err(CoreError::ScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u64> for Score {
    type Error = CoreError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u64 {
    fn from(score: Score) -> Self {
        u64::from(score.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_id_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = RecordId::generate(1_736_870_400_000, &mut rng);
        let (millis, suffix) = id.as_str().split_once('-').unwrap();

        assert_eq!(millis, "1736870400000");
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ID_SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generated_ids_differ() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = RecordId::generate(1000, &mut rng);
        let b = RecordId::generate(1000, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_id_rejects_blank() {
        assert!(RecordId::new("").is_err());
        assert!(RecordId::new("a b").is_err());
        assert!(RecordId::new("1700000000000-abc1234").is_ok());
    }

    #[test]
    fn test_owner_matches_ignores_case() {
        let a = Owner::new("0xAbCdEf").unwrap();
        let b = Owner::new("0xabcdef").unwrap();
        let c = Owner::new("0xabcde0").unwrap();

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert_eq!(a.as_str(), "0xAbCdEf");
    }

    #[test]
    fn test_owner_rejects_blank() {
        assert!(Owner::new("   ").is_err());
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(Score::new(0).unwrap(), Score::ZERO);
        assert_eq!(Score::new(100).unwrap().value(), 100);
        assert_eq!(Score::new(101), Err(CoreError::ScoreOutOfRange(101)));
    }
}
