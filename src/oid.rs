//! The [`Oid`] domain type: a non-empty sequence of sub-identifiers with a
//! canonical dot-separated string form. Wire encoding lives in
//! [`crate::ber::oid`]; this type is what the rest of the crate (row
//! assembler, jobs, results) actually passes around.

use std::fmt;
use std::str::FromStr;

use crate::ber;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OidParseError {
    #[error("an OID must have at least two sub-identifiers")]
    TooShort,
    #[error("OID string contains a non-numeric or empty component")]
    InvalidComponent,
}

impl Oid {
    pub fn new(sub_ids: Vec<u32>) -> Result<Self, OidParseError> {
        if sub_ids.len() < 2 {
            return Err(OidParseError::TooShort);
        }
        Ok(Oid(sub_ids))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// True if `self` is `prefix` followed by at least one more
    /// sub-identifier — i.e. `self` names something strictly inside the
    /// subtree rooted at `prefix`. This is a component-wise prefix check,
    /// never a numeric/lexicographic OID comparison: the row assembler's
    /// correctness depends on that distinction (see [`crate::row`]).
    pub fn is_strict_descendant_of(&self, prefix: &Oid) -> bool {
        self.0.len() > prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// The sub-identifiers after `prefix`, i.e. the row index, assuming
    /// [`Self::is_strict_descendant_of`] already holds.
    pub fn suffix_after(&self, prefix: &Oid) -> Oid {
        Oid(self.0[prefix.0.len()..].to_vec())
    }

    /// `self` with `suffix`'s sub-identifiers appended.
    pub fn extended_with(&self, suffix: &Oid) -> Oid {
        let mut sub_ids = self.0.clone();
        sub_ids.extend_from_slice(&suffix.0);
        Oid(sub_ids)
    }

    pub fn encode(&self) -> Vec<u8> {
        ber::encode_object_id(&self.0)
    }

    pub fn decode(content: &[u8]) -> ber::DecodeResult<Self> {
        let sub_ids = ber::decode_object_id(content)?;
        Ok(Oid(sub_ids))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.0.iter();
        if let Some(first) = parts.next() {
            write!(f, "{first}")?;
        }
        for part in parts {
            write!(f, ".{part}")?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_matches('.');
        let sub_ids = s
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| OidParseError::InvalidComponent))
            .collect::<Result<Vec<_>, _>>()?;
        Oid::new(sub_ids)
    }
}
