//! Task fingerprints.
//!
//! A fingerprint is attached to every triggered build as a parameter so later
//! requests for the same logical task can find and cancel it. It is a dedup
//! heuristic, not a security token: MD5 keeps the values identical to the ones
//! already stamped on builds by earlier tooling.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Separator placed between fields before hashing.
pub const FIELD_DELIMITER: &str = "|";

/// Short deterministic identifier of a logical task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskFingerprint(String);

impl TaskFingerprint {
    /// Derive a fingerprint from an ordered sequence of fields.
    ///
    /// Order matters: the same fields in a different order give a different
    /// fingerprint. Empty fields are allowed.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Md5::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                hasher.update(FIELD_DELIMITER.as_bytes());
            }
            hasher.update(field.as_ref().as_bytes());
        }

        let mut hex = hex::encode(hasher.finalize());
        hex.truncate(FINGERPRINT_LEN);
        Self(hex)
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TaskFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
