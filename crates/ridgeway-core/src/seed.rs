//! Deterministic terrain seeds

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// An opaque value that fully determines a generated terrain.
///
/// Accepts either a string or an integer in config files. Both forms hash
/// through their textual representation, so `42` and `"42"` are the same
/// terrain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(i64),
    Text(String),
}

impl Seed {
    /// Canonical text form used for hashing
    pub fn canonical(&self) -> String {
        match self {
            Seed::Number(n) => n.to_string(),
            Seed::Text(s) => s.clone(),
        }
    }

    /// Full SHA-256 digest of the canonical form
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        hasher.finalize().into()
    }

    /// 32-bit seed for the noise permutation tables
    pub fn noise_seed(&self) -> u32 {
        let d = self.digest();
        u32::from_le_bytes([d[0], d[1], d[2], d[3]])
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Text("ridgeway".to_string())
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl FromStr for Seed {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => Seed::Number(n),
            Err(_) => Seed::Text(s.to_string()),
        })
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

impl From<i64> for Seed {
    fn from(n: i64) -> Self {
        Seed::Number(n)
    }
}
