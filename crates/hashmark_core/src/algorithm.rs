//! Content digests for asset bytes.
//!
//! [`digest`] is pure: no I/O and no shared state, so it can be called from
//! any number of threads at once.

use crate::error::{HashError, Result};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    /// SHA-1 (default, 20 bytes).
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    /// BLAKE3 with the standard 32 byte output.
    Blake3,
}

impl HashAlgorithm {
    const ALL: [HashAlgorithm; 7] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Blake3,
    ];

    /// Every supported algorithm, in a fixed order.
    pub fn all() -> &'static [HashAlgorithm] {
        &Self::ALL
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Look up an algorithm by name. Accepts `sha256` as well as `sha-256`,
    /// case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "");
        Self::ALL.into_iter().find(|algo| algo.name() == normalized)
    }

    /// Length of the raw digest in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
            Self::Blake3 => 32,
        }
    }

    /// Length of the hex representation.
    pub const fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// Raw digest of `data`, with `salt` appended to the input when present.
    pub fn compute(&self, data: &[u8], salt: Option<&str>) -> Vec<u8> {
        match self {
            Self::Md5 => compute_with::<md5::Md5>(data, salt),
            Self::Sha1 => compute_with::<sha1::Sha1>(data, salt),
            Self::Sha224 => compute_with::<sha2::Sha224>(data, salt),
            Self::Sha256 => compute_with::<sha2::Sha256>(data, salt),
            Self::Sha384 => compute_with::<sha2::Sha384>(data, salt),
            Self::Sha512 => compute_with::<sha2::Sha512>(data, salt),
            Self::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(data);
                if let Some(salt) = salt {
                    hasher.update(salt.as_bytes());
                }
                hasher.finalize().as_bytes().to_vec()
            }
        }
    }

    /// Hex digest truncated to at most `length` characters.
    pub fn hex_digest(&self, data: &[u8], length: usize, salt: Option<&str>) -> String {
        let mut hex = hex::encode(self.compute(data, salt));
        hex.truncate(length);
        hex
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compute_with<D: Digest>(data: &[u8], salt: Option<&str>) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(data);
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
    }
    hasher.finalize().to_vec()
}

/// Names of all supported algorithms.
pub fn hashers() -> Vec<&'static str> {
    HashAlgorithm::all().iter().map(HashAlgorithm::name).collect()
}

/// Hash `bytes` with the named algorithm and keep the first `length` hex
/// characters. A `length` beyond the full digest yields the full digest.
pub fn digest(bytes: &[u8], algorithm: &str, length: usize, salt: Option<&str>) -> Result<String> {
    let algo = HashAlgorithm::from_name(algorithm)
        .ok_or_else(|| HashError::UnsupportedAlgorithm(algorithm.to_string()))?;
    if length == 0 {
        return Err(HashError::InvalidConfig(
            "hash length must be a positive integer".into(),
        ));
    }
    Ok(algo.hex_digest(bytes, length, salt))
}
