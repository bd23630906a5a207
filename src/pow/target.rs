//! Difficulty targets and attempt hashing

use crate::pow::PowError;
use sha2::{Digest, Sha256};

/// A hash "wins" when, read as a 256-bit big-endian integer, it is strictly
/// below `2^(256 - bits)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    bits: u32,
    threshold: [u8; 32],
}

impl Target {
    /// Build a target requiring `bits` leading zero bits (1..=255).
    pub fn from_bits(bits: u32) -> Result<Self, PowError> {
        if bits == 0 || bits >= 256 {
            return Err(PowError::InvalidDifficulty(bits));
        }
        let shift = 256 - bits;
        let mut threshold = [0u8; 32];
        threshold[31 - (shift / 8) as usize] = 1 << (shift % 8);
        Ok(Self { bits, threshold })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The threshold as 32 big-endian bytes.
    pub fn threshold(&self) -> &[u8; 32] {
        &self.threshold
    }

    /// Whether `hash` is strictly below the threshold.
    pub fn is_met_by(&self, hash: &[u8; 32]) -> bool {
        // Big-endian byte arrays order the same way as the integers they encode.
        hash < &self.threshold
    }
}

/// SHA-256 of `data`, then the decimal nonce, then the decimal timestamp.
pub fn hash_attempt(data: &[u8], nonce: u64, timestamp: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.finalize().into()
}

/// Number of leading zero bits in a big-endian hash.
pub fn leading_zero_bits(hash: &[u8; 32]) -> u32 {
    let mut zeros = 0;
    for byte in hash {
        if *byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros
}
