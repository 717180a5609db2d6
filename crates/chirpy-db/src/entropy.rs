use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{Result, StoreError};

/// Source of random bytes for refresh-token values.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// Reads from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| StoreError::EntropyUnavailable(e.to_string()))
    }
}
