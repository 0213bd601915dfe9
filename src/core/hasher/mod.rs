//! # Hasher Module
//!
//! Computes the signature that decides which images are "the same".
//!
//! ## Modes
//! - **Exact** - xxh3 digest of the decoded pixels. Equal digests mean
//!   pixel-identical images, so grouping never produces false merges.
//! - **Similar** - perceptual hash compared by Hamming distance against a
//!   threshold. Tolerates brightness, contrast and re-encoding changes.
//!
//! A run uses exactly one mode; signatures of the two kinds are never compared.
//!
//! ## Example
//! ```rust,ignore
//! use image_consolidator::core::hasher::{DedupMode, HasherConfig};
//!
//! let provider = HasherConfig::new()
//!     .mode(DedupMode::Similar { threshold: 4 })
//!     .hash_size(8)
//!     .build()?;
//!
//! let signature = provider.compute(&path)?;
//! ```

mod algorithms;
mod decode;
mod traits;

pub use algorithms::{PerceptualHasher, PixelDigestHasher};
pub use decode::decode_image;
pub use traits::{ExactDigest, PerceptualHash, Signature, SignatureKind, SignatureProvider};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default Hamming distance tolerated in similar mode (out of 64 bits)
pub const DEFAULT_THRESHOLD: u32 = 4;

/// Default perceptual hash edge length
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// How images are judged to be the same
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupMode {
    /// Pixel-identical only
    #[default]
    Exact,
    /// Perceptual hashes within `threshold` bits
    Similar { threshold: u32 },
}

impl DedupMode {
    /// The signature kind this mode groups by
    pub fn signature_kind(&self) -> SignatureKind {
        match self {
            DedupMode::Exact => SignatureKind::Exact,
            DedupMode::Similar { .. } => SignatureKind::Perceptual,
        }
    }
}

impl std::fmt::Display for DedupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupMode::Exact => write!(f, "exact pixels"),
            DedupMode::Similar { threshold } => write!(f, "similar (distance <= {})", threshold),
        }
    }
}

/// Configuration builder for signature providers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    mode: DedupMode,
    hash_size: u32,
}

impl HasherConfig {
    /// Create a new configuration with defaults (exact mode)
    pub fn new() -> Self {
        Self {
            mode: DedupMode::Exact,
            hash_size: DEFAULT_HASH_SIZE,
        }
    }

    /// Set the dedup mode
    pub fn mode(mut self, mode: DedupMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the perceptual hash edge length (4-64). Ignored in exact mode.
    ///
    /// - 8: 64 bits, fast, good for most uses
    /// - 16: 256 bits, more selective
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<Box<dyn SignatureProvider>, ConfigError> {
        if !(4..=64).contains(&self.hash_size) {
            return Err(ConfigError::InvalidHashSize {
                value: self.hash_size,
            });
        }

        match self.mode {
            DedupMode::Exact => Ok(Box::new(PixelDigestHasher::new())),
            DedupMode::Similar { .. } => Ok(Box::new(PerceptualHasher::new(self.hash_size))),
        }
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_exact() {
        let provider = HasherConfig::new().build().unwrap();
        assert_eq!(provider.kind(), SignatureKind::Exact);
    }

    #[test]
    fn similar_mode_builds_perceptual_provider() {
        let provider = HasherConfig::new()
            .mode(DedupMode::Similar { threshold: 4 })
            .build()
            .unwrap();
        assert_eq!(provider.kind(), SignatureKind::Perceptual);
    }

    #[test]
    fn invalid_hash_size_is_rejected() {
        let result = HasherConfig::new().hash_size(2).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidHashSize { value: 2 })
        ));
    }

    #[test]
    fn mode_maps_to_signature_kind() {
        assert_eq!(DedupMode::Exact.signature_kind(), SignatureKind::Exact);
        assert_eq!(
            DedupMode::Similar { threshold: 0 }.signature_kind(),
            SignatureKind::Perceptual
        );
    }
}
