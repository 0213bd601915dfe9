//! Signature types and the provider trait.

use super::decode::decode_image;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 128-bit digest over decoded pixels. Equal digests mean equal pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExactDigest(pub u128);

impl ExactDigest {
    /// Hexadecimal form, for logs
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

/// A perceptual hash compared by Hamming distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHash {
    bytes: Vec<u8>,
}

impl PerceptualHash {
    /// Wrap raw hash bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Hamming distance: the number of differing bits.
    ///
    /// Hashes of unequal length count every missing bit as different.
    pub fn distance(&self, other: &Self) -> u32 {
        let shared: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let extra = self.bytes.len().abs_diff(other.bytes.len()) as u32 * 8;
        shared + extra
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total number of bits in this hash
    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Hexadecimal form, for logs
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Which comparator a signature belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureKind {
    /// Exact pixel digest, equality only
    Exact,
    /// Perceptual hash, Hamming distance
    Perceptual,
}

impl SignatureKind {
    /// Short name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            SignatureKind::Exact => "exact",
            SignatureKind::Perceptual => "perceptual",
        }
    }
}

impl std::fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The content fingerprint of one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    Exact(ExactDigest),
    Perceptual(PerceptualHash),
}

impl Signature {
    /// The comparator this signature needs
    pub fn kind(&self) -> SignatureKind {
        match self {
            Signature::Exact(_) => SignatureKind::Exact,
            Signature::Perceptual(_) => SignatureKind::Perceptual,
        }
    }

    /// Hexadecimal form, for logs
    pub fn to_hex(&self) -> String {
        match self {
            Signature::Exact(digest) => digest.to_hex(),
            Signature::Perceptual(hash) => hash.to_hex(),
        }
    }
}

/// Computes signatures for image files.
///
/// Implementations must be deterministic: the same pixels always produce the
/// same signature.
pub trait SignatureProvider: Send + Sync {
    /// Compute a signature from an already-decoded image
    fn sign_image(&self, image: &DynamicImage) -> Signature;

    /// The kind of signature this provider produces
    fn kind(&self) -> SignatureKind;

    /// Decode a file and compute its signature
    fn compute(&self, path: &Path) -> Result<Signature, HashError> {
        let image = decode_image(path)?;
        Ok(self.sign_image(&image))
    }
}
