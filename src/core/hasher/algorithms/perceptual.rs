//! Perceptual hash implementation.
//!
//! A difference (gradient) hash: the image is shrunk to a small grayscale
//! grid and each bit records whether a pixel is brighter than its right-hand
//! neighbour. Uniform brightness or contrast adjustments keep those
//! relations, so edited copies land within a few bits of the original.
//!
//! We use the image_hasher crate's gradient hash.

use super::super::traits::{PerceptualHash, Signature, SignatureKind, SignatureProvider};
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Near-duplicate signature provider
pub struct PerceptualHasher {
    hash_size: u32,
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    /// Create a gradient hasher producing `hash_size * hash_size` bits
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Gradient)
            .to_hasher();

        Self { hash_size, hasher }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    /// Hash of the decoded image
    pub fn hash(&self, image: &DynamicImage) -> PerceptualHash {
        PerceptualHash::new(self.hasher.hash_image(image).as_bytes().to_vec())
    }
}

impl SignatureProvider for PerceptualHasher {
    fn sign_image(&self, image: &DynamicImage) -> Signature {
        Signature::Perceptual(self.hash(image))
    }

    fn kind(&self) -> SignatureKind {
        SignatureKind::Perceptual
    }
}
