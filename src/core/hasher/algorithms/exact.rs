//! Exact pixel signature.
//!
//! Hashes the dimensions and the RGBA16 samples of the decoded image with
//! xxh3-128. Two files are grouped only when every decoded sample matches,
//! whatever their container format or metadata.

use super::super::traits::{ExactDigest, Signature, SignatureKind, SignatureProvider};
use image::DynamicImage;
use xxhash_rust::xxh3::Xxh3;

/// Samples serialized per hasher update
const SAMPLES_PER_CHUNK: usize = 8192;

/// Exact-mode signature provider
#[derive(Debug, Default)]
pub struct PixelDigestHasher;

impl PixelDigestHasher {
    pub fn new() -> Self {
        Self
    }

    /// Digest of the decoded pixels
    pub fn digest(&self, image: &DynamicImage) -> ExactDigest {
        // 16-bit samples keep high-depth images distinct; 8-bit sources widen losslessly
        let pixels = image.to_rgba16();

        let mut hasher = Xxh3::new();
        hasher.update(&pixels.width().to_le_bytes());
        hasher.update(&pixels.height().to_le_bytes());

        let mut bytes = Vec::with_capacity(SAMPLES_PER_CHUNK * 2);
        for chunk in pixels.as_raw().chunks(SAMPLES_PER_CHUNK) {
            bytes.clear();
            bytes.extend(chunk.iter().flat_map(|sample| sample.to_le_bytes()));
            hasher.update(&bytes);
        }
        ExactDigest(hasher.digest128())
    }
}

impl SignatureProvider for PixelDigestHasher {
    fn sign_image(&self, image: &DynamicImage) -> Signature {
        Signature::Exact(self.digest(image))
    }

    fn kind(&self) -> SignatureKind {
        SignatureKind::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn pattern() -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        ImageBuffer::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]))
    }

    #[test]
    fn same_pixels_same_digest() {
        let hasher = PixelDigestHasher::new();
        let a = DynamicImage::ImageRgb8(pattern());
        let b = DynamicImage::ImageRgb8(pattern());
        assert_eq!(hasher.digest(&a), hasher.digest(&b));
    }

    #[test]
    fn opaque_rgba_matches_rgb() {
        let hasher = PixelDigestHasher::new();
        let rgb = pattern();
        let rgba = ImageBuffer::from_fn(16, 16, |x, y| {
            let p = rgb.get_pixel(x, y);
            Rgba([p[0], p[1], p[2], 255])
        });
        assert_eq!(
            hasher.digest(&DynamicImage::ImageRgb8(rgb)),
            hasher.digest(&DynamicImage::ImageRgba8(rgba))
        );
    }

    #[test]
    fn single_pixel_change_changes_digest() {
        let hasher = PixelDigestHasher::new();
        let original = pattern();
        let mut edited = original.clone();
        edited.put_pixel(7, 7, Rgb([1, 2, 3]));

        assert_ne!(
            hasher.digest(&DynamicImage::ImageRgb8(original)),
            hasher.digest(&DynamicImage::ImageRgb8(edited))
        );
    }

    #[test]
    fn dimensions_are_part_of_the_digest() {
        let hasher = PixelDigestHasher::new();
        let wide = ImageBuffer::from_pixel(4, 1, Rgb([9u8, 9, 9]));
        let tall = ImageBuffer::from_pixel(1, 4, Rgb([9u8, 9, 9]));
        assert_ne!(
            hasher.digest(&DynamicImage::ImageRgb8(wide)),
            hasher.digest(&DynamicImage::ImageRgb8(tall))
        );
    }

    #[test]
    fn chunked_digest_matches_one_shot_hash() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 90, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, (x ^ y) as u8])
        }));
        let pixels = image.to_rgba16();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&90u32.to_le_bytes());
        for sample in pixels.as_raw() {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        assert!(pixels.as_raw().len() > SAMPLES_PER_CHUNK);
        assert_eq!(
            PixelDigestHasher::new().digest(&image),
            ExactDigest(xxhash_rust::xxh3::xxh3_128(&bytes))
        );
    }

    #[test]
    fn kind_is_exact() {
        assert_eq!(PixelDigestHasher::new().kind(), SignatureKind::Exact);
    }
}
