//! Signature implementations.

mod exact;
mod perceptual;

pub use exact::PixelDigestHasher;
pub use perceptual::PerceptualHasher;
