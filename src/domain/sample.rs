// ============================================================
// Layer 3 — Sample Domain Types
// ============================================================
// A Sample is one labelled hand-gesture image:
//
//   Image  — 28 × 28 single-channel grid, row-major,
//            intensities normalized from 0..=255 to 0.0..=1.0
//   Label  — class id 0..=25, one per letter A..=Z
//
// The dataset never contains J (9) or Z (25): both letters
// need motion and cannot be captured in a still frame.
// A model still emits 26 logits, so a *predicted* label may
// be any class id, while a *dataset* label is checked.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of every image
pub const IMAGE_SIDE: usize = 28;

/// Number of pixels in one image (28 × 28)
pub const PIXEL_COUNT: usize = IMAGE_SIDE * IMAGE_SIDE;

/// Number of output classes (one per letter of the alphabet)
pub const NUM_CLASSES: usize = 26;

/// Class ids that never occur in the dataset (J and Z)
pub const UNUSED_CLASSES: [u8; 2] = [9, 25];

// ─── Image ────────────────────────────────────────────────────────────────────
/// A 28×28 grayscale image with values in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pixels: Vec<f32>,
}

impl Image {
    /// Build an image from already-normalized pixels.
    /// Returns None if the pixel count is not 784.
    pub fn from_normalized(pixels: Vec<f32>) -> Option<Self> {
        (pixels.len() == PIXEL_COUNT).then_some(Self { pixels })
    }

    /// Build an image from raw 0..=255 intensities.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PIXEL_COUNT {
            return None;
        }
        let pixels = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Some(Self { pixels })
    }

    pub fn blank() -> Self {
        Self { pixels: vec![0.0; PIXEL_COUNT] }
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.pixels[y * IMAGE_SIDE + x]
    }

    /// Quantize back to 0..=255, e.g. to write a PNG.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&p| (p.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    pub fn mean(&self) -> f32 {
        self.pixels.iter().sum::<f32>() / PIXEL_COUNT as f32
    }
}

// ─── Label ────────────────────────────────────────────────────────────────────
/// A class id in 0..26, displayed as its letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(u8);

impl Label {
    /// Validate a label read from the dataset.
    /// Rejects out-of-range ids and the two unused classes.
    pub fn from_dataset(id: i64) -> Option<Self> {
        let id = u8::try_from(id).ok()?;
        if usize::from(id) >= NUM_CLASSES || UNUSED_CLASSES.contains(&id) {
            return None;
        }
        Some(Self(id))
    }

    /// Wrap a model output index (argmax over the 26 logits).
    pub fn from_class_index(index: usize) -> Option<Self> {
        (index < NUM_CLASSES).then(|| Self(index as u8))
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn letter(self) -> char {
        char::from(b'A' + self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ─── Sample ───────────────────────────────────────────────────────────────────
/// One labelled image. Augmentation replaces the image,
/// the label is never touched after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub image: Image,
    pub label: Label,
}

impl Sample {
    pub fn new(image: Image, label: Label) -> Self {
        Self { image, label }
    }

    /// Same label, new image.
    pub fn with_image(&self, image: Image) -> Self {
        Self { image, label: self.label }
    }
}
