// ============================================================
// Layer 4 — Image Augmentation
// ============================================================
// Training images are perturbed on the fly so the network sees
// a slightly different version of every sample each epoch.
//
// Steps (always applied in this order, each one gated by its
// own probability):
//
//   1. Rotate          uniform angle in [-max, +max] degrees,
//                      nearest neighbour, uncovered pixels → 0
//   2. HorizontalFlip  mirror left ↔ right
//   3. ColorJitter     brightness and contrast factors, applied
//                      in random order, results clamped to [0, 1]
//   4. ResizedCrop     pick a box by area scale and aspect ratio,
//                      crop it, resize back to 28×28
//
// Labels are never touched: every step maps Image → Image.
//
// The evaluation pipeline has no random steps at all. A file
// given to `infer` is decoded, converted to grayscale, resized
// to 28×28 when it is not already that size, and normalized.
//
// All randomness comes from the `rng` argument, so a seeded
// StdRng gives repeatable output.

use std::{fs, path::Path};

use image::{imageops, imageops::FilterType, GrayImage, ImageBuffer, Luma};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{SignError, SignResult};
use crate::domain::sample::{Image, Sample, IMAGE_SIDE};

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Number of box proposals before ResizedCrop falls back to a centre crop
const CROP_ATTEMPTS: usize = 10;

// ─── Configuration ────────────────────────────────────────────────────────────
/// Augmentation hyperparameters, read from the `augmentation`
/// section of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    pub rotation_degrees:     f32,
    pub rotation_probability: f64,
    pub flip_probability:     f64,
    pub brightness:           (f32, f32),
    pub contrast:             (f32, f32),
    pub jitter_probability:   f64,
    pub crop_scale:           (f32, f32),
    pub crop_ratio:           (f32, f32),
    pub crop_probability:     f64,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_degrees:     10.0,
            rotation_probability: 1.0,
            flip_probability:     0.5,
            brightness:           (0.5, 1.5),
            contrast:             (0.5, 1.5),
            jitter_probability:   1.0,
            crop_scale:           (1.0, 1.5),
            crop_ratio:           (3.0 / 4.0, 4.0 / 3.0),
            crop_probability:     1.0,
        }
    }
}

impl AugmentationConfig {
    /// A config whose every step is switched off.
    pub fn disabled() -> Self {
        Self {
            rotation_probability: 0.0,
            flip_probability:     0.0,
            jitter_probability:   0.0,
            crop_probability:     0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SignResult<()> {
        let probabilities = [
            ("rotation_probability", self.rotation_probability),
            ("flip_probability",     self.flip_probability),
            ("jitter_probability",   self.jitter_probability),
            ("crop_probability",     self.crop_probability),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(SignError::config(format!("augmentation.{name} must be in [0, 1], got {p}")));
            }
        }

        if !(self.rotation_degrees >= 0.0 && self.rotation_degrees <= 180.0) {
            return Err(SignError::config(format!(
                "augmentation.rotation_degrees must be in [0, 180], got {}",
                self.rotation_degrees
            )));
        }

        let ranges = [
            ("brightness", self.brightness, 0.0),
            ("contrast",   self.contrast,   0.0),
            ("crop_scale", self.crop_scale, f32::MIN_POSITIVE),
            ("crop_ratio", self.crop_ratio, f32::MIN_POSITIVE),
        ];
        for (name, (lo, hi), min) in ranges {
            if !(lo >= min && lo <= hi && hi.is_finite()) {
                return Err(SignError::config(format!(
                    "augmentation.{name} must be an ordered range of positive values, got ({lo}, {hi})"
                )));
            }
        }
        Ok(())
    }
}

// ─── Transform steps ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Rotate { max_degrees: f32 },
    HorizontalFlip,
    ColorJitter { brightness: (f32, f32), contrast: (f32, f32) },
    ResizedCrop { scale: (f32, f32), ratio: (f32, f32) },
}

/// A transform plus the probability that it runs for a given sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub transform:   Transform,
    pub probability: f64,
}

/// Ordered chain of random steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Augmenter {
    steps: Vec<Step>,
}

impl Augmenter {
    pub fn from_config(cfg: &AugmentationConfig) -> Self {
        let steps = vec![
            Step {
                transform:   Transform::Rotate { max_degrees: cfg.rotation_degrees },
                probability: cfg.rotation_probability,
            },
            Step {
                transform:   Transform::HorizontalFlip,
                probability: cfg.flip_probability,
            },
            Step {
                transform: Transform::ColorJitter {
                    brightness: cfg.brightness,
                    contrast:   cfg.contrast,
                },
                probability: cfg.jitter_probability,
            },
            Step {
                transform: Transform::ResizedCrop {
                    scale: cfg.crop_scale,
                    ratio: cfg.crop_ratio,
                },
                probability: cfg.crop_probability,
            },
        ];
        Self { steps: steps.into_iter().filter(|s| s.probability > 0.0).collect() }
    }

    /// The evaluation pipeline: no steps, no randomness.
    pub fn identity() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn apply<R: Rng + ?Sized>(&self, image: &Image, rng: &mut R) -> Image {
        let mut out = image.clone();
        for step in &self.steps {
            if rng.gen_bool(step.probability) {
                out = step.transform.apply(&out, rng);
            }
        }
        out
    }

    /// Augment the image of a sample, keeping its label.
    pub fn apply_sample<R: Rng + ?Sized>(&self, sample: &Sample, rng: &mut R) -> Sample {
        if self.is_identity() {
            return sample.clone();
        }
        sample.with_image(self.apply(&sample.image, rng))
    }
}

impl Transform {
    pub fn apply<R: Rng + ?Sized>(&self, image: &Image, rng: &mut R) -> Image {
        match *self {
            Transform::Rotate { max_degrees } => {
                let angle = rng.gen_range(-max_degrees..=max_degrees);
                rotate(image, angle)
            }
            Transform::HorizontalFlip => {
                from_float(imageops::flip_horizontal(&to_float(image)))
            }
            Transform::ColorJitter { brightness, contrast } => {
                let b = rng.gen_range(brightness.0..=brightness.1);
                let c = rng.gen_range(contrast.0..=contrast.1);
                if rng.gen_bool(0.5) {
                    adjust_contrast(&adjust_brightness(image, b), c)
                } else {
                    adjust_brightness(&adjust_contrast(image, c), b)
                }
            }
            Transform::ResizedCrop { scale, ratio } => {
                let crop = crop_box(rng, scale, ratio);
                resized_crop(image, crop)
            }
        }
    }
}

// ─── Pixel operations ─────────────────────────────────────────────────────────

fn to_float(image: &Image) -> FloatImage {
    let side = IMAGE_SIDE as u32;
    ImageBuffer::from_fn(side, side, |x, y| Luma([image.get(x as usize, y as usize)]))
}

fn from_float(buffer: FloatImage) -> Image {
    Image::from_normalized(buffer.into_raw()).unwrap_or_else(Image::blank)
}

/// Rotate about the image centre by `degrees`.
fn rotate(image: &Image, degrees: f32) -> Image {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let centre     = (IMAGE_SIDE as f32 - 1.0) / 2.0;
    let side       = IMAGE_SIDE as f32;

    let mut pixels = Vec::with_capacity(IMAGE_SIDE * IMAGE_SIDE);
    for y in 0..IMAGE_SIDE {
        for x in 0..IMAGE_SIDE {
            // inverse mapping: where does this output pixel come from
            let dx = x as f32 - centre;
            let dy = y as f32 - centre;
            let sx = (cos * dx + sin * dy + centre).round();
            let sy = (-sin * dx + cos * dy + centre).round();

            let inside = sx >= 0.0 && sy >= 0.0 && sx < side && sy < side;
            pixels.push(if inside { image.get(sx as usize, sy as usize) } else { 0.0 });
        }
    }
    Image::from_normalized(pixels).unwrap_or_else(Image::blank)
}

fn adjust_brightness(image: &Image, factor: f32) -> Image {
    let pixels = image.pixels().iter().map(|&p| (p * factor).clamp(0.0, 1.0)).collect();
    Image::from_normalized(pixels).unwrap_or_else(Image::blank)
}

/// Blend with the mean intensity: factor 0 → flat gray, 1 → unchanged.
fn adjust_contrast(image: &Image, factor: f32) -> Image {
    let mean = image.mean();
    let pixels = image
        .pixels()
        .iter()
        .map(|&p| (factor * p + (1.0 - factor) * mean).clamp(0.0, 1.0))
        .collect();
    Image::from_normalized(pixels).unwrap_or_else(Image::blank)
}

/// Crop rectangle as (left, top, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left:   u32,
    pub top:    u32,
    pub width:  u32,
    pub height: u32,
}

/// Propose a crop covering `scale` of the image area with an
/// aspect ratio drawn log-uniformly from `ratio`. Proposals
/// larger than the image are rejected; after CROP_ATTEMPTS
/// rejections a centre crop with the closest legal ratio is used.
pub fn crop_box<R: Rng + ?Sized>(rng: &mut R, scale: (f32, f32), ratio: (f32, f32)) -> CropBox {
    let side = IMAGE_SIDE as f32;
    let area = side * side;
    let (log_lo, log_hi) = (ratio.0.ln(), ratio.1.ln());

    for _ in 0..CROP_ATTEMPTS {
        let target_area  = area * rng.gen_range(scale.0..=scale.1);
        let aspect_ratio = rng.gen_range(log_lo..=log_hi).exp();

        let w = (target_area * aspect_ratio).sqrt().round();
        let h = (target_area / aspect_ratio).sqrt().round();

        if w > 0.0 && h > 0.0 && w <= side && h <= side {
            let (w, h) = (w as u32, h as u32);
            let top  = rng.gen_range(0..=IMAGE_SIDE as u32 - h);
            let left = rng.gen_range(0..=IMAGE_SIDE as u32 - w);
            return CropBox { left, top, width: w, height: h };
        }
    }

    // Fallback: square source, so only a ratio range excluding 1 crops
    let (w, h) = if 1.0 < ratio.0 {
        (side, (side / ratio.0).round())
    } else if 1.0 > ratio.1 {
        ((side * ratio.1).round(), side)
    } else {
        (side, side)
    };
    let (w, h) = (w.max(1.0) as u32, h.max(1.0) as u32);
    CropBox {
        left:   (IMAGE_SIDE as u32 - w) / 2,
        top:    (IMAGE_SIDE as u32 - h) / 2,
        width:  w,
        height: h,
    }
}

fn resized_crop(image: &Image, crop: CropBox) -> Image {
    let side = IMAGE_SIDE as u32;
    if crop.width == side && crop.height == side {
        return image.clone();
    }
    let buffer  = to_float(image);
    let cropped = imageops::crop_imm(&buffer, crop.left, crop.top, crop.width, crop.height).to_image();
    from_float(imageops::resize(&cropped, side, side, FilterType::Triangle))
}

// ─── Evaluation transform ─────────────────────────────────────────────────────

/// Deterministic preprocessing for a decoded grayscale image:
/// resize to 28×28 if needed, then normalize to [0, 1].
/// Returns None for an empty image.
pub fn eval_transform(gray: &GrayImage) -> Option<Image> {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let side = IMAGE_SIDE as u32;
    if (w, h) == (side, side) {
        return Image::from_bytes(gray.as_raw());
    }
    let resized = imageops::resize(gray, side, side, FilterType::Triangle);
    Image::from_bytes(resized.as_raw())
}

/// Read and decode an image file, then apply `eval_transform`.
pub fn load_eval_image(path: &Path) -> SignResult<Image> {
    let bytes = fs::read(path).map_err(|e| SignError::io(path, e))?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| SignError::data_format(path, format!("cannot decode image: {e}")))?;

    eval_transform(&decoded.to_luma8())
        .ok_or_else(|| SignError::data_format(path, "image cannot be resized to 28x28"))
}
