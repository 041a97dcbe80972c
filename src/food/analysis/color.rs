//! Network-free fallback that guesses a food from its dominant colours.
//!
//! Deliberately coarse and table-driven: the image is reduced to its five
//! most frequent quantized colours, and each palette entry is scored by the
//! closest of its reference colours.

use std::collections::HashMap;

use crate::food::error::Result;
use crate::food::image_data::ImageData;
use crate::food::models::AnalysisResult;

pub type Rgb = [u8; 3];

const BUCKET: u8 = 32;
// every 4th RGBA pixel
const SAMPLE_STRIDE: usize = 16;
const SIGNATURE_SIZE: usize = 5;
const MAX_SCORE: f64 = 0.8;
pub const MIN_CONFIDENCE: f64 = 0.5;

/// sqrt(3 * 255^2)
const MAX_DISTANCE: f64 = 441.672_955_930_063_7;

pub struct PaletteEntry {
    pub name: &'static str,
    pub colors: &'static [Rgb],
    pub base_confidence: f64,
}

pub const PALETTE: &[PaletteEntry] = &[
    PaletteEntry { name: "Apple", colors: &[[255, 0, 0], [0, 255, 0]], base_confidence: 0.6 },
    PaletteEntry { name: "Banana", colors: &[[255, 255, 0]], base_confidence: 0.7 },
    PaletteEntry { name: "Orange", colors: &[[255, 165, 0]], base_confidence: 0.7 },
    PaletteEntry { name: "Tomato", colors: &[[255, 99, 71]], base_confidence: 0.6 },
    PaletteEntry { name: "Lettuce", colors: &[[0, 255, 0], [50, 205, 50]], base_confidence: 0.5 },
    PaletteEntry { name: "Bread", colors: &[[245, 222, 179], [210, 180, 140]], base_confidence: 0.4 },
    PaletteEntry { name: "Rice", colors: &[[255, 255, 255], [245, 245, 220]], base_confidence: 0.5 },
    PaletteEntry { name: "Chicken", colors: &[[255, 228, 196], [222, 184, 135]], base_confidence: 0.5 },
    PaletteEntry { name: "Beef", colors: &[[139, 69, 19]], base_confidence: 0.5 },
    PaletteEntry { name: "Carrot", colors: &[[255, 140, 0]], base_confidence: 0.6 },
    PaletteEntry { name: "Egg", colors: &[[255, 255, 224], [255, 255, 240]], base_confidence: 0.6 },
];

/// Dominant quantized colours (most frequent first) and mean luma.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSignature {
    pub colors: Vec<Rgb>,
    pub brightness: f64,
}

impl ColorSignature {
    pub fn from_image(image: &ImageData) -> Result<Self> {
        let decoded = image::load_from_memory(image.bytes())?.to_rgba8();
        Ok(Self::from_rgba(decoded.as_raw()))
    }

    /// Build a signature from a flat RGBA buffer.
    pub fn from_rgba(pixels: &[u8]) -> Self {
        // color -> (count, first seen) so ties keep encounter order
        let mut histogram: HashMap<Rgb, (usize, usize)> = HashMap::new();
        for (order, px) in pixels.chunks_exact(4).step_by(SAMPLE_STRIDE / 4).enumerate() {
            let color = [quantize(px[0]), quantize(px[1]), quantize(px[2])];
            histogram.entry(color).or_insert((0, order)).0 += 1;
        }

        let mut ranked: Vec<(Rgb, (usize, usize))> = histogram.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        let colors = ranked
            .into_iter()
            .take(SIGNATURE_SIZE)
            .map(|(color, _)| color)
            .collect();

        let pixel_count = pixels.len() / 4;
        let brightness = if pixel_count == 0 {
            0.0
        } else {
            pixels
                .chunks_exact(4)
                .map(|px| 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64)
                .sum::<f64>()
                / pixel_count as f64
        };

        Self { colors, brightness }
    }
}

fn quantize(channel: u8) -> u8 {
    (channel / BUCKET) * BUCKET
}

/// `1 - distance / max distance`, so identical colours score 1.
pub fn color_similarity(a: Rgb, b: Rgb) -> f64 {
    let distance = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64 - *y as f64).powi(2))
        .sum::<f64>()
        .sqrt();
    1.0 - distance / MAX_DISTANCE
}

fn best_similarity(signature: &[Rgb], references: &[Rgb]) -> f64 {
    references
        .iter()
        .flat_map(|r| signature.iter().map(move |c| color_similarity(*r, *c)))
        .fold(0.0, f64::max)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorClassifier;

impl ColorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: an undecodable image is reported as an unknown food
    /// with zero confidence.
    pub fn classify(&self, image: &ImageData) -> AnalysisResult {
        match ColorSignature::from_image(image) {
            Ok(signature) => self.classify_signature(&signature),
            Err(e) => {
                log::warn!("Colour analysis failed: {}", e);
                AnalysisResult::unknown(0.0)
            }
        }
    }

    pub fn classify_signature(&self, signature: &ColorSignature) -> AnalysisResult {
        let mut best: Option<(&PaletteEntry, f64)> = None;
        for entry in PALETTE {
            let similarity = best_similarity(&signature.colors, entry.colors);
            let score = (similarity * entry.base_confidence).min(MAX_SCORE);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score >= MIN_CONFIDENCE => AnalysisResult::new(entry.name, score),
            Some((_, score)) => AnalysisResult::unknown(score),
            None => AnalysisResult::unknown(0.0),
        }
    }
}
