//! Colour types and per-vertex colour normalisation

use serde::{Deserialize, Serialize};

/// Divisor used to bring byte-range channels into [0, 1]
pub const BYTE_CHANNEL_MAX: f32 = 255.0;

/// A packed 0xRRGGBB colour, as used for tints and backgrounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    pub const fn hex(self) -> u32 {
        self.0
    }

    /// Channels as floats in [0, 1]
    pub fn to_rgb_f32(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / BYTE_CHANNEL_MAX;
        let g = ((self.0 >> 8) & 0xff) as f32 / BYTE_CHANNEL_MAX;
        let b = (self.0 & 0xff) as f32 / BYTE_CHANNEL_MAX;
        [r, g, b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// A per-vertex colour buffer together with its declared range.
///
/// `values` is interleaved with `item_size` channels per vertex (3 for RGB,
/// 4 for RGBA). While `normalized` is false the range of the values is
/// unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorAttribute {
    pub values: Vec<f32>,
    pub item_size: usize,
    pub normalized: bool,
}

impl ColorAttribute {
    pub fn new(values: Vec<f32>, item_size: usize) -> Self {
        Self {
            values,
            item_size,
            normalized: false,
        }
    }

    /// Interleaved RGB values of unknown range
    pub fn rgb(values: Vec<f32>) -> Self {
        Self::new(values, 3)
    }

    /// Interleaved RGBA values of unknown range
    pub fn rgba(values: Vec<f32>) -> Self {
        Self::new(values, 4)
    }

    /// Number of vertices described by the buffer
    pub fn count(&self) -> usize {
        if self.item_size == 0 {
            0
        } else {
            self.values.len() / self.item_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest channel value in the buffer
    pub fn max_value(&self) -> Option<f32> {
        self.values.iter().copied().reduce(f32::max)
    }

    /// Bring the buffer into the canonical [0, 1] range, in place.
    ///
    /// Known approximation: a buffer whose channels all happen to be <= 1 is
    /// taken as already canonical, even if it was meant as very dark byte
    /// colours.
    pub fn normalize_in_place(&mut self) {
        if self.normalized || self.values.is_empty() {
            return;
        }

        let max_value = self.max_value().unwrap_or(0.0);
        if max_value > 1.0 {
            log::debug!(
                "Normalizing {} color values from 0-255 to 0-1 range (max {})",
                self.values.len(),
                max_value
            );
            for value in &mut self.values {
                *value = (*value / BYTE_CHANNEL_MAX).clamp(0.0, 1.0);
            }
        } else {
            log::debug!("Color values already in 0-1 range (max {})", max_value);
        }

        self.normalized = true;
    }
}

/// Return `color` in canonical [0, 1] range with `normalized` set.
///
/// Idempotent: normalising an already normalised attribute returns it
/// unchanged. An empty buffer is returned as is.
pub fn normalize(mut color: ColorAttribute) -> ColorAttribute {
    color.normalize_in_place();
    color
}
