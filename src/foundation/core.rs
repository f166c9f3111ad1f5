use crate::foundation::error::{CutframeError, CutframeResult};

pub use kurbo::{Point, Rect, Size, Vec2};

/// Quantized playback time: the index of a fixed-width time bucket.
///
/// Two seeks that land in the same bucket share a cache key.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeTick(pub u64);

impl TimeTick {
    /// Start time of this bucket in seconds.
    pub fn to_secs(self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.0)
    }

    /// Shift by `delta` buckets using saturating arithmetic.
    pub fn offset(self, delta: i64) -> Self {
        if delta >= 0 {
            Self(self.0.saturating_add(delta as u64))
        } else {
            Self(self.0.saturating_sub(delta.unsigned_abs()))
        }
    }
}

/// Rational frame rate used as the quantization grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

impl Fps {
    /// Create a validated frame rate.
    pub fn new(num: u32, den: u32) -> CutframeResult<Self> {
        if den == 0 {
            return Err(CutframeError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CutframeError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as `f64`.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den.max(1))
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num.max(1))
    }

    /// Convert a frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Round a playback time to the nearest bucket.
    ///
    /// Negative and non-finite times land in bucket 0.
    pub fn quantize(self, secs: f64) -> TimeTick {
        if !secs.is_finite() || secs <= 0.0 {
            return TimeTick(0);
        }
        TimeTick((secs * self.as_f64()).round() as u64)
    }
}

/// Logical project resolution in which positions and sizes are authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in logical units.
    pub width: u32,
    /// Height in logical units.
    pub height: u32,
}

impl Canvas {
    /// Canvas dimensions as a `kurbo::Size`.
    pub fn size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Displayed preview surface in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PreviewSize {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl PreviewSize {
    /// Create a preview size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Preview whose width is `width` and whose height keeps the canvas aspect ratio.
    pub fn fit_width(canvas: Canvas, width: f64) -> Self {
        if canvas.width == 0 {
            return Self::new(width, f64::from(canvas.height));
        }
        let height = width * f64::from(canvas.height) / f64::from(canvas.width);
        Self::new(width, height)
    }
}

/// Straight-alpha RGBA8 color, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> CutframeResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || CutframeError::validation(format!("invalid hex color '{s}'"));
        let byte = |i: usize| -> CutframeResult<u8> {
            u8::from_str_radix(hex.get(i..i + 2).ok_or_else(bad)?, 16).map_err(|_| bad())
        };
        match hex.len() {
            3 => {
                let nib = |i: usize| -> CutframeResult<u8> {
                    u8::from_str_radix(hex.get(i..=i).ok_or_else(bad)?, 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(bad()),
        }
    }

    /// Format as lowercase `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channels as an array, in `image::Rgba` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = CutframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
