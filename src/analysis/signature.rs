//! RMS color signatures over pixel regions
//!
//! Squaring before averaging weights bright pixels more heavily than a plain
//! mean, which keeps the assembled mosaic from drifting darker than the
//! reference.

use serde::Serialize;

use crate::io::error::{MosaicError, Result};
use crate::spatial::pixels::{PixelSource, Region};

/// Color channel of an RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    /// Red channel
    Red,
    /// Green channel
    Green,
    /// Blue channel
    Blue,
}

impl Channel {
    /// Position of the channel within an RGB triple
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

/// Average (R, G, B) color of a pixel region, each channel non-negative
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Signature {
    red: f64,
    green: f64,
    blue: f64,
}

impl Signature {
    /// Create a signature from channel values
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Red channel value
    pub const fn red(&self) -> f64 {
        self.red
    }

    /// Green channel value
    pub const fn green(&self) -> f64 {
        self.green
    }

    /// Blue channel value
    pub const fn blue(&self) -> f64 {
        self.blue
    }

    /// Channel values as an array in RGB order
    pub const fn channels(&self) -> [f64; 3] {
        [self.red, self.green, self.blue]
    }

    /// Value of a single channel
    pub const fn channel(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Sum of signed per-channel differences `self - other`
    ///
    /// Differences of opposite sign cancel.
    pub fn signed_difference_sum(&self, other: &Self) -> f64 {
        (self.red - other.red) + (self.green - other.green) + (self.blue - other.blue)
    }

    /// Straight-line distance in RGB space
    pub fn euclidean_distance(&self, other: &Self) -> f64 {
        let dr = self.red - other.red;
        let dg = self.green - other.green;
        let db = self.blue - other.blue;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Channel strictly greater than both others, if any
    pub fn dominant_channel(&self) -> Option<Channel> {
        if self.red > self.green && self.red > self.blue {
            Some(Channel::Red)
        } else if self.green > self.red && self.green > self.blue {
            Some(Channel::Green)
        } else if self.blue > self.red && self.blue > self.green {
            Some(Channel::Blue)
        } else {
            None
        }
    }

    /// Truncate to an 8-bit RGB triple
    pub fn to_rgb(&self) -> [u8; 3] {
        self.channels()
            .map(|value| num_traits::clamp(value, 0.0, 255.0) as u8)
    }
}

/// Compute the RMS signature of `region` within `source`
///
/// Each channel is `sqrt(mean(value^2))` over the pixels of the region after
/// clipping it to the source bounds.
///
/// # Errors
///
/// Returns an error if:
/// - The region has zero width or height (`EmptyRegion`)
/// - The region origin lies outside the source (`InvalidRegion`)
pub fn rms_signature<S: PixelSource + ?Sized>(source: &S, region: Region) -> Result<Signature> {
    if region.area() == 0 {
        return Err(MosaicError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    let clipped =
        region
            .clip_to(source.width(), source.height())
            .ok_or(MosaicError::InvalidRegion {
                origin: (region.x, region.y),
                bounds: (source.width(), source.height()),
            })?;

    let mut squares = [0u64; 3];
    for y in clipped.y..clipped.y + clipped.height {
        for x in clipped.x..clipped.x + clipped.width {
            let rgb = source.pixel(x, y);
            for (sum, value) in squares.iter_mut().zip(rgb) {
                *sum += u64::from(value) * u64::from(value);
            }
        }
    }

    let count = clipped.area() as f64;
    let [red, green, blue] = squares.map(|sum| (sum as f64 / count).sqrt());
    Ok(Signature::new(red, green, blue))
}
