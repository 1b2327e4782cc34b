//! Pixel access boundaries between the engine and image buffers
//!
//! The engine reads reference and candidate pixels through [`PixelSource`]
//! and writes the composite through [`CompositeSink`]. Both are implemented
//! for `image::RgbImage`; decoding and encoding stay outside the engine.

use image::{Rgb, RgbImage};

/// Read-only RGB pixel access
pub trait PixelSource {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// RGB value at (x, y)
    ///
    /// Out-of-range coordinates read as black.
    fn pixel(&self, x: u32, y: u32) -> [u8; 3];
}

/// Writable RGB pixel target for the composite
pub trait CompositeSink {
    /// Write an RGB value at (x, y)
    ///
    /// Out-of-range coordinates are ignored.
    fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

impl PixelSource for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.get_pixel_checked(x, y).map_or([0, 0, 0], |p| p.0)
    }
}

impl CompositeSink for RgbImage {
    fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(pixel) = self.get_pixel_mut_checked(x, y) {
            *pixel = Rgb(rgb);
        }
    }
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        (**self).pixel(x, y)
    }
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge (inclusive)
    pub x: u32,
    /// Top edge (inclusive)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Region {
    /// Create a region from its origin and size
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered before clipping
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersect with a `width` x `height` source anchored at the origin
    ///
    /// Returns `None` when nothing of the region lies inside the source.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let x_end = self.x.saturating_add(self.width).min(width);
        let y_end = self.y.saturating_add(self.height).min(height);
        let clipped = Self::new(self.x, self.y, x_end - self.x, y_end - self.y);
        (clipped.area() > 0).then_some(clipped)
    }
}
