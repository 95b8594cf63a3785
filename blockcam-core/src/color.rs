use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An opaque 24-bit color, as written to the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    /// Dark gray used when the terminal background cannot be queried.
    pub const DEFAULT_BACKGROUND: Color = Color::new(12, 12, 12);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Accepts `R,G,B` (decimal) or `#RRGGBB`.
impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidColor(s.to_string());
        let s_trim = s.trim();

        if let Some(hex) = s_trim.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            return Ok(Color::new(channel(0)?, channel(2)?, channel(4)?));
        }

        let parts: Vec<&str> = s_trim.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        Ok(Color::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
    }
}

/// A source pixel before compositing. Capture frames always carry `a == 255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawPixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Byte layout of a frame's pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// RGB24, alpha implied opaque.
    Rgb,
    /// RGBA32, straight alpha.
    Rgba,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// A source frame: row-major pixel data with a fixed layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyFrame { width, height });
        }
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Builds an RGBA frame from a slice of pixels (row-major).
    pub fn from_pixels(width: u32, height: u32, pixels: &[RawPixel]) -> Result<Self, Error> {
        let mut data = Vec::with_capacity(pixels.len() * 4);
        for p in pixels {
            data.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
        Self::new(width, height, PixelLayout::Rgba, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Reads one pixel. Callers must stay within `width` x `height`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> RawPixel {
        let bpp = self.layout.bytes_per_pixel();
        let off = (y as usize * self.width as usize + x as usize) * bpp;
        let px = &self.data[off..off + bpp];
        match self.layout {
            PixelLayout::Rgb => RawPixel {
                r: px[0],
                g: px[1],
                b: px[2],
                a: 255,
            },
            PixelLayout::Rgba => RawPixel {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            },
        }
    }
}
