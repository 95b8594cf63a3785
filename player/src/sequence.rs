use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use blockcam_core::{Frame, PixelLayout};
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use log::debug;

/// Floor for per-frame delays; many animations store 0 for "as fast as possible".
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(10);

/// A fully decoded image or animation, every frame the same size.
pub struct DecodedSequence {
    frames: Vec<Frame>,
    delays: Vec<Duration>,
}

impl DecodedSequence {
    /// Decodes GIF, APNG and animated WebP frame by frame; any other format
    /// the `image` crate reads becomes a single still frame.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let reader = ImageReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("failed to read {}", path.display()))?;
        let format = reader
            .format()
            .with_context(|| format!("unrecognized image format: {}", path.display()))?;
        debug!("decoding {} as {format:?}", path.display());

        let open = || -> anyhow::Result<BufReader<File>> {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Ok(BufReader::new(file))
        };

        let frames = match format {
            ImageFormat::Gif => collect_animation(GifDecoder::new(open()?)?)?,
            ImageFormat::Png => {
                let decoder = PngDecoder::new(open()?)?;
                if decoder.is_apng()? {
                    collect_animation(decoder.apng()?)?
                } else {
                    vec![still(DynamicImage::from_decoder(decoder)?)?]
                }
            }
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(open()?)?;
                if decoder.has_animation() {
                    collect_animation(decoder)?
                } else {
                    vec![still(DynamicImage::from_decoder(decoder)?)?]
                }
            }
            _ => {
                let image = reader
                    .decode()
                    .with_context(|| format!("failed to decode {}", path.display()))?;
                vec![still(image)?]
            }
        };

        Self::from_frames(frames).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_frames(frames: Vec<(Frame, Duration)>) -> anyhow::Result<Self> {
        let Some((first, _)) = frames.first() else {
            anyhow::bail!("image has no frames");
        };
        let (width, height) = (first.width(), first.height());
        if let Some((odd, _)) = frames
            .iter()
            .find(|(f, _)| f.width() != width || f.height() != height)
        {
            anyhow::bail!(
                "frame size {}x{} differs from first frame {width}x{height}",
                odd.width(),
                odd.height()
            );
        }

        let (frames, delays) = frames
            .into_iter()
            .map(|(f, d)| (f, d.max(MIN_FRAME_DELAY)))
            .unzip();
        Ok(Self { frames, delays })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.frames[0].width(), self.frames[0].height())
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn collect_animation<'a>(decoder: impl AnimationDecoder<'a>) -> anyhow::Result<Vec<(Frame, Duration)>> {
    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame.context("failed to decode animation frame")?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay = if denom == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(numer as u64 * 1000 / denom as u64)
        };
        let buffer = frame.into_buffer();
        let (width, height) = buffer.dimensions();
        frames.push((Frame::new(width, height, PixelLayout::Rgba, buffer.into_raw())?, delay));
    }
    Ok(frames)
}

fn still(image: DynamicImage) -> anyhow::Result<(Frame, Duration)> {
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((Frame::new(width, height, PixelLayout::Rgba, rgba.into_raw())?, Duration::ZERO))
}
