use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use blockcam_core::{Frame, PixelLayout};
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use log::{debug, warn};

use crate::devices::{Backend, CaptureDevice};

/// Requested capture resolution, `WIDTHxHEIGHT` on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for CaptureSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid size {s:?}: expected WIDTHxHEIGHT");
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width = w.parse::<u32>().map_err(|_| invalid())?;
        let height = h.parse::<u32>().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for CaptureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Live frames from a capture device, read through an ffmpeg child process
/// emitting raw RGB24. The child is killed when this is dropped.
pub struct LiveCapture {
    width: u32,
    height: u32,
    events: Box<dyn Iterator<Item = FfmpegEvent>>,
    child: FfmpegChild,
}

impl LiveCapture {
    pub fn open(device: &CaptureDevice, size: Option<CaptureSize>) -> anyhow::Result<Self> {
        let backend = Backend::current();
        let input = backend.ffmpeg_input(device);

        let mut command = FfmpegCommand::new();
        command.hide_banner().format(backend.ffmpeg_format());
        if let Some(size) = size {
            command.args(["-video_size", &size.to_string()]);
        }
        command.input(&input).rawvideo();
        debug!("spawning ffmpeg for {input}");

        let mut child = command
            .spawn()
            .context("failed to spawn ffmpeg — is it installed?")?;
        let mut events = child.iter().context("failed to iterate ffmpeg events")?;

        // The first frame fixes the negotiated resolution
        let mut first_frame = None;
        let mut last_error = None;
        for event in &mut events {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    first_frame = Some(frame);
                    break;
                }
                FfmpegEvent::Error(msg) => last_error = Some(msg),
                _ => {}
            }
        }

        let Some(first) = first_frame.filter(|f| f.width > 0 && f.height > 0) else {
            let _ = child.kill();
            let _ = child.wait();
            match last_error {
                Some(msg) => anyhow::bail!("could not open capture device {device}: {msg}"),
                None => anyhow::bail!("capture device {device} produced no frames"),
            }
        };
        let (width, height) = (first.width, first.height);

        // Chain the first frame back in front of the remaining events
        let rest = std::iter::once(FfmpegEvent::OutputFrame(first)).chain(events);

        Ok(Self {
            width,
            height,
            events: Box::new(rest),
            child,
        })
    }

    pub fn source_width(&self) -> u32 {
        self.width
    }

    pub fn source_height(&self) -> u32 {
        self.height
    }
}

impl Iterator for LiveCapture {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        for event in &mut self.events {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    return match Frame::new(frame.width, frame.height, PixelLayout::Rgb, frame.data) {
                        Ok(frame) => Some(frame),
                        Err(e) => {
                            warn!("dropping malformed capture frame: {e}");
                            None
                        }
                    };
                }
                FfmpegEvent::Error(msg) => debug!("ffmpeg: {msg}"),
                _ => {}
            }
        }
        None
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
