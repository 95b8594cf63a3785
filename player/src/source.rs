use log::info;

use crate::capture::LiveCapture;
use crate::cli::Cli;
use crate::devices::{self, DeviceSelector};
use crate::sequence::DecodedSequence;

/// Where frames come from: a capture device read as frames arrive, or a
/// decoded image held in memory.
pub enum FrameSource {
    Live(LiveCapture),
    Sequence(DecodedSequence),
}

impl FrameSource {
    /// A file argument selects a decoded sequence; otherwise a capture
    /// device is opened.
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        if let Some(path) = &cli.input {
            let seq = DecodedSequence::load(path)?;
            info!("loaded {} ({} frames)", path.display(), seq.frame_count());
            return Ok(FrameSource::Sequence(seq));
        }

        let selector = cli.device.clone().unwrap_or(DeviceSelector::First);
        let available = devices::list_devices()?;
        let device = devices::select_device(&available, &selector)?;
        info!("using capture device {device}");
        let capture = LiveCapture::open(device, cli.capture_size)?;
        Ok(FrameSource::Live(capture))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            FrameSource::Live(capture) => (capture.source_width(), capture.source_height()),
            FrameSource::Sequence(seq) => seq.dimensions(),
        }
    }
}
