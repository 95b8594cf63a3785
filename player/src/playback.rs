use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use blockcam_core::{encode_frame_at_home, Color, Frame, Scaled};
use log::{info, warn};

use crate::sequence::DecodedSequence;

/// Granularity of the wait loop between frames.
const WAIT_SLICE: Duration = Duration::from_millis(1);

/// Set once the user asks to stop (Ctrl-C).
#[derive(Clone, Debug, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install_ctrlc_handler(&self) -> anyhow::Result<()> {
        let quit = self.clone();
        ctrlc::set_handler(move || quit.request())
            .context("failed to install Ctrl-C handler")
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub frames_written: u64,
    pub bytes_written: u64,
}

impl PlaybackStats {
    fn record(&mut self, bytes: usize) {
        self.frames_written += 1;
        self.bytes_written += bytes as u64;
    }
}

/// Encodes every frame of `seq` up front, each starting with a cursor-home.
pub fn encode_sequence(seq: &DecodedSequence, scaled: &Scaled, bg: Color) -> Vec<Vec<u8>> {
    seq.frames()
        .iter()
        .map(|frame| {
            let mut buf = Vec::new();
            encode_frame_at_home(frame, scaled, bg, &mut buf);
            buf
        })
        .collect()
}

/// Writes pre-encoded frames, holding each for its delay. Loops forever
/// when `looping` is set, otherwise plays one pass. A single frame is
/// written once.
pub fn play_sequence(
    encoded: &[Vec<u8>],
    delays: &[Duration],
    out: &mut impl Write,
    quit: &QuitSignal,
    looping: bool,
) -> anyhow::Result<PlaybackStats> {
    let mut stats = PlaybackStats::default();
    let count = encoded.len();
    if count == 0 {
        return Ok(stats);
    }

    if count == 1 {
        write_frame(out, &encoded[0])?;
        stats.record(encoded[0].len());
        return Ok(stats);
    }

    let mut index = 0usize;
    loop {
        if !looping && index == count {
            break;
        }
        if quit.is_requested() {
            break;
        }
        let i = index % count;
        write_frame(out, &encoded[i])?;
        stats.record(encoded[i].len());

        let delay = delays.get(i).copied().unwrap_or(Duration::ZERO);
        if !wait(delay, quit) {
            break;
        }
        index = if looping { (index + 1) % count } else { index + 1 };
    }
    Ok(stats)
}

/// Encodes and writes frames as they arrive, yielding `poll` between them.
/// Frames whose size differs from `source_size` are skipped.
pub fn play_live(
    frames: impl Iterator<Item = Frame>,
    source_size: (u32, u32),
    scaled: &Scaled,
    bg: Color,
    out: &mut impl Write,
    quit: &QuitSignal,
    poll: Duration,
) -> anyhow::Result<PlaybackStats> {
    let mut stats = PlaybackStats::default();
    let mut buf = Vec::with_capacity(256 * 1024);

    for frame in frames {
        if quit.is_requested() {
            return Ok(stats);
        }
        if (frame.width(), frame.height()) != source_size {
            warn!(
                "skipping {}x{} frame, expected {}x{}",
                frame.width(),
                frame.height(),
                source_size.0,
                source_size.1
            );
            continue;
        }

        buf.clear();
        encode_frame_at_home(&frame, scaled, bg, &mut buf);
        write_frame(out, &buf)?;
        stats.record(buf.len());

        if !wait(poll, quit) {
            return Ok(stats);
        }
    }

    info!("capture ended after {} frames", stats.frames_written);
    Ok(stats)
}

fn write_frame(out: &mut impl Write, bytes: &[u8]) -> anyhow::Result<()> {
    out.write_all(bytes).context("failed to write frame")?;
    out.flush().context("failed to flush frame")
}

/// Sleeps for `delay` in short slices. Returns false if quit was requested.
fn wait(delay: Duration, quit: &QuitSignal) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if quit.is_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(WAIT_SLICE));
    }
}
