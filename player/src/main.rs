mod capture;
mod cli;
mod devices;
mod playback;
mod sequence;
mod source;
mod terminal;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use blockcam_core::resolve_scale;
use clap::Parser;
use log::{debug, info};

use crate::cli::Cli;
use crate::playback::QuitSignal;
use crate::source::FrameSource;
use crate::terminal::{ExitNewline, TerminalGuard};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    if cli.list_devices {
        let devices = devices::list_devices()?;
        if devices.is_empty() {
            eprintln!("No video capture devices found.");
        }
        for device in devices {
            println!("{device}");
        }
        return Ok(());
    }

    let _newline = ExitNewline::new(io::stdout());

    let quit = QuitSignal::new();
    quit.install_ctrlc_handler()?;

    let source = FrameSource::open(&cli)?;
    let (src_width, src_height) = source.dimensions();

    let geometry = terminal::usable_geometry(terminal::query_geometry(), cli.cols, cli.rows);
    let scaled = resolve_scale(src_width, src_height, geometry).context("cannot fit source into terminal")?;
    let bg = terminal::background_color(cli.background);
    info!(
        "source {src_width}x{src_height}, terminal {}x{}, scale {} -> {}x{} cells, background {bg}",
        geometry.columns, geometry.rows, scaled.scale, scaled.columns, scaled.rows
    );

    let stats = match source {
        FrameSource::Sequence(seq) => {
            let encoded = playback::encode_sequence(&seq, &scaled, bg);
            let _guard = TerminalGuard::enter()?;
            let stdout = io::stdout();
            let mut out = BufWriter::with_capacity(256 * 1024, stdout.lock());
            playback::play_sequence(&encoded, seq.delays(), &mut out, &quit, !cli.once)?
        }
        FrameSource::Live(capture) => {
            let _guard = TerminalGuard::enter()?;
            let stdout = io::stdout();
            let mut out = BufWriter::with_capacity(256 * 1024, stdout.lock());
            playback::play_live(
                capture,
                (src_width, src_height),
                &scaled,
                bg,
                &mut out,
                &quit,
                Duration::from_millis(cli.poll_ms),
            )?
        }
    };

    debug!(
        "wrote {} frames, {} bytes",
        stats.frames_written, stats.bytes_written
    );
    Ok(())
}

/// Logs go to stderr at `warn` by default so they stay out of the picture;
/// with `--log-file` everything from `info` up is kept.
fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = log_file else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
        return Ok(());
    };

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
