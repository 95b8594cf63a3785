use std::path::PathBuf;

use blockcam_core::Color;
use clap::Parser;

use crate::capture::CaptureSize;
use crate::devices::DeviceSelector;

#[derive(Parser, Debug)]
#[command(name = "blockcam", about = "Show a webcam or an animated image in the terminal")]
pub struct Cli {
    /// Image or animation to play (GIF, APNG, WebP, PNG, JPEG). Omit to use a camera
    pub input: Option<PathBuf>,

    /// Capture device index or exact name (default: first device)
    #[arg(short, long, conflicts_with = "input")]
    pub device: Option<DeviceSelector>,

    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Capture resolution to request from the device, e.g. 640x480
    #[arg(long, value_name = "WxH")]
    pub capture_size: Option<CaptureSize>,

    /// Output width in columns (default: terminal width)
    #[arg(long)]
    pub cols: Option<u16>,

    /// Output height in rows (default: terminal height minus one)
    #[arg(long)]
    pub rows: Option<u16>,

    /// Background that transparency blends onto
    #[arg(long, value_name = "R,G,B|#RRGGBB")]
    pub background: Option<Color>,

    /// Play an animation once instead of looping
    #[arg(long)]
    pub once: bool,

    /// Milliseconds to yield between live frames
    #[arg(long, default_value_t = 10)]
    pub poll_ms: u64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_playback_options() {
        let cli = Cli::try_parse_from([
            "blockcam",
            "cat.gif",
            "--background",
            "#101010",
            "--cols",
            "100",
            "--once",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("cat.gif")));
        assert_eq!(cli.background, Some(Color::new(16, 16, 16)));
        assert_eq!(cli.cols, Some(100));
        assert!(cli.once);
        assert_eq!(cli.poll_ms, 10);
    }

    #[test]
    fn parses_capture_options() {
        let cli = Cli::try_parse_from(["blockcam", "-d", "OBS Virtual Camera", "--capture-size", "640x480"]).unwrap();
        assert_eq!(cli.device, Some(DeviceSelector::Name("OBS Virtual Camera".to_string())));
        assert_eq!(cli.capture_size, Some(CaptureSize { width: 640, height: 480 }));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["blockcam", "--background", "red"]).is_err());
        assert!(Cli::try_parse_from(["blockcam", "a.gif", "--device", "0"]).is_err());
    }
}
