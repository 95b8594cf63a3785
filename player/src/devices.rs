use std::fmt;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;

const SYSFS_V4L: &str = "/sys/class/video4linux";

/// A video capture device as reported by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureDevice {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.name)
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no video capture devices found")]
    NoDevices,
    #[error("capture device {0} not found (see --list-devices)")]
    NotFound(DeviceSelector),
}

/// Which device to open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DeviceSelector {
    #[default]
    First,
    Index(usize),
    /// Exact match on the reported device name.
    Name(String),
}

impl FromStr for DeviceSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(i) => DeviceSelector::Index(i),
            Err(_) => DeviceSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::First => f.write_str("(first available)"),
            DeviceSelector::Index(i) => write!(f, "#{i}"),
            DeviceSelector::Name(n) => write!(f, "{n:?}"),
        }
    }
}

/// Picks the device matching `selector`.
pub fn select_device<'a>(
    devices: &'a [CaptureDevice],
    selector: &DeviceSelector,
) -> Result<&'a CaptureDevice, DeviceError> {
    if devices.is_empty() {
        return Err(DeviceError::NoDevices);
    }
    let found = match selector {
        DeviceSelector::First => devices.first(),
        DeviceSelector::Index(i) => devices.iter().find(|d| d.index == *i),
        DeviceSelector::Name(name) => devices.iter().find(|d| d.name == *name),
    };
    found.ok_or_else(|| DeviceError::NotFound(selector.clone()))
}

/// The ffmpeg input device family for this platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    V4l2,
    AvFoundation,
    DShow,
}

impl Backend {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Backend::AvFoundation
        } else if cfg!(windows) {
            Backend::DShow
        } else {
            Backend::V4l2
        }
    }

    pub fn ffmpeg_format(self) -> &'static str {
        match self {
            Backend::V4l2 => "v4l2",
            Backend::AvFoundation => "avfoundation",
            Backend::DShow => "dshow",
        }
    }

    /// The `-i` argument that opens `device`.
    pub fn ffmpeg_input(self, device: &CaptureDevice) -> String {
        match self {
            Backend::V4l2 => format!("/dev/video{}", device.index),
            Backend::AvFoundation => format!("{}:none", device.index),
            Backend::DShow => format!("video={}", device.name),
        }
    }
}

pub fn list_devices() -> anyhow::Result<Vec<CaptureDevice>> {
    match Backend::current() {
        Backend::V4l2 => list_v4l2(Path::new(SYSFS_V4L)),
        Backend::AvFoundation => Ok(parse_avfoundation_list(&ffmpeg_device_log("avfoundation", "")?)),
        Backend::DShow => Ok(parse_dshow_list(&ffmpeg_device_log("dshow", "dummy")?)),
    }
}

/// Reads `videoN/name` entries under a sysfs video4linux directory.
fn list_v4l2(root: &Path) -> anyhow::Result<Vec<CaptureDevice>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", root.display())),
    };

    let mut devices = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", root.display()))?;
        let file_name = entry.file_name();
        let Some(index) = file_name
            .to_str()
            .and_then(|n| n.strip_prefix("video"))
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        let name = fs::read_to_string(entry.path().join("name"))
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|_| format!("video{index}"));
        devices.push(CaptureDevice { index, name });
    }
    devices.sort_by_key(|d| d.index);
    Ok(devices)
}

/// ffmpeg prints device lists on stderr and then fails on the dummy input.
fn ffmpeg_device_log(format: &str, dummy_input: &str) -> anyhow::Result<String> {
    let output = Command::new(ffmpeg_sidecar::paths::ffmpeg_path())
        .args(["-hide_banner", "-f", format, "-list_devices", "true", "-i", dummy_input])
        .stdin(Stdio::null())
        .output()
        .context("failed to run ffmpeg — is it installed?")?;
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Strips the `[dshow @ 0x...] ` style prefix from an ffmpeg log line.
fn strip_log_prefix(line: &str) -> &str {
    match (line.starts_with('['), line.find("] ")) {
        (true, Some(end)) => &line[end + 2..],
        _ => line,
    }
}

pub fn parse_avfoundation_list(log: &str) -> Vec<CaptureDevice> {
    let mut devices = Vec::new();
    let mut in_video = false;

    for line in log.lines() {
        let msg = strip_log_prefix(line).trim();
        if msg.contains("AVFoundation video devices") {
            in_video = true;
            continue;
        }
        if msg.contains("AVFoundation audio devices") {
            in_video = false;
            continue;
        }
        if !in_video {
            continue;
        }
        let Some(rest) = msg.strip_prefix('[') else {
            continue;
        };
        let Some((index, name)) = rest.split_once("] ") else {
            continue;
        };
        if let Ok(index) = index.parse::<usize>() {
            devices.push(CaptureDevice {
                index,
                name: name.trim().to_string(),
            });
        }
    }
    devices
}

/// Handles both the sectioned listing of older ffmpeg builds and the
/// `"Name" (video)` form of newer ones.
pub fn parse_dshow_list(log: &str) -> Vec<CaptureDevice> {
    let mut devices = Vec::new();
    let mut in_video = false;

    for line in log.lines() {
        let msg = strip_log_prefix(line).trim();
        if msg.starts_with("DirectShow video devices") {
            in_video = true;
            continue;
        }
        if msg.starts_with("DirectShow audio devices") {
            in_video = false;
            continue;
        }
        if msg.starts_with("Alternative name") {
            continue;
        }
        let Some(rest) = msg.strip_prefix('"') else {
            continue;
        };
        let Some((name, kind)) = rest.split_once('"') else {
            continue;
        };
        let is_video = match kind.trim() {
            "(video)" => true,
            "" => in_video,
            _ => false,
        };
        if is_video {
            devices.push(CaptureDevice {
                index: devices.len(),
                name: name.to_string(),
            });
        }
    }
    devices
}
