pub mod ansi;
pub mod color;
pub mod encode;
pub mod error;
pub mod sample;
pub mod scale;

pub use color::{Color, Frame, PixelLayout, RawPixel};
pub use encode::{encode_frame, encode_frame_at_home, EncoderState};
pub use error::Error;
pub use scale::{resolve_scale, Scaled, TerminalGeometry};
