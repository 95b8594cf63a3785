use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("frame data is {actual} bytes, expected {expected}")]
    DataLength { expected: usize, actual: usize },

    #[error("cannot fit a {src_width}x{src_height} source into {columns}x{rows} cells")]
    DegenerateGeometry {
        src_width: u32,
        src_height: u32,
        columns: u16,
        rows: u16,
    },

    #[error("invalid color {0:?}: expected R,G,B or #RRGGBB")]
    InvalidColor(String),
}
