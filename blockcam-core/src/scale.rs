use crate::error::Error;

/// Terminal size in character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalGeometry {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalGeometry {
    /// Used when the output is not a terminal or the size query fails.
    pub const FALLBACK: TerminalGeometry = TerminalGeometry { columns: 80, rows: 20 };

    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

/// Result of fitting a source into a cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scaled {
    /// Side of the square source box averaged into one half-cell pixel.
    pub scale: u32,
    /// Output width in cells (one pixel per column).
    pub columns: u32,
    /// Output height in cells (two pixels per row).
    pub rows: u32,
}

impl Scaled {
    fn at(src_width: u32, src_height: u32, scale: u32) -> Self {
        let pixel_rows = src_height.div_ceil(scale);
        Self {
            scale,
            columns: src_width.div_ceil(scale),
            rows: pixel_rows.div_ceil(2),
        }
    }
}

/// Finds the smallest box size that fits a `src_width` x `src_height` source
/// into `geometry`, where each cell holds one pixel across and two down.
pub fn resolve_scale(src_width: u32, src_height: u32, geometry: TerminalGeometry) -> Result<Scaled, Error> {
    if src_width == 0 || src_height == 0 || geometry.columns == 0 || geometry.rows == 0 {
        return Err(Error::DegenerateGeometry {
            src_width,
            src_height,
            columns: geometry.columns,
            rows: geometry.rows,
        });
    }

    let columns = geometry.columns as u32;
    let rows = geometry.rows as u32;

    let mut scaled = Scaled::at(src_width, src_height, 1);
    while scaled.columns > columns || scaled.rows > rows {
        scaled = Scaled::at(src_width, src_height, scaled.scale + 1);
    }
    Ok(scaled)
}
