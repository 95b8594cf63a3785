use crate::ansi::{self, CURSOR_HOME, HALF_BLOCK, RESET};
use crate::color::{Color, Frame};
use crate::sample::sample;
use crate::scale::Scaled;

/// Colors the terminal currently holds, as far as this row's output goes.
/// `None` means nothing has been emitted yet, so the next cell always sets it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncoderState {
    pub last_fg: Option<Color>,
    pub last_bg: Option<Color>,
}

impl EncoderState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Writes one cell showing `top` over `bottom`, emitting only the
    /// escapes needed to move the terminal from the current state.
    pub fn paint(&mut self, top: Color, bottom: Color, buf: &mut Vec<u8>) {
        if top == bottom {
            // A space only shows the background; the foreground is left as is.
            if self.last_bg != Some(top) {
                ansi::write_bg(buf, top);
                self.last_bg = Some(top);
            }
            buf.push(b' ');
            return;
        }

        if self.last_fg != Some(top) {
            ansi::write_fg(buf, top);
            self.last_fg = Some(top);
        }
        if self.last_bg != Some(bottom) {
            ansi::write_bg(buf, bottom);
            self.last_bg = Some(bottom);
        }
        buf.extend_from_slice(HALF_BLOCK.as_bytes());
    }
}

/// Appends `frame` rendered as `scaled.rows` lines of `scaled.columns`
/// half-block cells. Every line ends with a reset and a newline, and the
/// frame ends with one more reset. Returns the number of bytes appended.
///
/// At odd source heights the last line has no bottom pixels; that half is
/// drawn in `bg`, as a fully transparent pixel would be.
pub fn encode_frame(frame: &Frame, scaled: &Scaled, bg: Color, buf: &mut Vec<u8>) -> usize {
    let start = buf.len();
    let scale = scaled.scale;
    let mut state = EncoderState::default();

    for row in 0..scaled.rows {
        state.reset();
        let top_y = 2 * row * scale;
        let bot_y = top_y + scale;

        for col in 0..scaled.columns {
            let x = col * scale;
            let top = sample(frame, x, top_y, scale, bg);
            let bottom = if bot_y < frame.height() {
                sample(frame, x, bot_y, scale, bg)
            } else {
                bg
            };
            state.paint(top, bottom, buf);
        }

        buf.extend_from_slice(RESET);
        buf.push(b'\n');
    }
    buf.extend_from_slice(RESET);

    buf.len() - start
}

/// Same as [`encode_frame`], preceded by a cursor-home so consecutive
/// frames overwrite each other instead of scrolling.
pub fn encode_frame_at_home(frame: &Frame, scaled: &Scaled, bg: Color, buf: &mut Vec<u8>) -> usize {
    buf.extend_from_slice(CURSOR_HOME);
    CURSOR_HOME.len() + encode_frame(frame, scaled, bg, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RawPixel;
    use crate::scale::{resolve_scale, TerminalGeometry};
    use proptest::prelude::*;

    const RED: Color = Color::new(255, 0, 0);
    const BLUE: Color = Color::new(0, 0, 255);

    fn opaque(c: Color) -> RawPixel {
        RawPixel { r: c.r, g: c.g, b: c.b, a: 255 }
    }

    fn grid(width: u32, height: u32, colors: &[Color]) -> Frame {
        let pixels: Vec<RawPixel> = colors.iter().copied().map(opaque).collect();
        Frame::from_pixels(width, height, &pixels).unwrap()
    }

    fn encode(frame: &Frame, bg: Color) -> Vec<u8> {
        let geometry = TerminalGeometry::new(80, 40);
        let scaled = resolve_scale(frame.width(), frame.height(), geometry).unwrap();
        let mut buf = Vec::new();
        let n = encode_frame(frame, &scaled, bg, &mut buf);
        assert_eq!(n, buf.len());
        buf
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn red_over_blue_two_columns() {
        let frame = grid(2, 2, &[RED, RED, BLUE, BLUE]);
        let scaled = resolve_scale(2, 2, TerminalGeometry::new(80, 40)).unwrap();
        assert_eq!(scaled, Scaled { scale: 1, columns: 2, rows: 1 });

        let out = encode(&frame, Color::BLACK);
        assert_eq!(out, "\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m▀▀\x1b[0m\n\x1b[0m".as_bytes());
    }

    #[test]
    fn solid_rows_emit_one_escape() {
        let c = Color::new(10, 20, 30);
        let frame = grid(5, 4, &[c; 20]);
        let out = encode(&frame, Color::BLACK);

        let row = "\x1b[48;2;10;20;30m     \x1b[0m\n";
        assert_eq!(out, format!("{row}{row}\x1b[0m").as_bytes());
        assert_eq!(count(&out, b"\x1b[38;2;"), 0);
    }

    #[test]
    fn unchanged_cells_emit_bare_glyphs() {
        // top row red/red/red, bottom row blue/blue/green
        let green = Color::new(0, 255, 0);
        let frame = grid(3, 2, &[RED, RED, RED, BLUE, BLUE, green]);
        let out = encode(&frame, Color::BLACK);
        assert_eq!(
            out,
            "\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m▀▀\x1b[48;2;0;255;0m▀\x1b[0m\n\x1b[0m".as_bytes()
        );
    }

    #[test]
    fn space_keeps_foreground_state() {
        // column 0: red/blue, column 1: blue/blue (space), column 2: red/blue
        let frame = grid(3, 2, &[RED, BLUE, RED, BLUE, BLUE, BLUE]);
        let out = encode(&frame, Color::BLACK);
        assert_eq!(
            out,
            "\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m▀ ▀\x1b[0m\n\x1b[0m".as_bytes()
        );
    }

    #[test]
    fn each_row_starts_fresh() {
        // both rows are red over blue; the second must re-emit its escapes
        let frame = grid(1, 4, &[RED, BLUE, RED, BLUE]);
        let out = encode(&frame, Color::BLACK);
        let row = "\x1b[38;2;255;0;0m\x1b[48;2;0;0;255m▀\x1b[0m\n";
        assert_eq!(out, format!("{row}{row}\x1b[0m").as_bytes());
    }

    #[test]
    fn odd_height_bottom_uses_background() {
        let bg = Color::new(12, 12, 12);
        let frame = grid(2, 1, &[RED, bg]);
        let out = encode(&frame, bg);
        assert_eq!(
            out,
            "\x1b[38;2;255;0;0m\x1b[48;2;12;12;12m▀ \x1b[0m\n\x1b[0m".as_bytes()
        );
    }

    #[test]
    fn transparent_pixels_show_background() {
        let bg = Color::new(1, 2, 3);
        let pixels = [RawPixel { r: 200, g: 100, b: 50, a: 0 }; 2];
        let frame = Frame::from_pixels(1, 2, &pixels).unwrap();
        let out = encode(&frame, bg);
        assert_eq!(out, "\x1b[48;2;1;2;3m \x1b[0m\n\x1b[0m".as_bytes());
    }

    #[test]
    fn downscaled_frame_averages_blocks() {
        // 4x4 source forced to scale 2 by a 2x1 terminal
        let mut colors = vec![Color::BLACK; 16];
        for (i, c) in colors.iter_mut().enumerate() {
            if i < 8 {
                *c = Color::new(100, 100, 100);
            } else {
                *c = Color::new(0, 0, 200);
            }
        }
        let frame = grid(4, 4, &colors);
        let scaled = resolve_scale(4, 4, TerminalGeometry::new(2, 1)).unwrap();
        assert_eq!(scaled, Scaled { scale: 2, columns: 2, rows: 1 });

        let mut buf = Vec::new();
        encode_frame(&frame, &scaled, Color::BLACK, &mut buf);
        assert_eq!(
            buf,
            "\x1b[38;2;100;100;100m\x1b[48;2;0;0;200m▀▀\x1b[0m\n\x1b[0m".as_bytes()
        );
    }

    #[test]
    fn at_home_prefixes_cursor_move() {
        let frame = grid(1, 2, &[RED, BLUE]);
        let scaled = resolve_scale(1, 2, TerminalGeometry::FALLBACK).unwrap();
        let mut buf = Vec::new();
        let n = encode_frame_at_home(&frame, &scaled, Color::BLACK, &mut buf);
        assert_eq!(n, buf.len());
        assert!(buf.starts_with(b"\x1b[1;1H\x1b[38;2;255;0;0m"));
    }

    proptest! {
        #[test]
        fn encoding_is_deterministic(
            (w, h, data) in (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), (w * h * 4) as usize))
            }),
            bg in any::<(u8, u8, u8)>(),
        ) {
            let frame = Frame::new(w, h, crate::color::PixelLayout::Rgba, data).unwrap();
            let bg = Color::new(bg.0, bg.1, bg.2);
            let scaled = resolve_scale(w, h, TerminalGeometry::new(5, 3)).unwrap();

            let mut first = Vec::new();
            let mut second = Vec::new();
            encode_frame(&frame, &scaled, bg, &mut first);
            encode_frame(&frame, &scaled, bg, &mut second);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(count(&first, b"\n"), scaled.rows as usize);
            prop_assert!(first.ends_with(b"\x1b[0m\n\x1b[0m"));
        }
    }
}
