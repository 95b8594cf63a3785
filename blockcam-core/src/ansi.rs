use crate::color::Color;

/// Upper half block: foreground paints the top half, background the bottom.
pub const HALF_BLOCK: &str = "▀";
pub const RESET: &[u8] = b"\x1b[0m";
pub const CURSOR_HOME: &[u8] = b"\x1b[1;1H";

pub fn write_fg(buf: &mut Vec<u8>, c: Color) {
    buf.extend_from_slice(b"\x1b[38;2;");
    write_rgb(buf, c);
}

pub fn write_bg(buf: &mut Vec<u8>, c: Color) {
    buf.extend_from_slice(b"\x1b[48;2;");
    write_rgb(buf, c);
}

fn write_rgb(buf: &mut Vec<u8>, c: Color) {
    write_u8(buf, c.r);
    buf.push(b';');
    write_u8(buf, c.g);
    buf.push(b';');
    write_u8(buf, c.b);
    buf.push(b'm');
}

/// Fast integer-to-ASCII for u8 values (0-255), no allocation.
fn write_u8(buf: &mut Vec<u8>, v: u8) {
    if v >= 100 {
        buf.push(b'0' + v / 100);
        buf.push(b'0' + (v / 10) % 10);
        buf.push(b'0' + v % 10);
    } else if v >= 10 {
        buf.push(b'0' + v / 10);
        buf.push(b'0' + v % 10);
    } else {
        buf.push(b'0' + v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgr_sequences() {
        let mut buf = Vec::new();
        write_fg(&mut buf, Color::new(255, 0, 9));
        write_bg(&mut buf, Color::new(10, 99, 100));
        assert_eq!(buf, b"\x1b[38;2;255;0;9m\x1b[48;2;10;99;100m");
    }

    #[test]
    fn half_block_is_three_bytes() {
        assert_eq!(HALF_BLOCK.as_bytes(), &[0xE2, 0x96, 0x80]);
    }
}
