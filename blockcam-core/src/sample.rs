use crate::color::{Color, Frame, RawPixel};

/// Box-filter average of the `scale` x `scale` block whose top-left corner is
/// `(x, y)`. Pixels outside the frame are skipped, not treated as zero.
///
/// `(x, y)` itself must lie inside the frame.
pub fn sample_box(frame: &Frame, x: u32, y: u32, scale: u32) -> RawPixel {
    let x_end = x.saturating_add(scale).min(frame.width());
    let y_end = y.saturating_add(scale).min(frame.height());

    let (mut r, mut g, mut b, mut a) = (0u64, 0u64, 0u64, 0u64);
    let mut count = 0u64;
    for py in y..y_end {
        for px in x..x_end {
            let p = frame.pixel(px, py);
            r += p.r as u64;
            g += p.g as u64;
            b += p.b as u64;
            a += p.a as u64;
            count += 1;
        }
    }
    debug_assert!(count > 0, "sample origin ({x}, {y}) outside frame");
    let count = count.max(1);

    RawPixel {
        r: (r / count) as u8,
        g: (g / count) as u8,
        b: (b / count) as u8,
        a: (a / count) as u8,
    }
}

/// "Over" blend of `pixel` onto an opaque `bg`, truncating toward zero.
pub fn composite(pixel: RawPixel, bg: Color) -> Color {
    let blend = |c: u8, bg: u8| -> u8 {
        let c = c as i32;
        let a = pixel.a as i32;
        (c + ((255 - a) * (bg as i32 - c)) / 255) as u8
    };
    Color::new(blend(pixel.r, bg.r), blend(pixel.g, bg.g), blend(pixel.b, bg.b))
}

/// Averages a source block and flattens it onto `bg`.
#[inline]
pub fn sample(frame: &Frame, x: u32, y: u32, scale: u32, bg: Color) -> Color {
    composite(sample_box(frame, x, y, scale), bg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PixelLayout;
    use proptest::prelude::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> RawPixel {
        RawPixel { r, g, b, a }
    }

    #[test]
    fn averages_whole_box() {
        let frame = Frame::from_pixels(
            2,
            2,
            &[px(0, 0, 0, 255), px(100, 0, 0, 255), px(0, 200, 0, 255), px(0, 0, 40, 255)],
        )
        .unwrap();
        assert_eq!(sample_box(&frame, 0, 0, 2), px(25, 50, 10, 255));
    }

    #[test]
    fn edge_boxes_skip_missing_pixels() {
        // 3x3 frame, scale 2: the box at (2, 2) only covers one pixel
        let mut pixels = vec![px(0, 0, 0, 255); 9];
        pixels[8] = px(90, 60, 30, 255);
        let frame = Frame::from_pixels(3, 3, &pixels).unwrap();
        assert_eq!(sample_box(&frame, 2, 2, 2), px(90, 60, 30, 255));

        // the box at (2, 0) covers (2, 0) and (2, 1)
        let mut pixels = vec![px(0, 0, 0, 255); 9];
        pixels[2] = px(100, 0, 0, 255);
        pixels[5] = px(50, 0, 0, 255);
        let frame = Frame::from_pixels(3, 3, &pixels).unwrap();
        assert_eq!(sample_box(&frame, 2, 0, 2).r, 75);
    }

    #[test]
    fn half_transparent_blends_toward_background() {
        let bg = Color::new(200, 200, 200);
        let c = composite(px(0, 100, 200, 128), bg);
        // 0 + 127 * 200 / 255 = 99; 100 + 127 * 100 / 255 = 149
        assert_eq!(c, Color::new(99, 149, 200));
    }

    #[test]
    fn rgb_frames_sample_opaque() {
        let frame = Frame::new(1, 1, PixelLayout::Rgb, vec![7, 8, 9]).unwrap();
        assert_eq!(sample(&frame, 0, 0, 4, Color::new(255, 255, 255)), Color::new(7, 8, 9));
    }

    proptest! {
        #[test]
        fn transparent_is_background(r: u8, g: u8, b: u8, br: u8, bgc: u8, bb: u8) {
            let bg = Color::new(br, bgc, bb);
            prop_assert_eq!(composite(px(r, g, b, 0), bg), bg);
        }

        #[test]
        fn opaque_is_unchanged(r: u8, g: u8, b: u8, br: u8, bgc: u8, bb: u8) {
            let bg = Color::new(br, bgc, bb);
            prop_assert_eq!(composite(px(r, g, b, 255), bg), Color::new(r, g, b));
        }
    }
}
