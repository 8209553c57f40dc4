//! Tile index annotation
//!
//! Verbose manifolds stamp each tile with its sample index so a pose can be
//! traced back to its grid cell. The digits come from an embedded 3x5 pixel
//! table, a fixed configuration blob in the same spirit as the shader text;
//! nothing here depends on a font ecosystem.

use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const MARGIN: u32 = 1;

/// One row per scanline, top first; the low 3 bits of each row are pixels.
const DIGITS: [[u8; GLYPH_HEIGHT as usize]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b001, 0b001], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Stamp `index` in black at the top-left corner of `tile`.
pub fn draw_index(tile: &mut RgbImage, index: usize) {
    for (position, digit) in index.to_string().bytes().enumerate() {
        let glyph = &DIGITS[(digit - b'0') as usize];
        let origin_x = MARGIN + position as u32 * (GLYPH_WIDTH + 1);

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits >> (GLYPH_WIDTH - 1 - col) & 1 == 0 {
                    continue;
                }
                let px = origin_x + col;
                let py = MARGIN + row as u32;
                if px < tile.width() && py < tile.height() {
                    tile.put_pixel(px, py, Rgb([0, 0, 0]));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn white_tile(size: u32) -> RgbImage {
        RgbImage::from_pixel(size, size, WHITE)
    }

    #[test]
    fn stamps_black_pixels_inside_the_glyph_box() {
        let mut tile = white_tile(16);
        draw_index(&mut tile, 0);

        let stamped = tile.pixels().filter(|p| **p == Rgb([0, 0, 0])).count();
        // The zero glyph is a ring of 12 set bits.
        assert_eq!(stamped, 12);
    }

    #[test]
    fn leaves_pixels_outside_the_glyph_box_untouched() {
        let mut tile = white_tile(16);
        draw_index(&mut tile, 8);

        for (x, y, pixel) in tile.enumerate_pixels() {
            let inside = x >= MARGIN
                && x < MARGIN + GLYPH_WIDTH
                && y >= MARGIN
                && y < MARGIN + GLYPH_HEIGHT;
            if !inside {
                assert_eq!(*pixel, WHITE, "pixel at {x}, {y} changed");
            }
        }
    }

    #[test]
    fn multi_digit_indices_advance_one_cell_per_digit() {
        let mut tile = white_tile(16);
        draw_index(&mut tile, 11);

        let second_origin = MARGIN + GLYPH_WIDTH + 1;
        assert_eq!(*tile.get_pixel(second_origin + 1, MARGIN), Rgb([0, 0, 0]));
    }

    #[test]
    fn clips_against_tiny_tiles() {
        let mut tile = white_tile(2);
        // Must not panic even though the glyph does not fit.
        draw_index(&mut tile, 255);
    }
}
