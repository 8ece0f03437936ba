//! 3x5 bitmap font covering printable ASCII, plus word wrapping for HUD panels.

use super::write_pixel_rgba_clipped;

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 2;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 2) * TEXT_SCALE;

const FIRST_GLYPH: u32 = 0x20;

#[rustfmt::skip]
const ASCII_GLYPHS: [[u8; GLYPH_HEIGHT as usize]; 95] = [
    [0b000, 0b000, 0b000, 0b000, 0b000], // space
    [0b010, 0b010, 0b010, 0b000, 0b010], // !
    [0b101, 0b101, 0b000, 0b000, 0b000], // "
    [0b101, 0b111, 0b101, 0b111, 0b101], // #
    [0b111, 0b110, 0b111, 0b011, 0b111], // $
    [0b101, 0b001, 0b010, 0b100, 0b101], // %
    [0b010, 0b101, 0b010, 0b101, 0b011], // &
    [0b010, 0b010, 0b000, 0b000, 0b000], // '
    [0b001, 0b010, 0b010, 0b010, 0b001], // (
    [0b100, 0b010, 0b010, 0b010, 0b100], // )
    [0b000, 0b101, 0b010, 0b101, 0b000], // *
    [0b000, 0b010, 0b111, 0b010, 0b000], // +
    [0b000, 0b000, 0b000, 0b010, 0b100], // ,
    [0b000, 0b000, 0b111, 0b000, 0b000], // -
    [0b000, 0b000, 0b000, 0b000, 0b010], // .
    [0b001, 0b001, 0b010, 0b100, 0b100], // /
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
    [0b000, 0b010, 0b000, 0b010, 0b000], // :
    [0b000, 0b010, 0b000, 0b010, 0b100], // ;
    [0b001, 0b010, 0b100, 0b010, 0b001], // <
    [0b000, 0b111, 0b000, 0b111, 0b000], // =
    [0b100, 0b010, 0b001, 0b010, 0b100], // >
    [0b111, 0b001, 0b011, 0b000, 0b010], // ?
    [0b111, 0b101, 0b111, 0b100, 0b111], // @
    [0b010, 0b101, 0b111, 0b101, 0b101], // A
    [0b110, 0b101, 0b110, 0b101, 0b110], // B
    [0b111, 0b100, 0b100, 0b100, 0b111], // C
    [0b110, 0b101, 0b101, 0b101, 0b110], // D
    [0b111, 0b100, 0b110, 0b100, 0b111], // E
    [0b111, 0b100, 0b110, 0b100, 0b100], // F
    [0b111, 0b100, 0b101, 0b101, 0b111], // G
    [0b101, 0b101, 0b111, 0b101, 0b101], // H
    [0b111, 0b010, 0b010, 0b010, 0b111], // I
    [0b111, 0b001, 0b001, 0b101, 0b111], // J
    [0b101, 0b101, 0b110, 0b101, 0b101], // K
    [0b100, 0b100, 0b100, 0b100, 0b111], // L
    [0b101, 0b111, 0b111, 0b101, 0b101], // M
    [0b101, 0b111, 0b111, 0b111, 0b101], // N
    [0b111, 0b101, 0b101, 0b101, 0b111], // O
    [0b110, 0b101, 0b110, 0b100, 0b100], // P
    [0b111, 0b101, 0b101, 0b111, 0b001], // Q
    [0b110, 0b101, 0b110, 0b101, 0b101], // R
    [0b111, 0b100, 0b111, 0b001, 0b111], // S
    [0b111, 0b010, 0b010, 0b010, 0b010], // T
    [0b101, 0b101, 0b101, 0b101, 0b111], // U
    [0b101, 0b101, 0b101, 0b101, 0b010], // V
    [0b101, 0b101, 0b111, 0b111, 0b101], // W
    [0b101, 0b101, 0b010, 0b101, 0b101], // X
    [0b101, 0b101, 0b010, 0b010, 0b010], // Y
    [0b111, 0b001, 0b010, 0b100, 0b111], // Z
    [0b110, 0b100, 0b100, 0b100, 0b110], // [
    [0b100, 0b100, 0b010, 0b001, 0b001], // \
    [0b011, 0b001, 0b001, 0b001, 0b011], // ]
    [0b010, 0b101, 0b000, 0b000, 0b000], // ^
    [0b000, 0b000, 0b000, 0b000, 0b111], // _
    [0b100, 0b010, 0b000, 0b000, 0b000], // `
    [0b000, 0b111, 0b001, 0b111, 0b111], // a
    [0b100, 0b100, 0b110, 0b101, 0b110], // b
    [0b000, 0b111, 0b100, 0b100, 0b111], // c
    [0b001, 0b001, 0b111, 0b101, 0b111], // d
    [0b000, 0b111, 0b110, 0b100, 0b111], // e
    [0b011, 0b100, 0b110, 0b100, 0b100], // f
    [0b000, 0b111, 0b101, 0b111, 0b001], // g
    [0b100, 0b100, 0b110, 0b101, 0b101], // h
    [0b010, 0b000, 0b010, 0b010, 0b010], // i
    [0b001, 0b000, 0b001, 0b101, 0b010], // j
    [0b100, 0b101, 0b110, 0b101, 0b101], // k
    [0b100, 0b100, 0b100, 0b100, 0b111], // l
    [0b000, 0b110, 0b111, 0b101, 0b101], // m
    [0b000, 0b110, 0b101, 0b101, 0b101], // n
    [0b000, 0b111, 0b101, 0b101, 0b111], // o
    [0b000, 0b110, 0b101, 0b110, 0b100], // p
    [0b000, 0b111, 0b101, 0b111, 0b001], // q
    [0b000, 0b110, 0b101, 0b100, 0b100], // r
    [0b000, 0b111, 0b110, 0b001, 0b111], // s
    [0b010, 0b111, 0b010, 0b010, 0b011], // t
    [0b000, 0b101, 0b101, 0b101, 0b111], // u
    [0b000, 0b101, 0b101, 0b101, 0b010], // v
    [0b000, 0b101, 0b101, 0b111, 0b010], // w
    [0b000, 0b101, 0b010, 0b010, 0b101], // x
    [0b000, 0b101, 0b101, 0b111, 0b001], // y
    [0b000, 0b111, 0b001, 0b010, 0b111], // z
    [0b011, 0b010, 0b110, 0b010, 0b011], // {
    [0b010, 0b010, 0b010, 0b010, 0b010], // |
    [0b110, 0b010, 0b011, 0b010, 0b110], // }
    [0b000, 0b011, 0b110, 0b000, 0b000], // ~
];

pub(crate) fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

/// Maps the handful of typographic symbols used in dialog content onto the ASCII font.
fn ascii_stand_in(ch: char) -> char {
    match ch {
        '\u{25b8}' | '\u{25ba}' | '\u{2192}' => '>',
        '\u{2713}' | '\u{2714}' => '+',
        '\u{27f3}' | '\u{21bb}' => '~',
        '\u{2013}' | '\u{2014}' => '-',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201c}' | '\u{201d}' => '"',
        '\u{e4}' => 'a',
        '\u{f6}' => 'o',
        '\u{fc}' => 'u',
        '\u{df}' => 's',
        other => other,
    }
}

fn glyph_rows(ch: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    let code = u32::from(ascii_stand_in(ch));
    let index = code.checked_sub(FIRST_GLYPH)? as usize;
    ASCII_GLYPHS.get(index).copied()
}

pub(crate) fn draw_text_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }
    for ch in text.chars() {
        if let Some(rows) = glyph_rows(ch) {
            draw_glyph_clipped(frame, width, height, x, y, rows, color);
        }
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rows: [u8; GLYPH_HEIGHT as usize],
    color: [u8; 4],
) {
    for (row_index, row_bits) in rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let glyph_x = x + col * TEXT_SCALE;
            for sy in 0..TEXT_SCALE {
                let pixel_y = glyph_y + sy;
                if pixel_y < 0 || pixel_y >= height as i32 {
                    continue;
                }
                for sx in 0..TEXT_SCALE {
                    let pixel_x = glyph_x + sx;
                    if pixel_x < 0 || pixel_x >= width as i32 {
                        continue;
                    }
                    write_pixel_rgba_clipped(frame, width as usize, pixel_x, pixel_y, color);
                }
            }
        }
    }
}

/// Greedy word wrap. Explicit newlines always break; blank lines are kept.
/// Words longer than `max_chars` are split hard.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0usize;
        for word in paragraph.split(' ') {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line_len == 0 {
                word.len()
            } else {
                line_len + 1 + word.len()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.extend(word.iter());
            line_len += word.len();
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_lookup_covers_ascii_printable_range() {
        for code in 32u8..=126u8 {
            let ch = char::from(code);
            assert!(glyph_rows(ch).is_some(), "missing glyph for '{ch}'");
        }
        assert!(glyph_rows('\u{7f}').is_none());
        assert!(glyph_rows('\u{1f642}').is_none());
    }

    #[test]
    fn dialog_symbols_fall_back_to_ascii() {
        assert_eq!(glyph_rows('\u{25b8}'), glyph_rows('>'));
        assert_eq!(glyph_rows('\u{2713}'), glyph_rows('+'));
        assert_eq!(glyph_rows('\u{2014}'), glyph_rows('-'));
    }

    #[test]
    fn unknown_character_draws_nothing() {
        let mut frame = vec![0u8; 16 * 16 * 4];
        draw_text_clipped(&mut frame, 16, 16, 0, 0, "\u{1f642}", [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn clipped_text_never_writes_out_of_bounds() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_text_clipped(&mut frame, 8, 8, -3, -3, "PC", [255; 4]);
        draw_text_clipped(&mut frame, 8, 8, 64, 64, "TV", [255; 4]);
        assert_eq!(frame.len(), 8 * 8 * 4);

        let mut tiny = vec![0u8; 4];
        draw_text_clipped(&mut tiny, 1, 1, 0, 0, "#", [255; 4]);
        assert_eq!(tiny, vec![255; 4]);
    }

    #[test]
    fn text_width_counts_chars_not_bytes() {
        assert_eq!(text_width_px("abc"), 3 * GLYPH_ADVANCE);
        assert_eq!(text_width_px("\u{25b8} a"), 3 * GLYPH_ADVANCE);
    }

    #[test]
    fn wrap_breaks_on_words_and_newlines() {
        let lines = wrap_text("alpha beta gamma\n\ndelta", 10);
        assert_eq!(lines, vec!["alpha beta", "gamma", "", "delta"]);
    }

    #[test]
    fn wrap_splits_words_longer_than_line() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }
}
