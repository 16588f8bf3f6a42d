//! Text measurement for the standard Helvetica faces
//!
//! Widths come from the Adobe Helvetica AFM in thousandths of an em. The bold
//! face is measured with a flat widening factor, which is close enough for
//! cell fitting.

use crate::document::FontFace;

/// Helvetica advance widths for the printable ASCII range `' '..='~'`.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const DEFAULT_WIDTH: u16 = 556;
const DEGREE_WIDTH: u16 = 400;
const BOLD_WIDENING: f32 = 1.06;

pub const ELLIPSIS: &str = "...";

fn char_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_ASCII[c as usize - ' ' as usize],
        '°' => DEGREE_WIDTH,
        _ => DEFAULT_WIDTH,
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    let width = units as f32 * size / 1000.0;
    match face {
        FontFace::Bold => width * BOLD_WIDENING,
        FontFace::Regular | FontFace::Oblique => width,
    }
}

/// Replace characters the standard fonts cannot show.
///
/// The built-in faces use WinAnsi encoding, so anything outside Latin-1 and
/// every control character becomes `?`. Tabs and newlines become spaces.
pub fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c if c.is_control() => '?',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

/// Break `text` into lines no wider than `max_width`.
///
/// Words longer than a line are split by character. At most `max_lines` lines
/// are returned; when text remains, the last line ends with an ellipsis.
/// `max_lines == 0` means unlimited.
pub fn wrap(text: &str, face: FontFace, size: f32, max_width: f32, max_lines: usize) -> Vec<String> {
    let text = printable(text);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, face, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for c in word.chars() {
            let mut extended = current.clone();
            extended.push(c);
            if text_width(&extended, face, size) > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current.push(c);
            } else {
                current = extended;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    if max_lines > 0 && lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            *last = with_ellipsis(last, face, size, max_width);
        }
    }

    lines
}

/// Shorten `text` until it fits with a trailing ellipsis.
pub fn with_ellipsis(text: &str, face: FontFace, size: f32, max_width: f32) -> String {
    let mut kept: String = text.trim_end().to_string();
    loop {
        let candidate = format!("{kept}{ELLIPSIS}");
        if kept.is_empty() || text_width(&candidate, face, size) <= max_width {
            return candidate;
        }
        kept.pop();
        kept = kept.trim_end().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        // "Pump" = 667 + 556 + 833 + 556
        assert!((text_width("Pump", FontFace::Regular, 10.0) - 26.12).abs() < 1e-3);
        assert!(text_width("Pump", FontFace::Bold, 10.0) > text_width("Pump", FontFace::Regular, 10.0));
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap("Pump", FontFace::Regular, 9.0, 100.0, 3), vec!["Pump"]);
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(wrap("", FontFace::Regular, 9.0, 100.0, 3), vec![String::new()]);
    }

    #[test]
    fn test_wraps_on_word_boundaries() {
        let lines = wrap("Heat Exchanger Unit", FontFace::Regular, 10.0, 70.0, 0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FontFace::Regular, 10.0) <= 70.0);
        }
        assert_eq!(lines.join(" "), "Heat Exchanger Unit");
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "X".repeat(200);
        let lines = wrap(&word, FontFace::Regular, 10.0, 50.0, 0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_overflow_is_truncated_with_ellipsis() {
        let text = "word ".repeat(100);
        let lines = wrap(&text, FontFace::Regular, 10.0, 60.0, 3);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with(ELLIPSIS));
        assert!(text_width(&lines[2], FontFace::Regular, 10.0) <= 60.0);
    }

    #[test]
    fn test_printable_replaces_unsupported_characters() {
        assert_eq!(printable("25 °C"), "25 °C");
        assert_eq!(printable("a\tb\u{7}c"), "a b?c");
        assert_eq!(printable("泵"), "?");
    }
}
