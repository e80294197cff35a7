//! Fixed-width text layout for the 20x4 character display.
//!
//! Every string handed to the device goes through [`fit`], so a line write
//! always covers the whole row and never wraps into the next one.

/// Visible columns per display line.
pub const WIDTH: usize = 20;
/// Physical display lines.
pub const LINES: usize = 4;

/// Map a character to what the single-byte display can show.
fn display_char(c: char) -> char {
    if c.is_ascii() && !c.is_ascii_control() {
        c
    } else if c.is_whitespace() {
        ' '
    } else {
        '?'
    }
}

/// Pad or truncate `text` to exactly `width` display characters.
pub fn fit_to(text: &str, width: usize) -> String {
    let mut out: String = text.chars().map(display_char).take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Pad or truncate `text` to one full display line.
pub fn fit(text: &str) -> String {
    fit_to(text, WIDTH)
}

/// Lay out `prefix + name` on the left and `balance` right-aligned.
///
/// The name keeps its left part when it does not fit; the balance is never
/// truncated.
pub fn balance_cell(prefix: &str, name: &str, balance: u64) -> String {
    let digits = balance.to_string();
    let label_width = WIDTH.saturating_sub(digits.len());
    let mut cell = fit_to(&format!("{}{}", prefix, name), label_width);
    cell.push_str(&digits);
    cell
}

/// Every `WIDTH`-wide window of `text`, left to right.
///
/// Text that fits yields exactly one padded frame.
pub fn scroll_windows(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().map(display_char).collect();
    if chars.len() <= WIDTH {
        return vec![fit(text)];
    }
    chars
        .windows(WIDTH)
        .map(|w| w.iter().collect::<String>())
        .collect()
}
