//! Column layout helpers for the terminal tables.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Marks text cut by [`truncate_to_width`]
pub const ELLIPSIS: &str = "\u{2026}";

/// Display width in terminal cells. Control characters take no space.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_display_width).sum()
}

/// Truncate to at most `max_cells` cells, ending in `…` when anything was cut.
/// Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    // one cell for the ellipsis
    let budget = max_cells - 1;
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = grapheme_display_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Truncate, then right-pad with spaces to exactly `cells` cells
pub fn fit_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}

/// Width of the widest string, or `min` if they are all narrower
pub fn column_width<'a>(values: impl IntoIterator<Item = &'a str>, min: usize) -> usize {
    values.into_iter().map(display_width).fold(min, usize::max)
}

fn grapheme_display_width(g: &str) -> usize {
    if g.chars().all(char::is_control) {
        return 0;
    }
    UnicodeWidthStr::width(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_of_wide_and_combining_text() {
        assert_eq!(display_width("Lab"), 3);
        assert_eq!(display_width("试验"), 4);
        assert_eq!(display_width("cafe\u{0301}"), 4);
        assert_eq!(display_width("a\nb"), 2);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_to_width("Exam", 10), "Exam");
        assert_eq!(truncate_to_width("Exam", 4), "Exam");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Physics lab report", 8), "Physics\u{2026}");
        assert_eq!(truncate_to_width("Physics", 1), "\u{2026}");
        assert_eq!(truncate_to_width("Physics", 0), "");
    }

    #[test]
    fn truncate_respects_wide_graphemes() {
        // budget of 4 cells fits two wide characters, not three
        assert_eq!(truncate_to_width("试验报告", 5), "试验\u{2026}");
        let cut = truncate_to_width("试验报告", 4);
        assert!(display_width(&cut) <= 4);
    }

    #[test]
    fn fit_pads_and_cuts() {
        assert_eq!(fit_to_width("Lab", 5), "Lab  ");
        assert_eq!(fit_to_width("Assignment", 5), "Assi\u{2026}");
        assert_eq!(display_width(&fit_to_width("试", 5)), 5);
    }

    #[test]
    fn column_width_has_floor() {
        assert_eq!(column_width(["a", "abcd"], 2), 4);
        assert_eq!(column_width(Vec::<&str>::new(), 5), 5);
    }
}
