//! Modal compositor.
//!
//! Splices a modal text block into an already rendered frame, centered in
//! the container. Works purely on the text grid: base rows outside the modal
//! pass through untouched, and rows the base frame does not have are dropped
//! rather than appended.

use super::text::{block_width, display_width, pad_to, slice_columns};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub start_x: usize,
    pub start_y: usize,
    pub width: usize,
    pub height: usize,
}

impl OverlayGeometry {
    pub fn compute(modal: &str, container_width: usize, container_height: usize) -> Self {
        let width = block_width(modal);
        let height = modal.lines().count();
        Self {
            start_x: container_width.saturating_sub(width) / 2,
            start_y: container_height.saturating_sub(height) / 2,
            width,
            height,
        }
    }
}

/// Composite `modal` over `base`, centered in a `width` x `height` container.
pub fn composite(base: &str, modal: &str, width: usize, height: usize) -> String {
    let geometry = OverlayGeometry::compute(modal, width, height);
    // Trailing blank rows are part of the frame.
    let mut rows: Vec<String> = base.split('\n').map(str::to_string).collect();

    for (offset, modal_line) in modal.lines().enumerate() {
        let row = geometry.start_y + offset;
        let Some(base_line) = rows.get_mut(row) else {
            continue;
        };
        *base_line = splice(base_line, modal_line, &geometry);
    }

    rows.join("\n")
}

fn splice(base_line: &str, modal_line: &str, geometry: &OverlayGeometry) -> String {
    let end = geometry.start_x + geometry.width;
    let padded = pad_to(base_line, end);
    let total = display_width(&padded);
    let prefix = slice_columns(&padded, 0, geometry.start_x);
    let suffix = slice_columns(&padded, end, total);
    // Short modal rows are padded so the suffix keeps its column.
    let body = pad_to(modal_line, geometry.width);

    let mut out = String::with_capacity(prefix.len() + body.len() + suffix.len());
    out.push_str(&prefix);
    out.push_str(&body);
    out.push_str(&suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::{composite, OverlayGeometry};
    use crate::ui::text::display_width;

    fn base_frame(rows: usize, width: usize) -> String {
        (0..rows)
            .map(|row| {
                let ch = char::from(b'a' + (row as u8 % 26));
                ch.to_string().repeat(width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn geometry_centers_modal() {
        let modal = "1234\n1234\n1234\n1234";
        let geometry = OverlayGeometry::compute(modal, 20, 10);
        assert_eq!(geometry.start_y, 3);
        assert_eq!(geometry.start_x, 8);
        assert_eq!(geometry.width, 4);
        assert_eq!(geometry.height, 4);
    }

    #[test]
    fn geometry_never_goes_negative() {
        let modal = "0123456789\n0\n0";
        let geometry = OverlayGeometry::compute(modal, 4, 2);
        assert_eq!(geometry.start_x, 0);
        assert_eq!(geometry.start_y, 0);
    }

    #[test]
    fn modal_covers_only_its_rows() {
        let base = base_frame(10, 12);
        let modal = "XXXX\nXXXX\nXXXX\nXXXX";
        let out = composite(&base, modal, 12, 10);
        let base_rows: Vec<&str> = base.lines().collect();
        let out_rows: Vec<&str> = out.lines().collect();
        assert_eq!(out_rows.len(), 10);
        for row in (0..3).chain(7..10) {
            assert_eq!(out_rows[row], base_rows[row]);
        }
        assert_eq!(out_rows[3], "ddddXXXXdddd");
        assert_eq!(out_rows[6], "ggggXXXXgggg");
    }

    #[test]
    fn short_base_lines_are_padded_before_splice() {
        let base = "ab\nab\nab";
        let out = composite(base, "ZZ", 8, 3);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows[0], "ab");
        assert_eq!(rows[1], "ab ZZ");
        assert_eq!(rows[2], "ab");
    }

    #[test]
    fn rows_outside_base_are_dropped() {
        let base = "aaaa\nbbbb";
        let modal = "1\n2\n3\n4\n5\n6";
        let out = composite(base, modal, 4, 10);
        // start_y = 2, past the end of the base frame.
        assert_eq!(out, base);
    }

    #[test]
    fn wide_glyphs_split_by_columns() {
        let base = "日本語日本語";
        let out = composite(base, "XX", 12, 1);
        // start_x = 5 splits the third glyph; the suffix at 7 splits the fourth.
        assert_eq!(out, "日本 XX 本語");
        assert_eq!(display_width(&out), 12);
    }

    #[test]
    fn footprint_is_independent_of_base_outside_it() {
        let modal = "+--+\n|hi|\n+--+";
        let first = base_frame(9, 10);
        let second = base_frame(9, 10).replace('d', "z");
        let out_first = composite(&first, modal, 10, 9);
        let out_second = composite(&second, modal, 10, 9);
        let rows_first: Vec<&str> = out_first.lines().collect();
        let rows_second: Vec<&str> = out_second.lines().collect();
        for row in 3..6 {
            assert_eq!(&rows_first[row][3..7], &rows_second[row][3..7]);
        }
    }

    #[test]
    fn styled_base_keeps_cell_alignment() {
        let base = "\x1b[31mrrrrrrrr\x1b[0m";
        let out = composite(base, "OK", 8, 1);
        assert_eq!(display_width(&out), 8);
        assert!(out.contains("OK"));
    }
}
