//! Placement of cards inside the gallery pane.

use ratatui::layout::Rect;

use crate::layout::{grid, masonry};

/// Where one card is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub index: usize,
    pub area: Rect,
}

/// Split `area` into `columns` strips, the last one taking the remainder
pub fn column_strips(area: Rect, columns: usize) -> Vec<(u16, u16)> {
    let columns = columns.max(1) as u16;
    let width = area.width / columns;
    (0..columns)
        .map(|c| {
            let x = area.x + c * width;
            let w = if c + 1 == columns {
                area.width - c * width
            } else {
                width
            };
            (x, w)
        })
        .collect()
}

/// Row-major grid. Each row is as tall as its tallest card and rows are
/// scrolled so the cursor's row is fully visible.
pub fn grid_slots(area: Rect, heights: &[u16], columns: usize, cursor: usize) -> Vec<CardSlot> {
    if heights.is_empty() {
        return Vec::new();
    }
    let placed = grid(heights.len(), columns);
    let strips = column_strips(area, placed.len());
    let row_count = placed.first().map(Vec::len).unwrap_or(0);
    let row_heights: Vec<u16> = (0..row_count)
        .map(|row| {
            placed
                .iter()
                .filter_map(|column| column.get(row))
                .map(|&i| heights[i])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let cursor_row = (cursor / placed.len()).min(row_count - 1);
    let mut first_row = 0;
    while first_row < cursor_row
        && row_heights[first_row..=cursor_row].iter().map(|&h| u32::from(h)).sum::<u32>()
            > u32::from(area.height)
    {
        first_row += 1;
    }

    let mut slots = Vec::new();
    let mut y = area.y;
    let bottom = area.y + area.height;
    for (row, &row_height) in row_heights.iter().enumerate().skip(first_row) {
        if y >= bottom {
            break;
        }
        let height = row_height.min(bottom - y);
        for (column, &(x, width)) in placed.iter().zip(&strips) {
            if let Some(&index) = column.get(row) {
                slots.push(CardSlot {
                    index,
                    area: Rect::new(x, y, width, height),
                });
            }
        }
        y += row_height;
    }
    slots
}

/// Masonry columns. The whole pane scrolls by one offset chosen so the
/// cursor's card ends inside the pane; cards cut off at the top are skipped.
pub fn masonry_slots(area: Rect, heights: &[u16], columns: usize, cursor: usize) -> Vec<CardSlot> {
    let placed = masonry(heights, columns);
    let strips = column_strips(area, placed.len());

    // Top offset of every card within its column
    let mut tops = vec![0u32; heights.len()];
    for column in &placed {
        let mut y = 0u32;
        for &index in column {
            tops[index] = y;
            y += u32::from(heights[index]);
        }
    }

    let offset = heights
        .get(cursor)
        .map(|&h| (tops[cursor] + u32::from(h)).saturating_sub(u32::from(area.height)))
        .unwrap_or(0);

    let mut slots = Vec::new();
    for (column, &(x, width)) in placed.iter().zip(&strips) {
        for &index in column {
            let top = tops[index];
            if top < offset {
                continue;
            }
            let y = top - offset;
            if y >= u32::from(area.height) {
                break;
            }
            let height = u32::from(heights[index]).min(u32::from(area.height) - y);
            slots.push(CardSlot {
                index,
                area: Rect::new(x, area.y + y as u16, width, height as u16),
            });
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(slots: &[CardSlot]) -> Vec<usize> {
        slots.iter().map(|s| s.index).collect()
    }

    #[test]
    fn test_column_strips_cover_width() {
        let strips = column_strips(Rect::new(2, 0, 10, 5), 3);
        assert_eq!(strips, vec![(2, 3), (5, 3), (8, 4)]);
    }

    #[test]
    fn test_grid_scrolls_to_cursor_row() {
        let area = Rect::new(0, 0, 20, 10);
        let heights = vec![5; 6];
        // Three rows of two, only two rows fit
        let top = grid_slots(area, &heights, 2, 0);
        assert_eq!(indices(&top), vec![0, 1, 2, 3]);

        let scrolled = grid_slots(area, &heights, 2, 5);
        assert_eq!(indices(&scrolled), vec![2, 3, 4, 5]);
        assert_eq!(scrolled[2].area, Rect::new(0, 5, 10, 5));
    }

    #[test]
    fn test_grid_row_takes_tallest_card() {
        let slots = grid_slots(Rect::new(0, 0, 20, 20), &[4, 6, 4], 2, 0);
        assert_eq!(slots[2].area.y, 6);
    }

    #[test]
    fn test_masonry_offsets_whole_pane() {
        let area = Rect::new(0, 0, 20, 10);
        // Column 0 gets 0, 3 and 4; column 1 gets 1 and 2
        let heights = vec![6, 4, 6, 4, 6];
        let slots = masonry_slots(area, &heights, 2, 0);
        assert_eq!(indices(&slots), vec![0, 3, 1, 2]);
        assert_eq!(slots[1].area, Rect::new(0, 6, 10, 4));

        // Cursor on card 4 (rows 10..16) scrolls by 6
        let scrolled = masonry_slots(area, &heights, 2, 4);
        assert_eq!(indices(&scrolled), vec![3, 4]);
        assert_eq!(scrolled[1].area, Rect::new(0, 4, 10, 6));
    }

    #[test]
    fn test_empty_page_has_no_slots() {
        assert!(grid_slots(Rect::new(0, 0, 10, 10), &[], 3, 0).is_empty());
        assert!(masonry_slots(Rect::new(0, 0, 10, 10), &[], 3, 0).is_empty());
    }
}
