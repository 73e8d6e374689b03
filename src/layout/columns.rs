//! Viewport width to column count.

/// Upper bounds (exclusive, in pixels) of each tier and its column count
pub const COLUMN_BREAKPOINTS: [(u32, usize); 4] = [(576, 1), (768, 2), (992, 3), (1600, 4)];

/// Column count at and above the last breakpoint
pub const MAX_COLUMNS: usize = 5;

/// Columns for a viewport `width_px` wide showing `item_count` items.
///
/// Never more columns than items, and never fewer than one.
pub fn columns(width_px: u32, item_count: usize) -> usize {
    let tier = COLUMN_BREAKPOINTS
        .iter()
        .find(|(limit, _)| width_px < *limit)
        .map(|(_, cols)| *cols)
        .unwrap_or(MAX_COLUMNS);
    tier.min(item_count.max(1))
}

/// Pixel width of a terminal that is `cols` cells wide
pub fn terminal_width_px(cols: u16, cell_width_px: u16) -> u32 {
    u32::from(cols) * u32::from(cell_width_px.max(1))
}

/// Assign items to columns, each item going to the currently shortest one.
///
/// Returns item indices per column, in insertion order. Ties go to the
/// leftmost column.
pub fn masonry(heights: &[u16], column_count: usize) -> Vec<Vec<usize>> {
    let column_count = column_count.max(1);
    let mut placed = vec![Vec::new(); column_count];
    let mut filled = vec![0u32; column_count];
    for (index, height) in heights.iter().enumerate() {
        let (target, _) = filled
            .iter()
            .enumerate()
            .min_by_key(|(i, h)| (**h, *i))
            .unwrap_or((0, &0));
        placed[target].push(index);
        filled[target] += u32::from(*height);
    }
    placed
}

/// Row-major assignment for uniform cards
pub fn grid(item_count: usize, column_count: usize) -> Vec<Vec<usize>> {
    let column_count = column_count.max(1);
    let mut placed = vec![Vec::new(); column_count];
    for index in 0..item_count {
        placed[index % column_count].push(index);
    }
    placed
}
