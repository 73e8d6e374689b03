//! Responsive column layout under resize pressure.

pub mod columns;
pub mod debounce;

use std::time::Duration;

pub use columns::{columns, grid, masonry, terminal_width_px};
pub use debounce::Debouncer;

/// Column count that follows the viewport through a debouncer.
///
/// Width changes are applied after the quiet period; item-count changes
/// are applied immediately against the last applied width.
#[derive(Debug)]
pub struct ResponsiveColumns {
    debouncer: Debouncer<u32>,
    width_px: u32,
    item_count: usize,
    columns: usize,
}

impl ResponsiveColumns {
    pub fn new(width_px: u32, item_count: usize, delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            width_px,
            item_count,
            columns: columns(width_px, item_count),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    /// Record a resize; takes effect on a later `poll`
    pub fn on_resize(&mut self, width_px: u32) {
        self.debouncer.schedule(width_px);
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.columns = columns(self.width_px, item_count);
    }

    /// Apply a settled resize. Returns the new count if it changed.
    pub fn poll(&mut self) -> Option<usize> {
        let width_px = self.debouncer.poll()?;
        self.width_px = width_px;
        let next = columns(width_px, self.item_count);
        if next == self.columns {
            return None;
        }
        log::debug!("Layout: {}px -> {} columns", width_px, next);
        self.columns = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_resize_burst_recomputes_once() {
        let mut layout = ResponsiveColumns::new(500, 30, Duration::from_millis(150));
        assert_eq!(layout.columns(), 1);

        for width in [600, 800, 1000, 1700] {
            layout.on_resize(width);
            tokio::time::advance(Duration::from_millis(50)).await;
            assert_eq!(layout.poll(), None);
        }

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(layout.poll(), Some(5));
        assert_eq!(layout.width_px(), 1700);
        assert_eq!(layout.poll(), None);
    }

    #[test]
    fn test_item_count_applies_immediately() {
        let mut layout = ResponsiveColumns::new(1700, 30, Duration::from_millis(150));
        assert_eq!(layout.columns(), 5);
        layout.set_item_count(2);
        assert_eq!(layout.columns(), 2);
        layout.set_item_count(0);
        assert_eq!(layout.columns(), 1);
    }
}
