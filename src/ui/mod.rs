pub mod gallery;
pub mod renderer;
pub mod utils;
pub mod widgets;

pub use renderer::render;

/// Percentage of the terminal width given to the card gallery
const GALLERY_PANE_PERCENT: u16 = 65;

/// Columns of the gallery pane in a terminal `total_cols` wide
pub fn grid_pane_width(total_cols: u16) -> u16 {
    (u32::from(total_cols) * u32::from(GALLERY_PANE_PERCENT) / 100) as u16
}
