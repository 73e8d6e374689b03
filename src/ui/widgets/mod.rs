pub mod card;
pub mod image;
pub mod popup;

pub use self::card::{CardState, card_height, create_card};
pub use self::image::render_image_widget;
pub use self::popup::{render_config_warnings_popup, render_viewer_popup};
