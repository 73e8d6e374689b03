//! Preview pane state: which image is shown, its reveal gate, and the
//! terminal image protocols built from it.

use image::DynamicImage;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::api::{ApiError, ApiResult, LogRecord};
use crate::reveal::{LoadAction, RevealGate};

/// Longest edge of the image the blurred thumbnail is computed from
const BLUR_SOURCE_EDGE: u32 = 384;

/// Result of a background image fetch, tagged with the URL that was requested
pub enum PreviewMessage {
    Loaded {
        url: String,
        result: ApiResult<Vec<u8>>,
    },
}

pub struct PreviewState {
    picker: Option<Picker>,
    record_id: Option<i64>,
    gate: Option<RevealGate>,
    image: Option<DynamicImage>,
    pub thumbnail: Option<StatefulProtocol>,
    pub viewer: Option<StatefulProtocol>,
    blur_sigma: f32,
    max_retries: u32,
}

impl PreviewState {
    pub fn new(blur_sigma: f32, max_retries: u32) -> Self {
        Self {
            picker: None,
            record_id: None,
            gate: None,
            image: None,
            thumbnail: None,
            viewer: None,
            blur_sigma,
            max_retries,
        }
    }

    pub fn set_picker(&mut self, mut picker: Picker) {
        picker.set_background_color([0, 0, 0, 0]);
        self.picker = Some(picker);
        self.rebuild_protocols();
    }

    /// Width of one terminal cell in pixels
    pub fn cell_width(&self) -> u16 {
        self.picker.as_ref().map(|p| p.font_size().0).unwrap_or(8)
    }

    pub fn gate(&self) -> Option<&RevealGate> {
        self.gate.as_ref()
    }

    pub fn record_id(&self) -> Option<i64> {
        self.record_id
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Point the pane at `record`. Returns a URL to fetch when the source changed.
    pub fn show_record(&mut self, record: Option<&LogRecord>) -> Option<String> {
        let source = record.and_then(preview_source);
        let (Some(record), Some(source)) = (record, source) else {
            self.clear();
            self.record_id = record.map(|r| r.id);
            return None;
        };

        if let Some(gate) = &self.gate
            && self.record_id == Some(record.id)
            && gate.source() == source
        {
            return None;
        }

        log::debug!("Preview source changed to {}", source);
        self.record_id = Some(record.id);
        self.image = None;
        self.thumbnail = None;
        self.viewer = None;
        let gate = RevealGate::with_max_retries(source, record.is_sensitive, self.max_retries);
        let url = gate.current_url().to_string();
        self.gate = Some(gate);
        Some(url)
    }

    /// Apply a finished fetch. Returns a URL to retry with, if any.
    pub fn on_loaded(&mut self, url: &str, result: ApiResult<Vec<u8>>) -> Option<String> {
        let gate = self.gate.as_mut()?;
        if gate.current_url() != url {
            log::debug!("Dropping stale preview for {}", url);
            return None;
        }

        let decoded = result.and_then(|bytes| {
            image::load_from_memory(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
        });
        match decoded {
            Ok(image) => {
                gate.on_load_success();
                self.image = Some(image);
                self.rebuild_protocols();
                None
            }
            Err(e) => {
                log::debug!("Preview load failed for {}: {}", url, e);
                match gate.on_load_error() {
                    LoadAction::Retry { url, .. } => Some(url),
                    LoadAction::ShowPlaceholder => {
                        self.image = None;
                        self.thumbnail = None;
                        self.viewer = None;
                        None
                    }
                }
            }
        }
    }

    pub fn reveal(&mut self) {
        self.update_gate(RevealGate::click);
    }

    pub fn open_viewer(&mut self) {
        self.update_gate(RevealGate::open_viewer);
    }

    pub fn dismiss_viewer(&mut self) {
        self.update_gate(RevealGate::dismiss_viewer);
    }

    pub fn hide(&mut self) {
        self.update_gate(RevealGate::hide);
    }

    pub fn is_viewing(&self) -> bool {
        self.gate.as_ref().is_some_and(RevealGate::is_viewing)
    }

    /// Surface encoding errors from the last draw
    pub fn after_draw(&mut self) {
        for protocol in [self.thumbnail.as_mut(), self.viewer.as_mut()].into_iter().flatten() {
            if let Some(Err(e)) = protocol.last_encoding_result() {
                log::debug!("Image encoding failed: {}", e);
            }
        }
    }

    fn update_gate(&mut self, change: impl FnOnce(&mut RevealGate)) {
        if let Some(gate) = self.gate.as_mut() {
            let before = (gate.is_blurred(), gate.is_viewing());
            change(gate);
            if before != (gate.is_blurred(), gate.is_viewing()) {
                self.rebuild_protocols();
            }
        }
    }

    fn clear(&mut self) {
        self.gate = None;
        self.image = None;
        self.thumbnail = None;
        self.viewer = None;
    }

    fn rebuild_protocols(&mut self) {
        let (Some(picker), Some(image), Some(gate)) = (&self.picker, &self.image, &self.gate) else {
            return;
        };
        let inline = if gate.is_blurred() {
            image
                .thumbnail(BLUR_SOURCE_EDGE, BLUR_SOURCE_EDGE)
                .blur(self.blur_sigma)
        } else {
            image.clone()
        };
        self.thumbnail = Some(picker.new_resize_protocol(inline));
        self.viewer = gate
            .is_viewing()
            .then(|| picker.new_resize_protocol(image.clone()));
    }
}

/// Image shown for a record: the cover, else the first preview
pub fn preview_source(record: &LogRecord) -> Option<&str> {
    record
        .cover_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .or_else(|| record.preview_urls.first().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::orchestrator::testing::record;
    use crate::reveal::{LoadState, RevealPhase};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(4, 4)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_new_record_requests_its_cover() {
        let mut preview = PreviewState::new(12.0, 2);
        let first = record(1, "a", 0);
        assert_eq!(preview.show_record(Some(&first)).as_deref(), Some("http://cdn.test/1.jpg"));
        assert_eq!(preview.show_record(Some(&first)), None);

        let second = record(2, "b", 0);
        assert_eq!(preview.show_record(Some(&second)).as_deref(), Some("http://cdn.test/2.jpg"));
        assert_eq!(preview.record_id(), Some(2));
    }

    #[test]
    fn test_record_without_images_clears_pane() {
        let mut preview = PreviewState::new(12.0, 2);
        let mut bare = record(1, "a", 0);
        bare.cover_url = None;
        assert_eq!(preview.show_record(Some(&bare)), None);
        assert!(preview.gate().is_none());
    }

    #[test]
    fn test_decoded_image_is_kept() {
        let mut preview = PreviewState::new(12.0, 2);
        let url = preview.show_record(Some(&record(1, "a", 0))).unwrap();
        assert_eq!(preview.on_loaded(&url, Ok(png_bytes())), None);
        assert!(preview.has_image());
        assert_eq!(preview.gate().unwrap().load_state(), LoadState::Loaded);
    }

    #[test]
    fn test_failures_retry_then_give_up() {
        let mut preview = PreviewState::new(12.0, 2);
        let url = preview.show_record(Some(&record(1, "a", 0))).unwrap();

        let retry = preview.on_loaded(&url, Err(ApiError::Timeout)).unwrap();
        assert!(retry.contains("_retry=1-"));
        // Undecodable bytes count as a failure too
        let retry = preview.on_loaded(&retry, Ok(b"not an image".to_vec())).unwrap();
        assert_eq!(preview.on_loaded(&retry, Err(ApiError::Timeout)), None);
        assert_eq!(preview.gate().unwrap().load_state(), LoadState::Failed);
        assert!(!preview.has_image());
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut preview = PreviewState::new(12.0, 2);
        let old = preview.show_record(Some(&record(1, "a", 0))).unwrap();
        preview.show_record(Some(&record(2, "b", 0)));

        assert_eq!(preview.on_loaded(&old, Ok(png_bytes())), None);
        assert!(!preview.has_image());
    }

    #[test]
    fn test_reveal_controls_follow_gate() {
        let mut preview = PreviewState::new(12.0, 2);
        let mut sensitive = record(1, "a", 0);
        sensitive.is_sensitive = true;
        preview.show_record(Some(&sensitive));

        preview.open_viewer();
        assert!(preview.is_viewing());
        preview.dismiss_viewer();
        assert_eq!(preview.gate().unwrap().phase(), RevealPhase::Hidden);

        preview.reveal();
        assert!(!preview.gate().unwrap().is_blurred());
        preview.hide();
        assert!(preview.gate().unwrap().is_blurred());
    }
}
