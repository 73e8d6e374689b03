use std::time::Duration;

use ratatui::DefaultTerminal;
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;

use super::App;
use crate::api::{GalleryApi, HttpGalleryClient};
use crate::app::event_handlers::EventHandlers;
use crate::app::preview::PreviewMessage;
use crate::layout::{ResponsiveColumns, terminal_width_px};

/// Font size assumed when the terminal does not answer the graphics query
const FALLBACK_FONT_SIZE: (u16, u16) = (8, 16);

/// Trait for main application loop
pub trait AppMainLoop {
    async fn run(self, terminal: DefaultTerminal) -> color_eyre::Result<()>
    where
        Self: Sized;
}

impl AppMainLoop for App {
    /// Run the application's main loop.
    async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.running = true;

        // Set up the image picker
        let picker = Picker::from_query_stdio().unwrap_or_else(|e| {
            log::warn!("Terminal graphics query failed, using half blocks: {}", e);
            Picker::from_fontsize(FALLBACK_FONT_SIZE)
        });
        self.preview.set_picker(picker);

        let size = terminal.size()?;
        let width_px = terminal_width_px(crate::ui::grid_pane_width(size.width), self.preview.cell_width());
        self.layout = ResponsiveColumns::new(width_px, 0, self.config.gallery.resize_debounce());
        log::debug!("Grid width {}px, {} column(s)", width_px, self.layout.columns());

        // Channel for preview image loading results
        let (preview_tx, mut preview_rx) = mpsc::channel::<PreviewMessage>(4);

        // Set up signal handlers for graceful shutdown (Unix only)
        #[cfg(unix)]
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
        #[cfg(unix)]
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        log::info!("Entering event-driven main loop");

        while self.running {
            if let Some(force) = self.reload_requested.take() {
                self.reload(force).await;
            }
            self.sync_preview(&preview_tx);

            terminal.draw(|frame| crate::ui::render(frame, &mut self))?;
            self.preview.after_draw();

            tokio::select! {
                // Keyboard events (with short timeout for responsive UI)
                _ = tokio::time::sleep(Duration::from_millis(10)) => {
                    if crossterm::event::poll(Duration::from_millis(0))? {
                        self.handle_crossterm_events().await?;
                    }

                    if let Some(columns) = self.layout.poll() {
                        log::debug!("Column count changed to {}", columns);
                    }
                    self.expire_status();

                    // Deletes made elsewhere ask for the next load to skip the cache
                    if self.reload_requested.is_none() && self.orchestrator.session().refresh_pending() {
                        self.request_reload(false);
                    }
                }

                // Preview loading results
                Some(msg) = preview_rx.recv() => {
                    match msg {
                        PreviewMessage::Loaded { url, result } => {
                            if let Some(retry) = self.preview.on_loaded(&url, result) {
                                log::debug!("Retrying preview with {}", retry);
                                spawn_preview_loader(self.orchestrator.api(), retry, preview_tx.clone());
                            }
                        }
                    }
                }
            }

            // Check for Unix signals outside of select! to avoid conditional compilation issues
            #[cfg(unix)]
            {
                use std::pin::Pin;
                use std::task::Poll;

                let waker = futures::task::noop_waker();
                let mut cx = std::task::Context::from_waker(&waker);

                if let Poll::Ready(Some(())) = Pin::new(&mut sigint).poll_recv(&mut cx) {
                    log::info!("Received SIGINT, shutting down gracefully");
                    self.quit();
                }

                if let Poll::Ready(Some(())) = Pin::new(&mut sigterm).poll_recv(&mut cx) {
                    log::info!("Received SIGTERM, shutting down gracefully");
                    self.quit();
                }
            }
        }

        log::info!("Exiting main loop");
        Ok(())
    }
}

impl App {
    /// Point the preview at the record under the cursor, fetching it if new
    fn sync_preview(&mut self, tx: &mpsc::Sender<PreviewMessage>) {
        let record = self.current_record();
        if let Some(url) = self.preview.show_record(record.as_ref()) {
            spawn_preview_loader(self.orchestrator.api(), url, tx.clone());
        }
    }
}

/// Spawn a background task to fetch a preview image
fn spawn_preview_loader(client: &HttpGalleryClient, url: String, tx: mpsc::Sender<PreviewMessage>) {
    let client = client.clone();

    tokio::spawn(async move {
        let result = client.fetch_url(&url).await;

        // Send result back (ignore error if receiver dropped)
        let _ = tx.send(PreviewMessage::Loaded { url, result }).await;
    });
}
