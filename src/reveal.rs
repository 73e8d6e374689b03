//! Per-asset reveal state for sensitive images, with bounded load retry.

use reqwest::Url;

/// Reload attempts after the first failure before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Query parameter appended to force a fresh fetch
pub const CACHE_BUST_PARAM: &str = "_retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Thumbnail blurred
    Hidden,
    /// Thumbnail shown in the clear
    Revealed,
    /// Full viewer open on top of a still-blurred thumbnail
    Viewing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed,
}

/// What the caller should do after a load error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadAction {
    Retry { url: String, attempt: u32 },
    ShowPlaceholder,
}

#[derive(Debug, Clone)]
pub struct RevealGate {
    source: String,
    sensitive: bool,
    phase: RevealPhase,
    load: LoadState,
    retry_count: u32,
    max_retries: u32,
    current_url: String,
}

impl RevealGate {
    pub fn new(source: impl Into<String>, sensitive: bool) -> Self {
        Self::with_max_retries(source, sensitive, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(source: impl Into<String>, sensitive: bool, max_retries: u32) -> Self {
        let source = source.into();
        Self {
            current_url: source.clone(),
            source,
            sensitive,
            phase: initial_phase(sensitive),
            load: LoadState::Loading,
            retry_count: 0,
            max_retries,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// URL to request right now, cache-busted while retrying
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Whether the inline thumbnail must be drawn blurred
    pub fn is_blurred(&self) -> bool {
        self.sensitive && self.phase != RevealPhase::Revealed
    }

    pub fn is_viewing(&self) -> bool {
        self.phase == RevealPhase::Viewing
    }

    /// Reveal a hidden thumbnail. No effect in any other phase.
    pub fn click(&mut self) {
        if self.phase == RevealPhase::Hidden {
            self.phase = RevealPhase::Revealed;
        }
    }

    pub fn open_viewer(&mut self) {
        self.phase = RevealPhase::Viewing;
    }

    /// Close the viewer. Sensitive content goes back to hidden.
    pub fn dismiss_viewer(&mut self) {
        if self.phase == RevealPhase::Viewing {
            self.phase = initial_phase(self.sensitive);
        }
    }

    /// Re-hide a sensitive thumbnail
    pub fn hide(&mut self) {
        if self.sensitive {
            self.phase = RevealPhase::Hidden;
        }
    }

    pub fn on_load_success(&mut self) {
        self.load = LoadState::Loaded;
        self.retry_count = 0;
    }

    pub fn on_load_error(&mut self) -> LoadAction {
        if self.retry_count < self.max_retries {
            self.retry_count += 1;
            self.load = LoadState::Loading;
            self.current_url = cache_busted(&self.source, self.retry_count);
            log::debug!(
                "Retrying image load ({}/{}): {}",
                self.retry_count,
                self.max_retries,
                self.source
            );
            LoadAction::Retry {
                url: self.current_url.clone(),
                attempt: self.retry_count,
            }
        } else {
            log::warn!("Giving up on image after {} retries: {}", self.retry_count, self.source);
            self.load = LoadState::Failed;
            LoadAction::ShowPlaceholder
        }
    }

    /// Point the gate at another asset. A different source resets all state.
    pub fn set_source(&mut self, source: &str, sensitive: bool) {
        if source == self.source && sensitive == self.sensitive {
            return;
        }
        *self = Self::with_max_retries(source, sensitive, self.max_retries);
    }
}

fn initial_phase(sensitive: bool) -> RevealPhase {
    if sensitive {
        RevealPhase::Hidden
    } else {
        RevealPhase::Revealed
    }
}

/// `url` with a retry marker that defeats intermediate caches
pub fn cache_busted(url: &str, attempt: u32) -> String {
    let stamp = format!("{}-{}", attempt, chrono::Utc::now().timestamp_millis());
    match Url::parse(url) {
        Ok(mut parsed) => {
            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k != CACHE_BUST_PARAM)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            parsed
                .query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair(CACHE_BUST_PARAM, &stamp);
            parsed.to_string()
        }
        Err(_) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}={}", url, separator, CACHE_BUST_PARAM, stamp)
        }
    }
}
