use serde::{Deserialize, Serialize};

/// Tunables for a page and its behaviors. The defaults reproduce the
/// shipped site wiring; tests override single fields as needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Document URL the page was loaded from.
    pub url: String,
    /// Filename assumed when the URL path ends in a directory.
    pub home_filename: String,
    /// Viewport width consulted once at load for the mobile menu.
    pub viewport_width: i64,
    /// Scroll offset above which the back-to-top button shows.
    pub scroll_threshold: i64,
    /// Widest viewport that still gets the mobile menu toggle.
    pub menu_breakpoint: i64,
    /// Minimum accepted feedback message length, in characters.
    pub min_message_chars: usize,
    /// Delay before a successful submission resets the form.
    pub reset_delay_ms: i64,
    /// Storage key holding the serialized feedback list.
    pub storage_key: String,
    /// Lightbox caption used when a thumbnail has no alt text.
    pub default_caption: String,
    /// Unix milliseconds corresponding to the virtual clock's zero.
    pub time_origin_ms: i64,
    /// Recipient for the optional mailto hand-off after a valid
    /// submission. Off by default.
    pub mailto: Option<String>,
    /// Mail subject used when the form's subject field is empty.
    pub mailto_subject: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost/index.html".to_string(),
            home_filename: "index.html".to_string(),
            viewport_width: 1280,
            scroll_threshold: 300,
            menu_breakpoint: 768,
            min_message_chars: 10,
            reset_delay_ms: 3000,
            storage_key: "feedbackList".to_string(),
            default_caption: "Monument Image".to_string(),
            time_origin_ms: 0,
            mailto: None,
            mailto_subject: "Website feedback".to_string(),
        }
    }
}
