//! linkpage
//!
//! A link-tree landing page with background-driven theming, plus a headless
//! capture utility that renders the page into a social preview image.
//!
//! # Layout
//!
//! - [`theme`]: average colour of a background image and the primary/accent
//!   pair derived from it
//! - [`style`]: the style variable surface the page reads, held as one
//!   all-or-nothing theme context
//! - [`page`]: the page controller (link bindings, focus order, colour-scheme
//!   preference, background hook)
//! - [`site`]: renders `index.html` from a site config
//! - [`capture`]: load the page in a headless browser and save a screenshot
//!
//! # Example
//!
//! ```no_run
//! use linkpage::capture::{capture_preview, CaptureConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = capture_preview(&CaptureConfig::default())?;
//! println!("{}x{} -> {}", report.width, report.height, report.output.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod page;
pub mod site;
pub mod style;
pub mod theme;

#[cfg(feature = "cdp")]
pub mod cdp;

/// Browser settings for a capture
///
/// Defaults match the preview image: a 1200×630 viewport, JavaScript on,
/// and the Chrome sandbox off (the capture usually runs in containers).
///
/// # Examples
///
/// ```
/// let cfg = linkpage::EngineConfig::default();
/// assert_eq!(cfg.viewport.width, 1200);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent override; the browser's own when `None`
    pub user_agent: Option<String>,
    /// Window and screenshot size
    pub viewport: Viewport,
    /// Timeout for navigation and in-page evaluation in milliseconds
    pub timeout_ms: u64,
    /// Allow `evaluate_script_in_page`
    pub enable_javascript: bool,
    /// Whether to keep Chrome's sandbox enabled
    pub sandbox: bool,
    /// Explicit browser executable; auto-detected when `None`
    pub browser_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            viewport: Viewport::default(),
            timeout_ms: 30000,
            enable_javascript: true,
            sandbox: false,
            browser_path: None,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Window size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
        }
    }
}

/// Outcome of an in-page script; `value` is the JSON rendering of the result
#[derive(Debug, Clone)]
pub struct ScriptResult {
    /// JSON text, `null` for undefined
    pub value: String,
    /// The script threw
    pub is_error: bool,
}

/// A `console.*` call made by the page
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    /// `log`, `info`, `warn` or `error`
    pub level: String,
    /// Arguments joined with spaces
    pub text: String,
}

/// A browser the capture pipeline can drive
///
/// The capture pipeline only talks to this trait, so it runs the same against
/// Chrome and against scripted engines in tests.
pub trait Engine {
    /// Start the browser
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for navigation to finish
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Evaluate JavaScript in the page's global context, awaiting a returned promise
    fn evaluate_script_in_page(&mut self, script: &str) -> Result<ScriptResult>;

    /// Block until `selector` matches an element or `timeout` elapses
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Render the current viewport as a PNG image
    fn render_png(&self) -> Result<Vec<u8>>;

    /// Receive the page's console output from the next navigation on
    fn on_console<F>(&mut self, cb: F)
    where
        F: Fn(&ConsoleMessage) + Send + Sync + 'static;

    /// Stop delivering console output
    fn clear_on_console(&mut self);

    /// Shut the browser down
    fn close(self) -> Result<()>;
}

/// Start the Chrome backend
#[cfg(feature = "cdp")]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    cdp::CdpEngine::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.viewport.width, 1200);
        assert_eq!(config.viewport.height, 630);
        assert!(config.enable_javascript);
        assert!(!config.sandbox);
    }

    #[test]
    fn test_timeout() {
        let config = EngineConfig {
            timeout_ms: 1500,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_millis(1500));
    }
}
