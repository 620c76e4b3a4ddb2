//! Headless Chrome backend for preview capture

use crate::{ConsoleMessage, Engine, EngineConfig, Error, Result, ScriptResult};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

type ConsoleHandler = Arc<dyn Fn(&ConsoleMessage) + Send + Sync>;

/// Page-side name of the binding console output is forwarded through
const CONSOLE_BINDING: &str = "__linkpage_console";

/// Installed after navigation; idempotent per document
const CONSOLE_FORWARDER: &str = r#"(function(){
    var send = window.__linkpage_console;
    if (typeof send !== 'function' || window.__linkpage_forwarding) return false;
    window.__linkpage_forwarding = true;
    ['log', 'info', 'warn', 'error'].forEach(function(level){
        var original = console[level];
        console[level] = function(){
            var args = Array.prototype.map.call(arguments, function(a){ return String(a); });
            try { send(JSON.stringify({ level: level, args: args })); } catch (_) {}
            return original.apply(console, arguments);
        };
    });
    return true;
})()"#;

/// One browser with a single tab, sized to the capture viewport.
///
/// The window is exactly the viewport so that layout, the screenshot clip and
/// the output image all agree.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
    console: Option<ConsoleHandler>,
}

fn launch_options(config: &EngineConfig) -> Result<LaunchOptions<'static>> {
    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(config.sandbox)
        .window_size(Some((config.viewport.width, config.viewport.height)))
        .path(config.browser_path.clone())
        .build()
        .map_err(|e| Error::InitializationError(format!("invalid launch options: {}", e)))
}

/// Decode what the page forwarder sends: a JSON string `{level, args}`.
fn console_message(payload: Value) -> Option<ConsoleMessage> {
    let payload = match payload {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    };

    let level = payload.get("level")?.as_str()?.to_string();
    let text = payload
        .get("args")
        .and_then(Value::as_array)
        .map(|args| {
            args.iter()
                .map(|a| match a {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Some(ConsoleMessage { level, text })
}

impl CdpEngine {
    fn forward_console(&self) {
        match self.tab.evaluate(CONSOLE_FORWARDER, false) {
            Ok(_) => debug!("Console forwarding installed"),
            Err(e) => warn!("Console forwarding unavailable: {}", e),
        }
    }
}

impl Engine for CdpEngine {
    fn new(config: EngineConfig) -> Result<Self> {
        let browser = Browser::new(launch_options(&config)?)
            .map_err(|e| Error::InitializationError(format!("could not start Chrome: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("could not open a tab: {}", e)))?;

        tab.set_default_timeout(config.timeout());
        if let Some(ua) = config.user_agent.as_deref() {
            tab.set_user_agent(ua, None, None)
                .map_err(|e| Error::InitializationError(format!("could not set user agent: {}", e)))?;
        }

        debug!(
            "Chrome started, window {}x{}",
            config.viewport.width, config.viewport.height
        );

        Ok(Self {
            browser,
            tab,
            config,
            console: None,
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| Error::LoadError(format!("{}: {}", url, e)))?;

        if self.console.is_some() {
            self.forward_console();
        }
        Ok(())
    }

    fn evaluate_script_in_page(&mut self, script: &str) -> Result<ScriptResult> {
        if !self.config.enable_javascript {
            return Err(Error::ScriptError("scripting is disabled for this engine".into()));
        }

        let remote = self
            .tab
            .evaluate(script, true)
            .map_err(|e| Error::ScriptError(e.to_string()))?;

        Ok(ScriptResult {
            value: remote.value.map_or_else(|| "null".to_string(), |v| v.to_string()),
            is_error: false,
        })
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!("'{}' did not appear: {}", selector, e);
                Err(Error::Timeout(timeout.as_millis() as u64))
            }
        }
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: f64::from(self.config.viewport.width),
            height: f64::from(self.config.viewport.height),
            scale: 1.0,
        };

        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::RenderError(format!("screenshot: {}", e)))
    }

    fn on_console<F>(&mut self, cb: F)
    where
        F: Fn(&ConsoleMessage) + Send + Sync + 'static,
    {
        let handler: ConsoleHandler = Arc::new(cb);
        let forward = handler.clone();

        let exposed = self.tab.expose_function(
            CONSOLE_BINDING,
            Arc::new(move |payload: Value| {
                if let Some(msg) = console_message(payload) {
                    forward(&msg);
                }
            }),
        );
        if let Err(e) = exposed {
            warn!("Could not expose {}: {}", CONSOLE_BINDING, e);
        }

        self.console = Some(handler);
    }

    fn clear_on_console(&mut self) {
        self.console = None;
    }

    fn close(self) -> Result<()> {
        let Self { browser, tab, .. } = self;
        // Tab first, so the browser process can exit once it is dropped
        drop(tab);
        drop(browser);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn console_payload_as_json_string() {
        let raw = json!({ "level": "warn", "args": ["a", "b"] }).to_string();
        let msg = console_message(Value::String(raw)).unwrap();
        assert_eq!(msg.level, "warn");
        assert_eq!(msg.text, "a b");
    }

    #[test]
    fn console_payload_as_object() {
        let msg = console_message(json!({ "level": "log", "args": ["n", 3] })).unwrap();
        assert_eq!(msg.text, "n 3");
    }

    #[test]
    fn console_payload_without_level_is_dropped() {
        assert!(console_message(Value::String("plain text".into())).is_none());
        assert!(console_message(json!({ "args": [] })).is_none());
    }

    #[test]
    fn launch_options_follow_config() {
        assert!(launch_options(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn chrome_starts_when_available() {
        // Skipped in CI and wherever Chrome is missing
        if std::env::var("CI").is_ok() {
            return;
        }
        match CdpEngine::new(EngineConfig::default()) {
            Ok(engine) => assert!(engine.close().is_ok()),
            Err(e) => eprintln!("Chrome unavailable, skipping: {}", e),
        }
    }
}
