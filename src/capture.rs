//! Render-then-capture of the page into a social preview image
//!
//! One operation covers both the plain capture and the capture with a
//! background override: [`CapturePlan::prepare`] resolves the page, reads and
//! themes the optional background, and fails fast on missing files before a
//! browser is launched. [`CapturePlan::run`] then drives an [`Engine`]
//! strictly in sequence: navigate, wait for the page's ready signal, apply
//! overrides, wait for rendering to settle, screenshot, write.

use crate::page::document::{PageDocument, READY_ATTRIBUTE, RUNTIME_ATTRIBUTE};
use crate::page::preference::{ColorScheme, LIGHT_MODE_CLASS, SCHEME_KEY};
use crate::style::{mime_for_path, BackgroundRef, StyleState, ThemeContext};
use crate::theme::{theme_for_image, Theme};
use crate::{Engine, EngineConfig, Error, Result, Viewport};
use image::imageops::FilterType;
use image::ImageFormat;
use log::{debug, info, warn};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the page to capture lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    File(PathBuf),
    Url(String),
}

impl PageSource {
    /// URLs with a scheme are taken as-is, anything else is a file path
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://") {
            PageSource::Url(s.to_string())
        } else {
            PageSource::File(PathBuf::from(s))
        }
    }
}

impl Default for PageSource {
    fn default() -> Self {
        PageSource::File(PathBuf::from("index.html"))
    }
}

/// Capture settings; the defaults write `preview.png` at 1200×630 from `index.html`
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub page: PageSource,
    pub output: PathBuf,
    pub viewport: Viewport,
    /// Background to inject instead of the page's own
    pub background: Option<PathBuf>,
    pub color_scheme: ColorScheme,
    /// Upper bound on waiting for the page's ready signal
    pub settle_timeout_ms: u64,
    pub engine: EngineConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            page: PageSource::default(),
            output: PathBuf::from("preview.png"),
            viewport: Viewport::default(),
            background: None,
            color_scheme: ColorScheme::Dark,
            settle_timeout_ms: 10000,
            engine: EngineConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Engine settings with the capture viewport applied
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            viewport: self.viewport,
            ..self.engine.clone()
        }
    }
}

/// What a finished capture produced
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Theme injected with the background override, if any
    pub theme: Option<Theme>,
    pub bytes: usize,
}

/// A capture with every input resolved and validated
#[derive(Debug, Clone)]
pub struct CapturePlan {
    pub url: String,
    /// `Some(true)` when the page is known to ship the runtime; `None` when
    /// it can only be probed after loading
    pub runtime: Option<bool>,
    pub overrides: Option<StyleState>,
    pub color_scheme: ColorScheme,
    pub viewport: Viewport,
    pub output: PathBuf,
    pub settle_timeout: Duration,
}

impl CapturePlan {
    /// Resolve the page and background. Missing or unreadable files are errors.
    pub fn prepare(config: &CaptureConfig) -> Result<Self> {
        if config.viewport.width == 0 || config.viewport.height == 0 {
            return Err(Error::ConfigError("viewport must be non-empty".into()));
        }

        let (url, runtime) = match &config.page {
            PageSource::Url(url) => (url.clone(), None),
            PageSource::File(path) => {
                let html = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                let document = PageDocument::parse(&html);
                debug!(
                    "Page '{}' has {} focusable elements, runtime: {}",
                    document.title,
                    document.focusables.len(),
                    document.has_runtime
                );
                (file_url(path)?, Some(document.has_runtime))
            }
        };

        let overrides = match &config.background {
            Some(path) => Some(background_override(path)?),
            None => None,
        };

        Ok(Self {
            url,
            runtime,
            overrides,
            color_scheme: config.color_scheme,
            viewport: config.viewport,
            output: config.output.clone(),
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
        })
    }

    /// Drive `engine` through the capture and write the image
    pub fn run<E: Engine>(&self, engine: &mut E) -> Result<CaptureReport> {
        engine.on_console(|m| debug!("page console [{}]: {}", m.level, m.text));

        info!("Loading {}", self.url);
        engine.load_url(&self.url)?;

        let runtime = match self.runtime {
            Some(known) => known,
            None => probe_runtime(engine)?,
        };
        if runtime {
            let selector = format!("html[{}]", READY_ATTRIBUTE);
            engine.wait_for_selector(&selector, self.settle_timeout)?;
            debug!("Page signalled ready");
        }

        if self.color_scheme == ColorScheme::Light {
            run_script(engine, &scheme_script(self.color_scheme))?;
        }

        let theme = match &self.overrides {
            Some(style) => {
                run_script(engine, &style.apply_script())?;
                style.context().map(|c| c.theme)
            }
            None => None,
        };

        run_script(engine, SETTLE_SCRIPT)?;

        let png = engine.render_png()?;
        let png = fit_to_viewport(png, self.viewport)?;

        std::fs::write(&self.output, &png).map_err(|e| Error::io(&self.output, e))?;
        engine.clear_on_console();

        info!(
            "Preview image generated: {} ({}x{})",
            self.output.display(),
            self.viewport.width,
            self.viewport.height
        );

        Ok(CaptureReport {
            output: self.output.clone(),
            width: self.viewport.width,
            height: self.viewport.height,
            theme,
            bytes: png.len(),
        })
    }
}

/// Prepare, launch an `E`, run, and shut it down
pub fn capture<E: Engine>(config: &CaptureConfig) -> Result<CaptureReport> {
    let plan = CapturePlan::prepare(config)?;
    let mut engine = E::new(config.engine_config())?;
    let result = plan.run(&mut engine);
    if let Err(e) = engine.close() {
        warn!("Engine did not shut down cleanly: {}", e);
    }
    result
}

/// Capture with headless Chrome
#[cfg(feature = "cdp")]
pub fn capture_preview(config: &CaptureConfig) -> Result<CaptureReport> {
    capture::<crate::cdp::CdpEngine>(config)
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = path.canonicalize().map_err(|e| Error::io(path, e))?;
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|_| Error::ConfigError(format!("cannot build a file URL for {}", absolute.display())))
}

/// Read, decode and theme a background file, inlined as a data URL
pub fn background_override(path: &Path) -> Result<StyleState> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let image = image::load_from_memory(&bytes)?;
    let theme = theme_for_image(&image);
    debug!(
        "Background {} ({}x{}) themed {} / {}",
        path.display(),
        image.width(),
        image.height(),
        theme.primary,
        theme.accent
    );

    let mut style = StyleState::new();
    style.apply(ThemeContext {
        theme,
        background: BackgroundRef::data_url(mime_for_path(path), &bytes),
    });
    Ok(style)
}

fn probe_runtime<E: Engine>(engine: &mut E) -> Result<bool> {
    let script = format!(
        "document.documentElement.hasAttribute({})",
        serde_json::Value::from(RUNTIME_ATTRIBUTE)
    );
    let res = run_script(engine, &script)?;
    Ok(res.trim() == "true")
}

fn run_script<E: Engine>(engine: &mut E, script: &str) -> Result<String> {
    let res = engine.evaluate_script_in_page(script)?;
    if res.is_error {
        return Err(Error::ScriptError(res.value));
    }
    Ok(res.value)
}

/// Persist the scheme, set the body class and repaint the toggle icon
fn scheme_script(scheme: ColorScheme) -> String {
    let light = scheme == ColorScheme::Light;
    let icon = format!("<i class=\"{}\"></i>", scheme.toggle_icon());
    format!(
        "(function(){{ try {{ localStorage.setItem({key}, {value}); }} catch (_) {{}} document.body.classList.toggle({class}, {light}); var toggle = document.querySelector('.theme-toggle'); if (toggle) toggle.innerHTML = {icon}; return true; }})()",
        key = serde_json::Value::from(SCHEME_KEY),
        value = serde_json::Value::from(scheme.stored_value()),
        class = serde_json::Value::from(LIGHT_MODE_CLASS),
        light = light,
        icon = serde_json::Value::from(icon),
    )
}

/// Resolves once the document has loaded, fonts are ready and two frames have painted
const SETTLE_SCRIPT: &str = r#"(async function(){
    if (document.readyState !== 'complete') {
        await new Promise(function(r){ window.addEventListener('load', r, { once: true }); });
    }
    if (document.fonts && document.fonts.ready) await document.fonts.ready;
    await new Promise(function(r){ requestAnimationFrame(function(){ requestAnimationFrame(r); }); });
    return true;
})()"#;

/// Ensure the PNG is exactly `viewport` sized (high-DPI screens render larger)
pub fn fit_to_viewport(png: Vec<u8>, viewport: Viewport) -> Result<Vec<u8>> {
    let image = image::load_from_memory_with_format(&png, ImageFormat::Png)?;
    if image.width() == viewport.width && image.height() == viewport.height {
        return Ok(png);
    }

    warn!(
        "Screenshot is {}x{}, resizing to {}x{}",
        image.width(),
        image.height(),
        viewport.width,
        viewport.height
    );
    let resized = image.resize_exact(viewport.width, viewport.height, FilterType::Lanczos3);
    let mut out = Vec::new();
    resized.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}
