//! Style variable surface consumed by the page stylesheet
//!
//! The page reads `--primary-color`, `--accent-color` and `--bg-image` from
//! `:root`, and switches background-specific rules on through the `has-bg`
//! class on `<body>`. [`StyleState`] owns those values as a single
//! [`ThemeContext`], so the theme is either fully applied or not at all.

use crate::theme::Theme;
use base64::Engine as Base64Engine;
use serde_json::json;

pub const PRIMARY_COLOR_VAR: &str = "--primary-color";
pub const ACCENT_COLOR_VAR: &str = "--accent-color";
pub const BG_IMAGE_VAR: &str = "--bg-image";
pub const BACKGROUND_CLASS: &str = "has-bg";

/// Where the page background comes from: a relative path or an inline data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRef(String);

impl BackgroundRef {
    /// Reference a file relative to the page
    pub fn path(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Inline the image bytes as a base64 data URL
    pub fn data_url(mime: &str, bytes: &[u8]) -> Self {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{};base64,{}", mime, b64))
    }

    /// The raw URL
    pub fn url(&self) -> &str {
        &self.0
    }

    /// The value for `--bg-image`
    pub fn css_value(&self) -> String {
        let escaped = self.0.replace('\\', "\\\\").replace('"', "\\\"");
        format!("url(\"{}\")", escaped)
    }
}

/// Guess a MIME type for a background file from its extension
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

/// A derived theme together with the background it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeContext {
    pub theme: Theme,
    pub background: BackgroundRef,
}

impl ThemeContext {
    /// The custom properties this context sets on `:root`, in a fixed order
    pub fn variables(&self) -> [(&'static str, String); 3] {
        [
            (PRIMARY_COLOR_VAR, self.theme.primary.css()),
            (ACCENT_COLOR_VAR, self.theme.accent.css()),
            (BG_IMAGE_VAR, self.background.css_value()),
        ]
    }
}

/// The page's global style state.
///
/// Holds at most one [`ThemeContext`]; applying a new one replaces the
/// previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleState {
    context: Option<ThemeContext>,
}

impl StyleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current theme context
    pub fn apply(&mut self, context: ThemeContext) {
        self.context = Some(context);
    }

    /// Drop back to the default, un-themed state
    pub fn clear(&mut self) {
        self.context = None;
    }

    pub fn context(&self) -> Option<&ThemeContext> {
        self.context.as_ref()
    }

    pub fn is_themed(&self) -> bool {
        self.context.is_some()
    }

    /// A `:root { ... }` rule with the theme variables, or an empty string
    pub fn root_css(&self) -> String {
        match &self.context {
            Some(ctx) => {
                let body = ctx
                    .variables()
                    .iter()
                    .map(|(name, value)| format!("  {}: {};", name, value))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(":root {{\n{}\n}}\n", body)
            }
            None => String::new(),
        }
    }

    /// Classes to put on `<body>`
    pub fn body_classes(&self) -> Vec<&'static str> {
        if self.is_themed() {
            vec![BACKGROUND_CLASS]
        } else {
            Vec::new()
        }
    }

    /// A page script that writes this state into a live document.
    ///
    /// The script resolves once the background has decoded (or failed to),
    /// every variable is written, fonts are ready and two frames have been
    /// painted. Unthemed state removes the variables and the class.
    pub fn apply_script(&self) -> String {
        let (vars, background) = match &self.context {
            Some(ctx) => {
                let vars = ctx
                    .variables()
                    .iter()
                    .map(|(n, v)| (n.to_string(), json!(v)))
                    .collect::<serde_json::Map<_, _>>();
                (
                    serde_json::Value::Object(vars),
                    json!(ctx.background.url()),
                )
            }
            None => {
                let vars = [PRIMARY_COLOR_VAR, ACCENT_COLOR_VAR, BG_IMAGE_VAR]
                    .iter()
                    .map(|n| (n.to_string(), serde_json::Value::Null))
                    .collect::<serde_json::Map<_, _>>();
                (serde_json::Value::Object(vars), serde_json::Value::Null)
            }
        };

        APPLY_TEMPLATE
            .replace("{{VARS}}", &vars.to_string())
            .replace("{{BACKGROUND}}", &background.to_string())
            .replace("{{CLASS}}", &json!(BACKGROUND_CLASS).to_string())
    }
}

const APPLY_TEMPLATE: &str = r#"(async function(){
    const vars = {{VARS}};
    const background = {{BACKGROUND}};
    if (background !== null) {
        await new Promise(function(resolve){
            const img = new Image();
            img.onload = resolve;
            img.onerror = resolve;
            img.src = background;
        });
    }
    const root = document.documentElement;
    for (const [name, value] of Object.entries(vars)) {
        if (value === null) root.style.removeProperty(name);
        else root.style.setProperty(name, value);
    }
    document.body.classList.toggle({{CLASS}}, background !== null);
    if (document.fonts && document.fonts.ready) await document.fonts.ready;
    await new Promise(function(r){ requestAnimationFrame(function(){ requestAnimationFrame(r); }); });
    return true;
})()"#;
