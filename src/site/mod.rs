//! Static page rendering
//!
//! The page is described by a [`SiteConfig`] (usually `linktree.json`). The
//! [`build`] step wires a [`PageController`] from it, lets the controller
//! theme itself from the configured background, and renders a single
//! self-contained `index.html` with the stylesheet, the controller's style
//! state and runtime bindings inlined.

use crate::page::{Focusable, LinkRegistry, MemoryStore, PageController, PageDocument};
use crate::style::BackgroundRef;
use crate::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

const STYLESHEET: &str = include_str!("styles.css");
const RUNTIME: &str = include_str!("runtime.js");

/// Default config file name looked up next to the page
pub const CONFIG_FILE: &str = "linktree.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

/// A link card: `name` is its binding (`data-link`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub icon: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialConfig {
    pub platform: String,
    pub url: String,
}

impl SocialConfig {
    fn icon_class(&self) -> String {
        format!("fab fa-{}", self.platform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    pub profile: Profile,
    pub cards: Vec<CardConfig>,
    pub socials: Vec<SocialConfig>,
    /// Background image path, relative to the page
    pub background: Option<String>,
    /// Social preview image referenced by `og:image`
    pub preview_image: String,
}

fn card(name: &str, title: &str, description: &str, icon: &str, url: &str) -> CardConfig {
    CardConfig {
        name: name.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        url: url.to_string(),
    }
}

fn social(platform: &str, url: &str) -> SocialConfig {
    SocialConfig {
        platform: platform.to_string(),
        url: url.to_string(),
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Vanilama | Links".to_string(),
            description: "Minecraft tools, mods and everything in between".to_string(),
            profile: Profile {
                name: "Vanilama".to_string(),
                bio: "Minecraft tools, mods and everything in between".to_string(),
                avatar: Some("avatar.png".to_string()),
            },
            cards: vec![
                card("website", "Website", "Minecraft tools wiki", "fas fa-globe", "https://minecraft-tools-wiki.super.site/"),
                card("newsletter", "Modrinth", "Mods and modpacks", "fas fa-cube", "https://modrinth.com/user/Vanilama-modded"),
                card("youtube", "YouTube", "Videos and showcases", "fab fa-youtube", "https://youtube.com/@yourchannel"),
                card("shop", "Shop", "Merch and prints", "fas fa-shopping-bag", "https://yourstore.etsy.com"),
                card("discord", "Discord", "Join the community", "fab fa-discord", "https://discord.gg/yourserver"),
                card("github", "GitHub", "Source code", "fab fa-github", "https://github.com/yourusername"),
                card("coffee", "Buy me a coffee", "Support the work", "fas fa-mug-hot", "https://buymeacoffee.com/yourname"),
            ],
            socials: vec![
                social("youtube", "https://www.youtube.com/@Vanilama-modded"),
                social("discord", "https://discord.gg/wz3ZvfA7kQ"),
                social("github", "https://github.com/Vanilama-modded"),
            ],
            background: Some("background.png".to_string()),
            preview_image: "preview.png".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let cfg: SiteConfig = serde_json::from_str(&raw)
                    .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No site config at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Card names must be unique; they key the link bindings
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for c in &self.cards {
            if c.name.trim().is_empty() {
                return Err(Error::ConfigError("card with an empty name".into()));
            }
            if !seen.insert(c.name.as_str()) {
                return Err(Error::ConfigError(format!("duplicate card name '{}'", c.name)));
            }
        }
        Ok(())
    }

    pub fn links(&self) -> LinkRegistry {
        let mut links = LinkRegistry::new();
        for c in &self.cards {
            links.add_link(c.name.clone(), c.url.clone());
        }
        for s in &self.socials {
            links.add_social(s.platform.clone(), s.url.clone());
        }
        links
    }

    /// The page structure this config renders to
    pub fn document(&self) -> PageDocument {
        let focusables = self
            .cards
            .iter()
            .map(|c| Focusable::Card(c.name.clone()))
            .chain(self.socials.iter().map(|s| Focusable::Social(s.platform.clone())))
            .collect();
        PageDocument {
            title: self.title.clone(),
            focusables,
            has_profile_section: true,
            has_runtime: true,
        }
    }
}

/// A rendered page and the controller it was rendered from
#[derive(Debug)]
pub struct BuiltSite {
    pub html: String,
    pub controller: PageController,
}

/// Wire the controller, theme it from the background under `base_dir`, and render.
pub fn build(config: &SiteConfig, base_dir: &Path) -> Result<BuiltSite> {
    config.validate()?;
    let mut controller =
        PageController::init(config.document(), config.links(), MemoryStore::new());

    if let Some(bg) = &config.background {
        let themed = controller.load_background(&base_dir.join(bg), BackgroundRef::path(bg.clone()));
        debug!("Background {} themed: {}", bg, themed);
    }

    let html = render(config, &controller);
    Ok(BuiltSite { html, controller })
}

/// Render the page for a wired controller
pub fn render(config: &SiteConfig, controller: &PageController) -> String {
    let style = controller.style();
    let mut out = String::with_capacity(STYLESHEET.len() + RUNTIME.len() + 4096);

    let body_class = style.body_classes().join(" ");
    let bindings = serde_json::to_string(&controller.bindings())
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    // Writing to a String cannot fail
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en" data-linktree-runtime>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<meta name="description" content="{description}">
<meta property="og:title" content="{title}">
<meta property="og:description" content="{description}">
<meta property="og:image" content="{preview}">
<meta name="twitter:card" content="summary_large_image">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
<style>
{stylesheet}{root_css}</style>
</head>
<body class="{body_class}">
<main class="container">
<section class="profile-section">
"#,
        title = escape(&config.title),
        description = escape(&config.description),
        preview = escape(&config.preview_image),
        stylesheet = STYLESHEET,
        root_css = style.root_css(),
        body_class = body_class,
    );

    if let Some(avatar) = &config.profile.avatar {
        let _ = writeln!(
            out,
            r#"<img class="avatar" src="{}" alt="{}">"#,
            escape(avatar),
            escape(&config.profile.name)
        );
    }
    let _ = write!(
        out,
        "<h1 class=\"profile-name\">{}</h1>\n<p class=\"profile-bio\">{}</p>\n</section>\n<section class=\"links-section\">\n",
        escape(&config.profile.name),
        escape(&config.profile.bio)
    );

    for c in &config.cards {
        let _ = write!(
            out,
            r#"<div class="link-card" data-link="{name}" tabindex="0" role="link">
<div class="link-icon"><i class="{icon}"></i></div>
<div class="link-content"><h3>{title}</h3><p>{description}</p></div>
<i class="fas fa-external-link-alt"></i>
</div>
"#,
            name = escape(&c.name),
            icon = escape(&c.icon),
            title = escape(&c.title),
            description = escape(&c.description),
        );
    }
    out.push_str("</section>\n<nav class=\"social-links\">\n");

    for s in &config.socials {
        let _ = writeln!(
            out,
            r#"<a class="social-link" href="{url}" aria-label="{platform}"><i class="{icon}"></i></a>"#,
            url = escape(&s.url),
            platform = escape(&s.platform),
            icon = escape(&s.icon_class()),
        );
    }

    let _ = write!(
        out,
        "</nav>\n</main>\n<script type=\"application/json\" id=\"linktree-bindings\">{}</script>\n<script>\n{}</script>\n</body>\n</html>\n",
        bindings, RUNTIME
    );

    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
