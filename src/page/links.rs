//! Element-to-URL bindings for link cards and social icons

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// How long a pressed card stays scaled down before its link opens
pub const CARD_PRESS_DELAY: Duration = Duration::from_millis(150);
/// Delay between the ripple starting and the social link opening
pub const SOCIAL_OPEN_DELAY: Duration = Duration::from_millis(300);
/// Ripple animation length; the ripple element is removed afterwards
pub const RIPPLE_LIFETIME: Duration = Duration::from_millis(600);
/// Transform applied to a card while it is pressed
pub const CARD_PRESS_TRANSFORM: &str = "scale(0.98)";

/// A link to open in a new tab after `delay_ms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub url: String,
    pub target: &'static str,
    pub rel: &'static str,
    pub delay_ms: u64,
}

impl Navigation {
    fn new_tab(url: &str, delay: Duration) -> Self {
        Self {
            url: url.to_string(),
            target: "_blank",
            rel: "noopener noreferrer",
            delay_ms: delay.as_millis() as u64,
        }
    }
}

/// Ripple circle geometry, relative to the element's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ripple {
    pub size: f64,
    pub left: f64,
    pub top: f64,
}

impl Ripple {
    /// A circle as wide as the element's larger side, centred on the element
    pub fn centered(width: f64, height: f64) -> Self {
        let size = width.max(height);
        Self {
            size,
            left: width / 2.0 - size / 2.0,
            top: height / 2.0 - size / 2.0,
        }
    }
}

/// Extract the platform from an icon class list such as `fab fa-youtube`.
///
/// The platform is the second dash-separated segment of the second class.
pub fn platform_from_icon(class_list: &str) -> Option<&str> {
    class_list
        .split_whitespace()
        .nth(1)
        .and_then(|class| class.split('-').nth(1))
        .filter(|p| !p.is_empty())
}

/// Named link cards and social platforms mapped to their URLs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkRegistry {
    cards: BTreeMap<String, String>,
    socials: BTreeMap<String, String>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) a link card
    pub fn add_link(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.cards.insert(name.into(), url.into());
    }

    /// Bind (or rebind) a social platform
    pub fn add_social(&mut self, platform: impl Into<String>, url: impl Into<String>) {
        self.socials.insert(platform.into(), url.into());
    }

    pub fn card_url(&self, name: &str) -> Option<&str> {
        self.cards.get(name).map(String::as_str)
    }

    pub fn social_url(&self, platform: &str) -> Option<&str> {
        self.socials.get(platform).map(String::as_str)
    }

    pub fn cards(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn socials(&self) -> impl Iterator<Item = (&str, &str)> {
        self.socials.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Navigation for a clicked card, opened after the press feedback
    pub fn activate_card(&self, name: &str) -> Option<Navigation> {
        self.card_url(name)
            .map(|url| Navigation::new_tab(url, CARD_PRESS_DELAY))
    }

    /// Navigation for a clicked social icon, opened after the ripple starts
    pub fn activate_social(&self, icon_class: &str) -> Option<Navigation> {
        platform_from_icon(icon_class)
            .and_then(|p| self.social_url(p))
            .map(|url| Navigation::new_tab(url, SOCIAL_OPEN_DELAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LinkRegistry {
        let mut r = LinkRegistry::new();
        r.add_link("website", "https://example.org/");
        r.add_social("github", "https://github.com/someone");
        r
    }

    #[test]
    fn platform_parsing() {
        assert_eq!(platform_from_icon("fab fa-youtube"), Some("youtube"));
        assert_eq!(platform_from_icon("fab fa-github-alt"), Some("github"));
        assert_eq!(platform_from_icon("fab"), None);
        assert_eq!(platform_from_icon("fab youtube"), None);
    }

    #[test]
    fn card_activation_waits_for_press_feedback() {
        let nav = registry().activate_card("website").unwrap();
        assert_eq!(nav.url, "https://example.org/");
        assert_eq!(nav.delay_ms, 150);
        assert_eq!(nav.target, "_blank");
        assert_eq!(nav.rel, "noopener noreferrer");
    }

    #[test]
    fn unknown_names_do_nothing() {
        let r = registry();
        assert!(r.activate_card("shop").is_none());
        assert!(r.activate_social("fab fa-discord").is_none());
    }

    #[test]
    fn social_activation_resolves_from_icon() {
        let nav = registry().activate_social("fab fa-github").unwrap();
        assert_eq!(nav.url, "https://github.com/someone");
        assert_eq!(nav.delay_ms, 300);
    }

    #[test]
    fn add_link_rebinds() {
        let mut r = registry();
        r.add_link("website", "https://example.net/");
        assert_eq!(r.card_url("website"), Some("https://example.net/"));
    }

    #[test]
    fn ripple_is_centered_on_the_larger_side() {
        let ripple = Ripple::centered(48.0, 32.0);
        assert_eq!(ripple.size, 48.0);
        assert_eq!(ripple.left, 0.0);
        assert_eq!(ripple.top, -8.0);
    }
}
