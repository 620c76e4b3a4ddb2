//! Page controller: bindings between page elements and behaviour
//!
//! [`PageController::init`] takes the page structure, the link registry and a
//! preference store, and returns the handle through which every interaction
//! is resolved. The browser runtime is a thin dispatcher over the
//! [`RuntimeBindings`] the controller exports.

pub mod document;
pub mod focus;
pub mod links;
pub mod preference;

pub use document::PageDocument;
pub use focus::{FocusRing, Focusable};
pub use links::{LinkRegistry, Navigation, Ripple};
pub use preference::{ColorScheme, MemoryStore, PreferenceStore};

use crate::style::{BackgroundRef, StyleState, ThemeContext};
use crate::theme::{theme_for_image, Theme};
use image::DynamicImage;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Delay between consecutive cards' entrance animations
pub const ENTRANCE_STAGGER: Duration = Duration::from_millis(100);
/// Entrance delay of the profile section
pub const PROFILE_ENTRANCE_DELAY: Duration = Duration::from_millis(200);
/// Fraction of a card that must be visible before it is revealed
pub const REVEAL_THRESHOLD: f64 = 0.1;
pub const REVEAL_ROOT_MARGIN: &str = "0px 0px -50px 0px";

/// What happens when a social icon is clicked: a ripple always, a
/// navigation when the platform is bound.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialActivation {
    pub ripple: Ripple,
    pub navigation: Option<Navigation>,
}

/// Everything the browser runtime needs to dispatch events, as JSON
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeBindings {
    pub cards: BTreeMap<String, String>,
    pub socials: BTreeMap<String, String>,
    pub focus_selector: &'static str,
    pub press_transform: &'static str,
    pub press_delay_ms: u64,
    pub social_delay_ms: u64,
    pub ripple_ms: u64,
    pub stagger_ms: u64,
    pub profile_delay_ms: u64,
    pub reveal_threshold: f64,
    pub reveal_root_margin: &'static str,
    pub storage_key: &'static str,
    pub light_class: &'static str,
    pub dark_icon: &'static str,
    pub light_icon: &'static str,
    pub ready_attribute: &'static str,
}

/// Handle returned by [`PageController::init`]
#[derive(Debug)]
pub struct PageController<S: PreferenceStore = MemoryStore> {
    document: PageDocument,
    links: LinkRegistry,
    focus: FocusRing,
    store: S,
    scheme: ColorScheme,
    style: StyleState,
}

impl<S: PreferenceStore> PageController<S> {
    /// Wire up the page: build the focus ring and read the stored scheme.
    pub fn init(document: PageDocument, links: LinkRegistry, store: S) -> Self {
        let scheme = ColorScheme::from_stored(store.get(preference::SCHEME_KEY).as_deref());
        let focus = document.focus_ring();

        let unbound = document
            .cards()
            .filter(|c| links.card_url(c).is_none())
            .collect::<Vec<_>>();
        if !unbound.is_empty() {
            debug!("Cards without a bound URL: {:?}", unbound);
        }

        Self {
            document,
            links,
            focus,
            store,
            scheme,
            style: StyleState::new(),
        }
    }

    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn focus_ring(&self) -> &FocusRing {
        &self.focus
    }

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.scheme
    }

    /// A link card was clicked
    pub fn card_activated(&self, name: &str) -> Option<Navigation> {
        self.links.activate_card(name)
    }

    /// A social icon of the given on-screen size was clicked
    pub fn social_activated(&self, icon_class: &str, width: f64, height: f64) -> SocialActivation {
        SocialActivation {
            ripple: Ripple::centered(width, height),
            navigation: self.links.activate_social(icon_class),
        }
    }

    /// Tab (or Shift+Tab) was pressed while `focused` had focus.
    ///
    /// Returns the element to focus, or `None` to let the browser handle it.
    pub fn tab_pressed(&self, focused: Option<&Focusable>, backward: bool) -> Option<&Focusable> {
        let current = focused.and_then(|f| self.focus.position(f));
        self.focus
            .step(current, backward)
            .and_then(|i| self.focus.get(i))
    }

    /// Flip between dark and light and persist the choice
    pub fn toggle_color_scheme(&mut self) -> ColorScheme {
        self.scheme = self.scheme.toggled();
        self.store
            .set(preference::SCHEME_KEY, self.scheme.stored_value());
        self.scheme
    }

    /// Bind a new card and place it at the end of the card list.
    ///
    /// Card names are unique, so adding a name that is already bound only
    /// rebinds its URL; no second card is appended.
    pub fn add_link(&mut self, name: &str, url: &str) {
        match self.links.card_url(name) {
            Some(previous) => debug!("Rebinding card '{}' from {} to {}", name, previous, url),
            None => {
                self.focus.insert_card(name);
                self.document.focusables = self.focus.as_slice().to_vec();
            }
        }
        self.links.add_link(name, url);
    }

    /// Entrance animation delay per card, in page order
    pub fn entrance_delays(&self) -> Vec<(String, Duration)> {
        self.document
            .cards()
            .enumerate()
            .map(|(i, name)| (name.to_string(), ENTRANCE_STAGGER * i as u32))
            .collect()
    }

    /// A background finished decoding: derive and apply its theme.
    pub fn background_loaded(&mut self, image: &DynamicImage, background: BackgroundRef) -> Theme {
        let theme = theme_for_image(image);
        info!(
            "Applied background theme: primary {}, accent {}",
            theme.primary, theme.accent
        );
        self.style.apply(ThemeContext { theme, background });
        theme
    }

    /// Read and decode a background file, then apply its theme.
    ///
    /// Any failure leaves the style state as it was; the page stays usable
    /// with its default colours. Returns whether a theme was applied.
    pub fn load_background(&mut self, path: &Path, background: BackgroundRef) -> bool {
        let decoded = std::fs::read(path)
            .map_err(|e| crate::Error::io(path, e))
            .and_then(|bytes| image::load_from_memory(&bytes).map_err(crate::Error::from));

        match decoded {
            Ok(image) => {
                self.background_loaded(&image, background);
                true
            }
            Err(e) => {
                warn!("Background unavailable, keeping default theme: {}", e);
                false
            }
        }
    }

    /// Serialisable bindings for the browser runtime
    pub fn bindings(&self) -> RuntimeBindings {
        RuntimeBindings {
            cards: owned(self.links.cards()),
            socials: owned(self.links.socials()),
            focus_selector: focus::FOCUSABLE_SELECTOR,
            press_transform: links::CARD_PRESS_TRANSFORM,
            press_delay_ms: links::CARD_PRESS_DELAY.as_millis() as u64,
            social_delay_ms: links::SOCIAL_OPEN_DELAY.as_millis() as u64,
            ripple_ms: links::RIPPLE_LIFETIME.as_millis() as u64,
            stagger_ms: ENTRANCE_STAGGER.as_millis() as u64,
            profile_delay_ms: PROFILE_ENTRANCE_DELAY.as_millis() as u64,
            reveal_threshold: REVEAL_THRESHOLD,
            reveal_root_margin: REVEAL_ROOT_MARGIN,
            storage_key: preference::SCHEME_KEY,
            light_class: preference::LIGHT_MODE_CLASS,
            dark_icon: ColorScheme::Dark.toggle_icon(),
            light_icon: ColorScheme::Light.toggle_icon(),
            ready_attribute: document::READY_ATTRIBUTE,
        }
    }
}

fn owned<'a>(it: impl Iterator<Item = (&'a str, &'a str)>) -> BTreeMap<String, String> {
    it.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn controller(store: MemoryStore) -> PageController {
        let document = PageDocument {
            title: "Links".into(),
            focusables: vec![
                Focusable::Card("website".into()),
                Focusable::Card("shop".into()),
                Focusable::Social("github".into()),
            ],
            has_profile_section: true,
            has_runtime: true,
        };
        let mut links = LinkRegistry::new();
        links.add_link("website", "https://example.org/");
        links.add_social("github", "https://github.com/someone");
        PageController::init(document, links, store)
    }

    #[test]
    fn init_reads_stored_scheme() {
        let mut store = MemoryStore::new();
        store.set(preference::SCHEME_KEY, "light");
        assert_eq!(controller(store).color_scheme(), ColorScheme::Light);
        assert_eq!(controller(MemoryStore::new()).color_scheme(), ColorScheme::Dark);
    }

    #[test]
    fn toggle_persists() {
        let mut c = controller(MemoryStore::new());
        assert_eq!(c.toggle_color_scheme(), ColorScheme::Light);
        assert_eq!(c.store().get("theme").as_deref(), Some("light"));
        assert_eq!(c.toggle_color_scheme(), ColorScheme::Dark);
        assert_eq!(c.store().get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn social_click_always_ripples() {
        let c = controller(MemoryStore::new());
        let hit = c.social_activated("fab fa-github", 40.0, 40.0);
        assert!(hit.navigation.is_some());
        let miss = c.social_activated("fab fa-discord", 40.0, 40.0);
        assert_eq!(miss.ripple.size, 40.0);
        assert!(miss.navigation.is_none());
    }

    #[test]
    fn tab_walks_the_ring() {
        let c = controller(MemoryStore::new());
        let shop = Focusable::Card("shop".into());
        assert_eq!(
            c.tab_pressed(Some(&shop), false),
            Some(&Focusable::Social("github".into()))
        );
        assert_eq!(
            c.tab_pressed(Some(&shop), true),
            Some(&Focusable::Card("website".into()))
        );
        assert_eq!(c.tab_pressed(None, true), None);
    }

    #[test]
    fn added_links_join_focus_and_entrance_order() {
        let mut c = controller(MemoryStore::new());
        c.add_link("coffee", "https://example.org/coffee");
        assert_eq!(c.focus_ring().get(2), Some(&Focusable::Card("coffee".into())));
        let delays = c.entrance_delays();
        assert_eq!(delays[2], ("coffee".to_string(), Duration::from_millis(200)));
        assert!(c.card_activated("coffee").is_some());
    }

    #[test]
    fn adding_a_bound_name_rebinds_without_a_second_card() {
        let mut c = controller(MemoryStore::new());
        c.add_link("website", "https://example.net/");
        assert_eq!(c.focus_ring().len(), 3);
        assert_eq!(c.document().cards().filter(|n| *n == "website").count(), 1);
        assert_eq!(
            c.card_activated("website").map(|n| n.url),
            Some("https://example.net/".to_string())
        );
    }

    #[test]
    fn background_hook_applies_full_context() {
        let mut c = controller(MemoryStore::new());
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        let theme = c.background_loaded(&img, BackgroundRef::path("bg.png"));
        assert_eq!(theme.primary.css(), "hsl(0, 64%, 58%)");
        let ctx = c.style().context().expect("themed");
        assert_eq!(ctx.background.url(), "bg.png");
    }

    #[test]
    fn failed_background_keeps_default_state() {
        let mut c = controller(MemoryStore::new());
        let applied = c.load_background(
            Path::new("definitely/not/here.png"),
            BackgroundRef::path("here.png"),
        );
        assert!(!applied);
        assert!(!c.style().is_themed());
    }

    #[test]
    fn bindings_serialize_for_the_runtime() {
        let c = controller(MemoryStore::new());
        let json = serde_json::to_value(c.bindings()).unwrap();
        assert_eq!(json["cards"]["website"], "https://example.org/");
        assert_eq!(json["pressDelayMs"], 150);
        assert_eq!(json["readyAttribute"], "data-linktree-ready");
    }
}
