//! Structural view of a rendered page, extracted with `scraper`

use crate::page::focus::{FocusRing, Focusable, FOCUSABLE_SELECTOR};
use crate::page::links::platform_from_icon;
use scraper::{ElementRef, Html, Selector};

/// Attribute the page runtime sets on `<html>` once its bindings are live
pub const READY_ATTRIBUTE: &str = "data-linktree-ready";
/// Attribute marking a page that ships the runtime (and so will become ready)
pub const RUNTIME_ATTRIBUTE: &str = "data-linktree-runtime";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDocument {
    /// Contents of `<title>`
    pub title: String,
    /// Focusable elements in document order
    pub focusables: Vec<Focusable>,
    /// Whether a `.profile-section` exists
    pub has_profile_section: bool,
    /// Whether the page ships the runtime and will signal readiness
    pub has_runtime: bool,
}

fn selector(s: &'static str) -> Selector {
    // Only ever called with literal selectors below
    Selector::parse(s).expect("static selector")
}

impl PageDocument {
    /// Parse page markup.
    ///
    /// Cards are `.link-card[data-link]`; social links are `.social-link`
    /// elements whose `<i>` icon class names the platform. Elements without a
    /// resolvable name are skipped.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = document
            .select(&selector("title"))
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let icon_sel = selector("i");
        let focusables = document
            .select(&selector(FOCUSABLE_SELECTOR))
            .filter_map(|el| focusable_for(el, &icon_sel))
            .collect();

        let has_profile_section = document
            .select(&selector(".profile-section"))
            .next()
            .is_some();

        let has_runtime = document
            .root_element()
            .value()
            .attr(RUNTIME_ATTRIBUTE)
            .is_some();

        Self {
            title,
            focusables,
            has_profile_section,
            has_runtime,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &str> {
        self.focusables.iter().filter_map(|f| match f {
            Focusable::Card(name) => Some(name.as_str()),
            Focusable::Social(_) => None,
        })
    }

    pub fn socials(&self) -> impl Iterator<Item = &str> {
        self.focusables.iter().filter_map(|f| match f {
            Focusable::Social(name) => Some(name.as_str()),
            Focusable::Card(_) => None,
        })
    }

    pub fn focus_ring(&self) -> FocusRing {
        FocusRing::new(self.focusables.clone())
    }
}

fn focusable_for(el: ElementRef<'_>, icon_sel: &Selector) -> Option<Focusable> {
    let value = el.value();
    if value.classes().any(|c| c == "link-card") {
        return value
            .attr("data-link")
            .map(|name| Focusable::Card(name.to_string()));
    }

    el.select(icon_sel)
        .next()
        .and_then(|icon| icon.value().attr("class"))
        .and_then(platform_from_icon)
        .map(|p| Focusable::Social(p.to_string()))
}
