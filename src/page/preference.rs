//! Light/dark colour-scheme preference backed by a key/value store

use std::collections::HashMap;

/// Storage key holding the preference
pub const SCHEME_KEY: &str = "theme";

/// Class put on `<body>` in light mode
pub const LIGHT_MODE_CLASS: &str = "light-mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Dark,
    Light,
}

impl ColorScheme {
    /// Only the literal `"light"` selects light mode
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => ColorScheme::Light,
            _ => ColorScheme::Dark,
        }
    }

    pub fn stored_value(self) -> &'static str {
        match self {
            ColorScheme::Dark => "dark",
            ColorScheme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ColorScheme::Dark => ColorScheme::Light,
            ColorScheme::Light => ColorScheme::Dark,
        }
    }

    /// Font Awesome icon shown on the toggle button
    pub fn toggle_icon(self) -> &'static str {
        match self {
            ColorScheme::Dark => "fas fa-moon",
            ColorScheme::Light => "fas fa-sun",
        }
    }
}

/// Minimal string key/value store (the browser's `localStorage` in the page)
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store used at build time and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_unknown_means_dark() {
        assert_eq!(ColorScheme::from_stored(None), ColorScheme::Dark);
        assert_eq!(ColorScheme::from_stored(Some("dark")), ColorScheme::Dark);
        assert_eq!(ColorScheme::from_stored(Some("LIGHT")), ColorScheme::Dark);
        assert_eq!(ColorScheme::from_stored(Some("light")), ColorScheme::Light);
    }

    #[test]
    fn memory_store_round_trips() {
        let mut s = MemoryStore::new();
        assert!(s.get(SCHEME_KEY).is_none());
        s.set(SCHEME_KEY, "light");
        assert_eq!(s.get(SCHEME_KEY).as_deref(), Some("light"));
    }
}
