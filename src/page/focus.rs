//! Tab-order traversal over the page's interactive elements

use serde::Serialize;

/// Selector matching every focusable element, in document order
pub const FOCUSABLE_SELECTOR: &str = ".link-card, .social-link";

/// An interactive element, identified by its binding name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Focusable {
    Card(String),
    Social(String),
}

/// Ordered ring of focusable elements.
///
/// `step` returns the index to move focus to, or `None` when the browser's
/// default Tab handling should run instead (past either end of the ring).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FocusRing {
    order: Vec<Focusable>,
}

impl FocusRing {
    pub fn new(order: Vec<Focusable>) -> Self {
        Self { order }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[Focusable] {
        &self.order
    }

    pub fn get(&self, index: usize) -> Option<&Focusable> {
        self.order.get(index)
    }

    pub fn position(&self, element: &Focusable) -> Option<usize> {
        self.order.iter().position(|e| e == element)
    }

    /// Append a card after the last existing card (cards precede socials in the page)
    pub fn insert_card(&mut self, name: impl Into<String>) {
        let at = self
            .order
            .iter()
            .rposition(|e| matches!(e, Focusable::Card(_)))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.order.insert(at, Focusable::Card(name.into()));
    }

    /// Next focus index for Tab (`backward == false`) or Shift+Tab.
    ///
    /// `current` is the index of the focused element, `None` when focus is
    /// outside the ring. Tab from outside enters at the first element.
    pub fn step(&self, current: Option<usize>, backward: bool) -> Option<usize> {
        if backward {
            match current {
                Some(i) if i > 0 && i < self.order.len() => Some(i - 1),
                _ => None,
            }
        } else {
            match current {
                None if !self.order.is_empty() => Some(0),
                Some(i) if i + 1 < self.order.len() => Some(i + 1),
                _ => None,
            }
        }
    }
}
