#![forbid(unsafe_code)]

//! The page capability surface.
//!
//! [`Page`] is the only way the runtime touches the host document: geometry,
//! scroll position, CSS classes, native focus, and navigation. The web host
//! implements it over `web-sys`; tests use the in-memory simulator.
//!
//! # Design Notes
//!
//! - Every method takes `&self`. The document is shared mutable state owned
//!   by the host page, so implementations use interior mutability (or, in
//!   the browser, the DOM itself).
//! - Element handles are non-owning. A handle may refer to a node the host
//!   page has since detached; implementations degrade (empty rectangle,
//!   no-op mutation) instead of failing.
//! - Nothing here caches scroll or focus state across calls.

use std::fmt;

use serpnav_core::Rect;

/// Which viewport edge an element is aligned to when scrolled into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Top,
    Bottom,
}

/// Host document capabilities consumed by the runtime.
pub trait Page {
    /// Non-owning element handle.
    type Element: Clone + PartialEq + fmt::Debug;

    // --- geometry and scrolling -------------------------------------------

    /// Viewport-relative bounding rectangle.
    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Current vertical scroll offset of the document.
    fn scroll_y(&self) -> f64;

    /// Height of the visible viewport.
    fn viewport_height(&self) -> f64;

    fn scroll_into_view(&self, element: &Self::Element, align: ScrollAlign);

    /// Scroll relative to the current position.
    fn scroll_by(&self, dy: f64);

    /// Scroll to the absolute top of the document.
    fn scroll_to_top(&self);

    // --- classes ----------------------------------------------------------

    fn add_class(&self, element: &Self::Element, class: &str);

    fn remove_class(&self, element: &Self::Element, class: &str);

    fn has_class(&self, element: &Self::Element, class: &str) -> bool;

    // --- focus ------------------------------------------------------------

    /// Move native focus without letting the browser scroll.
    fn focus_without_scroll(&self, element: &Self::Element);

    /// Focus a text input and put the caret at the end of its value.
    fn focus_for_typing(&self, element: &Self::Element);

    /// Element holding native focus, if any other than the document body.
    fn active_element(&self) -> Option<Self::Element>;

    /// Whether keystrokes on this element are text entry.
    fn is_editable(&self, element: &Self::Element) -> bool;

    // --- links and navigation ---------------------------------------------

    /// Target address when the element is a hyperlink with one.
    fn link_address(&self, element: &Self::Element) -> Option<String>;

    /// Activate the element as a user click would.
    fn click(&self, element: &Self::Element);

    /// Exact address of the current document.
    fn current_url(&self) -> String;

    fn navigate_to(&self, url: &str);

    // --- queries ----------------------------------------------------------

    /// All elements matching a CSS selector, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    fn query_first(&self, selector: &str) -> Option<Self::Element> {
        self.query_all(selector).into_iter().next()
    }

    /// Descendants of `root` matching a CSS selector, in document order.
    fn query_within(&self, root: &Self::Element, selector: &str) -> Vec<Self::Element>;
}
