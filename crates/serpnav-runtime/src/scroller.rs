#![forbid(unsafe_code)]

//! Minimal-movement viewport synchronization.
//!
//! [`ViewportScroller::ensure_visible`] brings an element into view only
//! when it is clipped, and then by the smallest movement that clears the
//! reserved margins:
//!
//! ```text
//!   ┌──────────────────────┐  ─┐
//!   │ fixed header         │   │ top_margin
//!   ├──────────────────────┤  ─┘
//!   │                      │
//!   │   visible region     │   element fully here: no scroll
//!   │                      │
//!   ├──────────────────────┤  ─┐
//!   │ bottom overlay       │   │ bottom_margin
//!   └──────────────────────┘  ─┘
//! ```
//!
//! Clipped at the top: align the element with the viewport top, then shift
//! up by `top_margin`. Clipped at the bottom: align with the viewport bottom,
//! then shift down by `bottom_margin`. The two branches are exclusive.
//!
//! # Invariants
//!
//! - Never mutates element attributes; only the document scroll position.
//! - Reports a scroll only when the offset moved by more than
//!   [`SCROLL_EPSILON`], so sub-pixel rounding is not mistaken for movement.

use crate::page::{Page, ScrollAlign};
use crate::source::ResultSource;

/// Minimum scroll delta (CSS pixels) that counts as having scrolled.
pub const SCROLL_EPSILON: f64 = 0.01;

/// Bottom margin used on surfaces that draw an overlay near the bottom edge.
pub const OVERLAY_BOTTOM_MARGIN: f64 = 28.0;

/// Scroll policy for one surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportScroller {
    bottom_margin: f64,
}

impl ViewportScroller {
    #[must_use]
    pub const fn new() -> Self {
        Self { bottom_margin: 0.0 }
    }

    /// Reserve `margin` pixels at the bottom of the viewport.
    #[must_use]
    pub const fn with_bottom_margin(mut self, margin: f64) -> Self {
        self.bottom_margin = margin;
        self
    }

    /// Scroller configured for a result source.
    #[must_use]
    pub fn for_source<P: Page>(source: &dyn ResultSource<P>) -> Self {
        if source.bottom_overlay() {
            Self::new().with_bottom_margin(OVERLAY_BOTTOM_MARGIN)
        } else {
            Self::new()
        }
    }

    #[inline]
    #[must_use]
    pub const fn bottom_margin(&self) -> f64 {
        self.bottom_margin
    }

    /// Scroll `element` into view if it is clipped. Returns true iff the
    /// document actually scrolled.
    pub fn ensure_visible<P: Page>(&self, page: &P, element: &P::Element, top_margin: f64) -> bool {
        let rect = page.bounding_rect(element);
        let before = page.scroll_y();

        if rect.top() < top_margin {
            page.scroll_into_view(element, ScrollAlign::Top);
            if top_margin != 0.0 {
                page.scroll_by(-top_margin);
            }
        } else if rect.bottom() + self.bottom_margin > page.viewport_height() {
            page.scroll_into_view(element, ScrollAlign::Bottom);
            if self.bottom_margin != 0.0 {
                page.scroll_by(self.bottom_margin);
            }
        } else {
            return false;
        }

        let delta = page.scroll_y() - before;
        let scrolled = delta.abs() > SCROLL_EPSILON;
        tracing::trace!(
            message = "scroller.ensure_visible",
            top = rect.top(),
            bottom = rect.bottom(),
            top_margin,
            delta,
            scrolled
        );
        scrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{NodeSpec, PageSimulator};

    fn page_with_result(top: f64, height: f64) -> (PageSimulator, crate::simulator::SimElement) {
        let page = PageSimulator::new(600.0);
        let body = page.body();
        page.insert(body, NodeSpec::new("div").at(0.0, 5000.0));
        let el = page.insert(body, NodeSpec::new("div").at(top, height));
        (page, el)
    }

    #[test]
    fn visible_element_does_not_scroll() {
        let (page, el) = page_with_result(100.0, 80.0);
        assert!(!ViewportScroller::new().ensure_visible(&page, &el, 0.0));
        assert_eq!(page.scroll_y(), 0.0);
        assert!(page.events().is_empty());
    }

    #[test]
    fn below_viewport_aligns_bottom() {
        let (page, el) = page_with_result(900.0, 100.0);
        assert!(ViewportScroller::new().ensure_visible(&page, &el, 0.0));
        assert_eq!(page.scroll_y(), 400.0);
    }

    #[test]
    fn above_viewport_aligns_top_minus_margin() {
        let (page, el) = page_with_result(1000.0, 100.0);
        page.scroll_to(2000.0);
        page.clear_events();
        assert!(ViewportScroller::new().ensure_visible(&page, &el, 60.0));
        assert_eq!(page.scroll_y(), 940.0);
    }

    #[test]
    fn header_overlap_counts_as_clipped() {
        let (page, el) = page_with_result(1030.0, 100.0);
        page.scroll_to(1000.0);
        assert!(ViewportScroller::new().ensure_visible(&page, &el, 60.0));
        assert_eq!(page.scroll_y(), 970.0);
    }

    #[test]
    fn bottom_margin_shifts_further_down() {
        let (page, el) = page_with_result(900.0, 100.0);
        let scroller = ViewportScroller::new().with_bottom_margin(OVERLAY_BOTTOM_MARGIN);
        assert!(scroller.ensure_visible(&page, &el, 0.0));
        assert_eq!(page.scroll_y(), 400.0 + OVERLAY_BOTTOM_MARGIN);
    }

    #[test]
    fn clamped_scroll_reports_no_movement() {
        let (page, el) = page_with_result(10.0, 40.0);
        // Element sits under the header at the very top; nothing can move.
        assert!(!ViewportScroller::new().ensure_visible(&page, &el, 60.0));
        assert_eq!(page.scroll_y(), 0.0);
    }
}
