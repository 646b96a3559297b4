#![forbid(unsafe_code)]

//! The focus ledger: which result is current, and its visual state.
//!
//! The ledger owns the logical focus (an index into the result list) and is
//! the only component that moves the highlight class. Native focus and the
//! scroll position belong to the page; the ledger touches them only through
//! [`Page`] and [`ViewportScroller`], and never caches them.
//!
//! # State Machine
//!
//! ```text
//!   ┌───────────┐   focus(i), i < n    ┌────────────┐
//!   │ unfocused │ ───────────────────▶ │ focused(i) │ ◀─┐ focus(j), j < n
//!   │   None    │ ◀─────────────────── │            │ ──┘
//!   └───────────┘   focus(i), i >= n   └────────────┘
//!                   rebuild()
//! ```
//!
//! # Invariants
//!
//! 1. At most one element carries a highlight class at any time.
//! 2. `focused_index()` is `Some(i)` only with `i < len()` right after a
//!    focus operation.
//! 3. With `scroll` requested, if bringing the *current* result into view
//!    actually scrolls, the operation stops there: the highlight does not
//!    move ahead of what the user can see.
//! 4. An empty list makes every operation except reload a no-op, apart
//!    from dropping focus and highlight left over from a longer list.

use crate::page::Page;
use crate::result::ResultRecord;
use crate::scroller::ViewportScroller;
use crate::source::ResultSource;

/// Class that hides the browser focus ring on an anchor whose result is
/// already highlighted.
pub const OUTLINE_SUPPRESSION_CLASS: &str = "serpnav-no-outline";

/// Collaborators a ledger operation needs.
pub struct FocusContext<'a, P: Page> {
    pub page: &'a P,
    pub source: &'a dyn ResultSource<P>,
    pub scroller: ViewportScroller,
}

impl<'a, P: Page> FocusContext<'a, P> {
    /// Context with the scroller the source calls for.
    #[must_use]
    pub fn new(page: &'a P, source: &'a dyn ResultSource<P>) -> Self {
        Self {
            page,
            source,
            scroller: ViewportScroller::for_source(source),
        }
    }

    fn ensure_visible(&self, element: &P::Element) -> bool {
        let margin = self.source.top_margin(self.page, element);
        self.scroller.ensure_visible(self.page, element, margin)
    }
}

/// What a ledger operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Nothing happened (empty list, or already at the end without wrap).
    Unchanged,
    /// The current result was scrolled into view; focus did not move.
    ScrolledToCurrent,
    /// The index did not resolve; focus is now unset.
    Cleared,
    /// Focus moved to this index.
    Focused(usize),
    /// Ran off the top: the page was scrolled to y=0, focus kept.
    ScrolledToTop,
}

/// Logical focus over the current result list.
pub struct FocusLedger<P: Page> {
    results: Vec<ResultRecord<P::Element>>,
    focused: Option<usize>,
    /// Record whose classes were last applied; survives list replacement so
    /// the classes can still be removed.
    highlighted: Option<ResultRecord<P::Element>>,
    hide_outline: bool,
}

impl<P: Page> std::fmt::Debug for FocusLedger<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusLedger")
            .field("len", &self.results.len())
            .field("focused", &self.focused)
            .field("hide_outline", &self.hide_outline)
            .finish()
    }
}

impl<P: Page> FocusLedger<P> {
    #[must_use]
    pub fn new(hide_outline: bool) -> Self {
        Self {
            results: Vec::new(),
            focused: None,
            highlighted: None,
            hide_outline,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn results(&self) -> &[ResultRecord<P::Element>] {
        &self.results
    }

    #[inline]
    #[must_use]
    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    /// Record at the focused index, if it still exists.
    #[must_use]
    pub fn focused(&self) -> Option<&ResultRecord<P::Element>> {
        self.focused.and_then(|i| self.results.get(i))
    }

    /// Refetch results from the source. Focus is left as is.
    pub fn reload(&mut self, ctx: &FocusContext<'_, P>) {
        self.results = ctx.source.results(ctx.page);
        tracing::debug!(
            message = "ledger.reload",
            source = ctx.source.name(),
            len = self.results.len(),
            focused = ?self.focused
        );
    }

    /// Drop all state and refetch: highlight removed, focus unset.
    pub fn rebuild(&mut self, ctx: &FocusContext<'_, P>) {
        self.clear_highlight(ctx.page);
        self.focused = None;
        self.reload(ctx);
    }

    /// Focus the result at `index`.
    pub fn focus(&mut self, ctx: &FocusContext<'_, P>, index: usize, scroll: bool) -> FocusOutcome {
        let outcome = self.focus_inner(ctx, index, scroll);
        tracing::debug!(message = "ledger.focus", index, scroll, outcome = ?outcome);
        outcome
    }

    fn focus_inner(&mut self, ctx: &FocusContext<'_, P>, index: usize, scroll: bool) -> FocusOutcome {
        if self.results.is_empty() {
            return self.drop_stale(ctx.page);
        }

        if scroll
            && let Some(current) = self.focused()
            && ctx.ensure_visible(&current.container)
        {
            return FocusOutcome::ScrolledToCurrent;
        }

        self.clear_highlight(ctx.page);

        let Some(record) = self.results.get(index).cloned() else {
            self.focused = None;
            return FocusOutcome::Cleared;
        };

        ctx.page.add_class(&record.highlighted, &record.highlight_class);
        if self.hide_outline || record.anchor_is_separate() {
            ctx.page.add_class(&record.anchor, OUTLINE_SUPPRESSION_CLASS);
        }
        ctx.page.focus_without_scroll(&record.anchor);
        if scroll {
            ctx.ensure_visible(&record.container);
        }

        self.highlighted = Some(record);
        self.focused = Some(index);
        FocusOutcome::Focused(index)
    }

    /// Move to the next result; from nothing focused, go to the first.
    pub fn focus_next(&mut self, ctx: &FocusContext<'_, P>, wrap: bool) -> FocusOutcome {
        let len = self.results.len();
        if len == 0 {
            return self.drop_stale(ctx.page);
        }
        match self.focused {
            None => self.focus(ctx, 0, true),
            Some(i) if i + 1 == len && wrap => self.focus(ctx, 0, true),
            Some(i) if i + 1 == len => FocusOutcome::Unchanged,
            // Past the end after the list shrank: this clears focus.
            Some(i) => self.focus(ctx, i + 1, true),
        }
    }

    /// Move to the previous result. At the top (or with nothing focused)
    /// either wrap to the last result or scroll the page home.
    pub fn focus_previous(&mut self, ctx: &FocusContext<'_, P>, wrap: bool) -> FocusOutcome {
        let len = self.results.len();
        if len == 0 {
            return self.drop_stale(ctx.page);
        }
        match self.focused {
            Some(i) if i > 0 => self.focus(ctx, i - 1, true),
            _ if wrap => self.focus(ctx, len - 1, true),
            _ => {
                ctx.page.scroll_to_top();
                tracing::debug!(message = "ledger.scroll_to_top", focused = ?self.focused);
                FocusOutcome::ScrolledToTop
            }
        }
    }

    /// Return native focus to the focused result's anchor.
    pub fn refocus(&self, page: &P) -> bool {
        match self.focused() {
            Some(record) => {
                page.focus_without_scroll(&record.anchor);
                true
            }
            None => false,
        }
    }

    /// The list emptied under a focused result: unset focus and highlight.
    fn drop_stale(&mut self, page: &P) -> FocusOutcome {
        if self.focused.is_none() && self.highlighted.is_none() {
            return FocusOutcome::Unchanged;
        }
        self.clear_highlight(page);
        self.focused = None;
        tracing::debug!(message = "ledger.stale_cleared");
        FocusOutcome::Cleared
    }

    fn clear_highlight(&mut self, page: &P) {
        if let Some(previous) = self.highlighted.take() {
            page.remove_class(&previous.highlighted, &previous.highlight_class);
            page.remove_class(&previous.highlighted, OUTLINE_SUPPRESSION_CLASS);
            page.remove_class(&previous.anchor, OUTLINE_SUPPRESSION_CLASS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ScrollAlign;
    use crate::simulator::{PageSimulator, SimEvent, fixture_page, fixture_profile};
    use crate::surfaces::{DEFAULT_HIGHLIGHT_CLASS, HighlightTarget, SelectorSource};

    fn setup(n: usize) -> (PageSimulator, SelectorSource) {
        (fixture_page(n), SelectorSource::new(fixture_profile()))
    }

    fn loaded(ctx: &FocusContext<'_, PageSimulator>) -> FocusLedger<PageSimulator> {
        let mut ledger = FocusLedger::new(false);
        ledger.reload(ctx);
        ledger
    }

    #[test]
    fn focus_highlights_and_focuses_anchor() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        assert_eq!(ledger.focus(&ctx, 1, false), FocusOutcome::Focused(1));
        let record = ledger.focused().unwrap().clone();
        assert!(page.has_class(&record.container, DEFAULT_HIGHLIGHT_CLASS));
        // Container highlight: the anchor's own outline is suppressed.
        assert!(page.has_class(&record.anchor, OUTLINE_SUPPRESSION_CLASS));
        assert_eq!(page.active_element(), Some(record.anchor));
        assert_eq!(page.events(), vec![SimEvent::Focus(record.anchor)]);
    }

    #[test]
    fn anchor_highlight_keeps_outline_unless_hidden() {
        let page = fixture_page(2);
        let mut profile = fixture_profile();
        profile.highlight = HighlightTarget::Anchor;
        let source = SelectorSource::new(profile);
        let ctx = FocusContext::new(&page, &source);

        let mut ledger = loaded(&ctx);
        ledger.focus(&ctx, 0, false);
        let anchor = ledger.focused().unwrap().anchor;
        assert!(!page.has_class(&anchor, OUTLINE_SUPPRESSION_CLASS));

        let mut hiding = FocusLedger::new(true);
        hiding.reload(&ctx);
        hiding.focus(&ctx, 0, false);
        assert!(page.has_class(&anchor, OUTLINE_SUPPRESSION_CLASS));
    }

    #[test]
    fn moving_focus_removes_previous_classes() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 0, false);
        let first = ledger.focused().unwrap().clone();
        ledger.focus(&ctx, 2, false);
        assert!(page.classes(first.container).is_empty());
        assert!(page.classes(first.anchor).is_empty());
        assert_eq!(page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS).len(), 1);
    }

    #[test]
    fn out_of_range_clears_focus() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 0, false);
        assert_eq!(ledger.focus(&ctx, 7, false), FocusOutcome::Cleared);
        assert_eq!(ledger.focused_index(), None);
        assert!(page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS).is_empty());
    }

    #[test]
    fn scroll_to_offscreen_current_stops_the_move() {
        let (page, source) = setup(5);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        // Result 3 (650..770) sits below the 600px viewport.
        ledger.focus(&ctx, 3, false);
        page.clear_events();

        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::ScrolledToCurrent);
        assert_eq!(ledger.focused_index(), Some(3));
        let current = ledger.focused().unwrap().container;
        assert_eq!(
            page.events(),
            vec![SimEvent::ScrollIntoView {
                element: current,
                align: ScrollAlign::Bottom
            }]
        );

        // Now visible, the next press moves.
        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::Focused(4));
    }

    #[test]
    fn next_stops_at_end_without_wrap() {
        let (page, source) = setup(2);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::Focused(0));
        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::Focused(1));
        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::Unchanged);
        assert_eq!(ledger.focus_next(&ctx, true), FocusOutcome::Focused(0));
    }

    #[test]
    fn previous_at_top_scrolls_home_or_wraps() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 0, false);
        page.scroll_to(50.0);
        page.clear_events();
        assert_eq!(ledger.focus_previous(&ctx, false), FocusOutcome::ScrolledToTop);
        assert_eq!(ledger.focused_index(), Some(0));
        assert_eq!(page.events(), vec![SimEvent::ScrollToTop]);
        assert_eq!(page.scroll_y(), 0.0);

        assert_eq!(ledger.focus_previous(&ctx, true), FocusOutcome::Focused(2));
    }

    #[test]
    fn empty_list_is_inert() {
        let (page, source) = setup(0);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        assert_eq!(ledger.focus(&ctx, 0, true), FocusOutcome::Unchanged);
        assert_eq!(ledger.focus_next(&ctx, true), FocusOutcome::Unchanged);
        assert_eq!(ledger.focus_previous(&ctx, false), FocusOutcome::Unchanged);
        assert!(page.events().is_empty());
    }

    #[test]
    fn emptied_list_drops_stale_focus() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 2, false);
        let old = ledger.focused().unwrap().clone();
        for record in ledger.results().to_vec() {
            page.detach(record.container);
        }
        ledger.reload(&ctx);
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.focused_index(), Some(2));

        assert_eq!(ledger.focus(&ctx, 0, false), FocusOutcome::Cleared);
        assert_eq!(ledger.focused_index(), None);
        assert!(page.classes(old.container).is_empty());
        assert_eq!(ledger.focus_next(&ctx, true), FocusOutcome::Unchanged);
    }

    #[test]
    fn shrunk_list_clears_index_past_the_end() {
        let (page, source) = setup(5);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 4, false);
        for record in ledger.results()[2..].to_vec() {
            page.detach(record.container);
        }
        ledger.reload(&ctx);
        assert_eq!(ledger.len(), 2);

        // Index 4 is past the end: both directions clear instead of clamping.
        assert_eq!(ledger.focus_previous(&ctx, false), FocusOutcome::Cleared);
        assert_eq!(ledger.focused_index(), None);
        assert!(page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS).is_empty());

        ledger.focus(&ctx, 1, false);
        page.detach(ledger.results()[1].container);
        ledger.reload(&ctx);
        assert_eq!(ledger.focus_next(&ctx, false), FocusOutcome::Cleared);
        assert_eq!(ledger.focused_index(), None);
    }

    #[test]
    fn rebuild_clears_highlight_and_focus() {
        let (page, source) = setup(3);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 1, false);
        let old = ledger.focused().unwrap().clone();
        page.detach(old.container);
        ledger.rebuild(&ctx);

        assert_eq!(ledger.focused_index(), None);
        assert_eq!(ledger.len(), 2);
        assert!(page.classes(old.container).is_empty());
    }

    #[test]
    fn refocus_returns_native_focus_to_anchor() {
        let (page, source) = setup(2);
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);
        assert!(!ledger.refocus(&page));

        ledger.focus(&ctx, 1, false);
        page.set_active(None);
        assert!(ledger.refocus(&page));
        assert_eq!(page.active_element(), Some(ledger.focused().unwrap().anchor));
    }
}
