//! Property-based invariant tests for the focus ledger.
//!
//! These tests verify invariants that must hold for any result layout:
//!
//! 1. n wrapping `focus_next` calls return to the starting index.
//! 2. `focus_previous` at index 0 without wrap keeps focus and scrolls to y=0.
//! 3. At most one element is highlighted, and it is the focused result.
//! 4. Focusing an index outside `[0, n)` clears focus and all highlights.
//! 5. When results disappear between operations, every focus operation
//!    leaves the index inside the list (or unset) and the highlight on the
//!    focused result; on an empty list nothing scrolls and focus is unset.
//!
//! Result heights stay below the viewport height, so a result brought into
//! view is always fully visible.

use proptest::prelude::*;
use serpnav_runtime::simulator::{PageSimulator, SimEvent, fixture_profile};
use serpnav_runtime::surfaces::DEFAULT_HIGHLIGHT_CLASS;
use serpnav_runtime::{FocusContext, FocusLedger, FocusOutcome, Page, SelectorSource};

const VIEWPORT: f64 = 600.0;

// ── Helpers ─────────────────────────────────────────────────────────────

fn heights(max_len: usize) -> impl Strategy<Value = Vec<u16>> {
    proptest::collection::vec(40u16..=400, 1..=max_len)
}

fn page_with(heights: &[u16]) -> PageSimulator {
    let page = PageSimulator::new(VIEWPORT);
    let mut top = 10.0;
    for (i, &h) in heights.iter().enumerate() {
        page.push_result(top, f64::from(h), &format!("https://r/{i}"));
        top += f64::from(h) + 10.0;
    }
    page
}

fn loaded(ctx: &FocusContext<'_, PageSimulator>) -> FocusLedger<PageSimulator> {
    let mut ledger = FocusLedger::new(false);
    ledger.reload(ctx);
    ledger
}

#[derive(Debug, Clone)]
enum Op {
    Next(bool),
    Previous(bool),
    Focus(usize, bool),
    Reload,
    Rebuild,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Next),
        any::<bool>().prop_map(Op::Previous),
        (0usize..20, any::<bool>()).prop_map(|(i, s)| Op::Focus(i, s)),
        Just(Op::Reload),
        Just(Op::Rebuild),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Wrapping next is cyclic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wrapping_next_is_cyclic(hs in heights(12), start_seed in any::<usize>()) {
        let page = page_with(&hs);
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);
        let n = hs.len();
        let start = start_seed % n;

        prop_assert_eq!(ledger.focus(&ctx, start, true), FocusOutcome::Focused(start));
        for step in 1..=n {
            let outcome = ledger.focus_next(&ctx, true);
            prop_assert_eq!(outcome, FocusOutcome::Focused((start + step) % n));
        }
        prop_assert_eq!(ledger.focused_index(), Some(start));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Previous at the top goes home
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn previous_at_top_scrolls_home(hs in heights(12), scroll in 0.0f64..5000.0) {
        let page = page_with(&hs);
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        ledger.focus(&ctx, 0, false);
        page.scroll_to(scroll);
        page.clear_events();

        prop_assert_eq!(ledger.focus_previous(&ctx, false), FocusOutcome::ScrolledToTop);
        prop_assert_eq!(ledger.focused_index(), Some(0));
        prop_assert_eq!(page.events(), vec![SimEvent::ScrollToTop]);
        prop_assert_eq!(page.scroll_y(), 0.0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Highlight uniqueness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn highlight_tracks_focus(hs in heights(10), ops in proptest::collection::vec(op(), 1..40)) {
        let page = page_with(&hs);
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);

        for op in &ops {
            match *op {
                Op::Next(wrap) => { ledger.focus_next(&ctx, wrap); }
                Op::Previous(wrap) => { ledger.focus_previous(&ctx, wrap); }
                Op::Focus(i, scroll) => { ledger.focus(&ctx, i, scroll); }
                Op::Reload => ledger.reload(&ctx),
                Op::Rebuild => ledger.rebuild(&ctx),
            }

            let highlighted = page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS);
            prop_assert!(highlighted.len() <= 1, "after {:?}: {:?}", op, highlighted);
            let expected: Vec<_> = ledger.focused().map(|r| r.container).into_iter().collect();
            prop_assert_eq!(highlighted, expected, "after {:?}", op);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Out-of-range focus clears
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn out_of_range_focus_clears(
        hs in heights(10),
        current_seed in any::<usize>(),
        beyond in 0usize..100,
        scroll in any::<bool>(),
    ) {
        let page = page_with(&hs);
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);
        let n = hs.len();

        ledger.focus(&ctx, current_seed % n, true);
        prop_assert_eq!(ledger.focus(&ctx, n + beyond, scroll), FocusOutcome::Cleared);
        prop_assert_eq!(ledger.focused_index(), None);
        prop_assert!(page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS).is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Shrinking lists
// ═════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum ShrinkOp {
    Next(bool),
    Previous(bool),
    Focus(usize, bool),
    /// Remove one result from the page, then reload.
    Detach(usize),
    /// Remove every result from the page, then reload.
    Empty,
    Rebuild,
}

fn shrink_op() -> impl Strategy<Value = ShrinkOp> {
    prop_oneof![
        3 => any::<bool>().prop_map(ShrinkOp::Next),
        3 => any::<bool>().prop_map(ShrinkOp::Previous),
        2 => (0usize..12, any::<bool>()).prop_map(|(i, s)| ShrinkOp::Focus(i, s)),
        3 => (0usize..12).prop_map(ShrinkOp::Detach),
        1 => Just(ShrinkOp::Empty),
        1 => Just(ShrinkOp::Rebuild),
    ]
}

proptest! {
    #[test]
    fn shrinking_list_keeps_focus_in_bounds(
        hs in heights(8),
        start_seed in any::<usize>(),
        ops in proptest::collection::vec(shrink_op(), 1..40),
    ) {
        let page = page_with(&hs);
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(&page, &source);
        let mut ledger = loaded(&ctx);
        ledger.focus(&ctx, start_seed % hs.len(), false);

        for op in &ops {
            page.clear_events();
            let outcome = match *op {
                ShrinkOp::Next(wrap) => Some(ledger.focus_next(&ctx, wrap)),
                ShrinkOp::Previous(wrap) => Some(ledger.focus_previous(&ctx, wrap)),
                ShrinkOp::Focus(i, scroll) => Some(ledger.focus(&ctx, i, scroll)),
                ShrinkOp::Detach(k) => {
                    let containers: Vec<_> = ledger.results().iter().map(|r| r.container).collect();
                    if !containers.is_empty() {
                        page.detach(containers[k % containers.len()]);
                    }
                    ledger.reload(&ctx);
                    None
                }
                ShrinkOp::Empty => {
                    for record in ledger.results().to_vec() {
                        page.detach(record.container);
                    }
                    ledger.reload(&ctx);
                    None
                }
                ShrinkOp::Rebuild => {
                    ledger.rebuild(&ctx);
                    prop_assert_eq!(ledger.focused_index(), None);
                    None
                }
            };

            let highlighted = page.elements_with_class(DEFAULT_HIGHLIGHT_CLASS);
            prop_assert!(highlighted.len() <= 1, "after {:?}: {:?}", op, highlighted);

            let Some(outcome) = outcome else { continue };
            let len = ledger.len();
            prop_assert!(
                ledger.focused_index().is_none_or(|i| i < len),
                "after {:?}: {:?} with len {}", op, ledger.focused_index(), len
            );
            if len == 0 {
                prop_assert_eq!(ledger.focused_index(), None);
                prop_assert!(page.events().is_empty(), "after {:?}: {:?}", op, page.events());
            }
            match outcome {
                FocusOutcome::Focused(i) => {
                    prop_assert_eq!(highlighted, vec![ledger.results()[i].container]);
                }
                FocusOutcome::Cleared => {
                    prop_assert_eq!(ledger.focused_index(), None);
                    prop_assert!(highlighted.is_empty());
                }
                _ => {}
            }
        }
    }
}
