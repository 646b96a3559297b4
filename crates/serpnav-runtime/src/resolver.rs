#![forbid(unsafe_code)]

//! Which element a "navigate" action applies to.
//!
//! The user may have tabbed onto a sub-link inside a result; explicit native
//! focus wins over the highlighted result's anchor. Opening in a new tab
//! needs an address, so [`TargetPolicy::LinkOnly`] skips a natively focused
//! element that is not a hyperlink.

use crate::ledger::FocusLedger;
use crate::page::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Any natively focused element.
    AnyFocused,
    /// Only a natively focused hyperlink with a target address.
    LinkOnly,
}

/// Resolve the navigation target. `None` only when nothing is natively
/// focused (or eligible) and no result is focused either.
pub fn resolve_target<P: Page>(
    page: &P,
    ledger: &FocusLedger<P>,
    policy: TargetPolicy,
) -> Option<P::Element> {
    if let Some(active) = page.active_element() {
        let eligible = match policy {
            TargetPolicy::AnyFocused => true,
            TargetPolicy::LinkOnly => page.link_address(&active).is_some(),
        };
        if eligible {
            return Some(active);
        }
    }
    ledger.focused().map(|record| record.anchor.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::FocusContext;
    use crate::simulator::{NodeSpec, PageSimulator, fixture_page, fixture_profile};
    use crate::surfaces::SelectorSource;

    fn focused_ledger(page: &PageSimulator, index: usize) -> FocusLedger<PageSimulator> {
        let source = SelectorSource::new(fixture_profile());
        let ctx = FocusContext::new(page, &source);
        let mut ledger = FocusLedger::new(false);
        ledger.reload(&ctx);
        ledger.focus(&ctx, index, false);
        ledger
    }

    #[test]
    fn native_focus_wins() {
        let page = fixture_page(3);
        let ledger = focused_ledger(&page, 0);
        let sub = page.insert(
            ledger.results()[1].container,
            NodeSpec::new("a").attr("href", "https://r/sub"),
        );
        page.set_active(Some(sub));
        assert_eq!(resolve_target(&page, &ledger, TargetPolicy::AnyFocused), Some(sub));
        assert_eq!(resolve_target(&page, &ledger, TargetPolicy::LinkOnly), Some(sub));
    }

    #[test]
    fn link_only_skips_non_links() {
        let page = fixture_page(3);
        let ledger = focused_ledger(&page, 2);
        let button = page.insert(page.body(), NodeSpec::new("button"));
        page.set_active(Some(button));

        assert_eq!(resolve_target(&page, &ledger, TargetPolicy::AnyFocused), Some(button));
        assert_eq!(
            resolve_target(&page, &ledger, TargetPolicy::LinkOnly),
            Some(ledger.results()[2].anchor)
        );
    }

    #[test]
    fn falls_back_to_focused_anchor() {
        let page = fixture_page(2);
        let ledger = focused_ledger(&page, 1);
        page.set_active(None);
        assert_eq!(
            resolve_target(&page, &ledger, TargetPolicy::AnyFocused),
            Some(ledger.results()[1].anchor)
        );
    }

    #[test]
    fn nothing_to_resolve() {
        let page = fixture_page(2);
        let ledger = focused_ledger(&page, 9);
        page.set_active(None);
        assert_eq!(resolve_target(&page, &ledger, TargetPolicy::AnyFocused), None);
    }
}
