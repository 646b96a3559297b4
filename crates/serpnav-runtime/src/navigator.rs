#![forbid(unsafe_code)]

//! Result navigation orchestrator.
//!
//! [`Navigator`] turns key events into intents and intents into ledger
//! operations. It also decides what gets focus when the result list is
//! (re)built and records where the user was when they followed a result.
//!
//! # Lifecycle
//!
//! ```text
//!   new() ──▶ init() ──▶ handle_key() / on_results_changed() ...
//!               │
//!               ├─ load PersistedNavigation (once)
//!               └─ rebuild: restore | auto-select first | wait for first key
//! ```
//!
//! # Initial focus
//!
//! 1. A stored record whose `lastQueryUrl` equals the current address wins:
//!    its index is focused *with* scrolling. The record is consumed by the
//!    first build that finds results.
//! 2. Otherwise, with `autoSelectFirst`, result 0 is highlighted without
//!    scrolling.
//! 3. Otherwise nothing is focused and the first next/previous intent
//!    focuses result 0.
//!
//! # Key dispatch
//!
//! While an editable element has native focus, only chords with a command
//! modifier and Escape reach the matcher; everything else is left to the
//! page so typing works.

use serpnav_core::{
    Intent, KeyCode, KeyEvent, MatchOutcome, Options, SequenceMatcher, TimeRange,
};
use web_time::Instant;

use crate::ledger::{FocusContext, FocusLedger, FocusOutcome};
use crate::page::Page;
use crate::resolver::{TargetPolicy, resolve_target};
use crate::scroller::ViewportScroller;
use crate::source::{ChangeKind, ChangeWatch, ResultSource};
use crate::state_persistence::{NavigationStore, PersistedNavigation};
use crate::tabs::{OpenTabRequest, TabOpener};

/// Page plus the adapter describing it.
struct Host<P: Page> {
    page: P,
    source: Box<dyn ResultSource<P>>,
    scroller: ViewportScroller,
}

impl<P: Page> Host<P> {
    fn ctx(&self) -> FocusContext<'_, P> {
        FocusContext {
            page: &self.page,
            source: self.source.as_ref(),
            scroller: self.scroller,
        }
    }
}

/// Keyboard navigation over one results page.
pub struct Navigator<P: Page> {
    host: Host<P>,
    ledger: FocusLedger<P>,
    options: Options,
    store: NavigationStore,
    tabs: Box<dyn TabOpener>,
    matcher: SequenceMatcher,
    pending_restore: Option<PersistedNavigation>,
    is_first_navigation: bool,
}

impl<P: Page> std::fmt::Debug for Navigator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("source", &self.host.source.name())
            .field("ledger", &self.ledger)
            .field("is_first_navigation", &self.is_first_navigation)
            .finish()
    }
}

impl<P: Page> Navigator<P> {
    /// Create a navigator. Call [`init`](Self::init) before dispatching.
    pub fn new(
        page: P,
        source: impl ResultSource<P> + 'static,
        options: Options,
        store: NavigationStore,
        tabs: impl TabOpener + 'static,
    ) -> Self {
        let source: Box<dyn ResultSource<P>> = Box::new(source);
        let scroller = ViewportScroller::for_source(source.as_ref());
        let matcher =
            SequenceMatcher::new(options.sequence_timeout()).with_bindings(options.bindings());
        Self {
            host: Host {
                page,
                source,
                scroller,
            },
            ledger: FocusLedger::new(options.hide_outline),
            is_first_navigation: !options.auto_select_first,
            options,
            store,
            tabs: Box::new(tabs),
            matcher,
            pending_restore: None,
        }
    }

    /// Load the stored navigation record and build the result list.
    pub fn init(&mut self) {
        self.pending_restore = self.store.load();
        tracing::debug!(
            message = "navigator.init",
            source = self.host.source.name(),
            bindings = self.matcher.len(),
            stored = self.pending_restore.is_some()
        );
        self.rebuild();
    }

    // --- accessors ----------------------------------------------------------

    #[must_use]
    pub fn page(&self) -> &P {
        &self.host.page
    }

    #[must_use]
    pub fn ledger(&self) -> &FocusLedger<P> {
        &self.ledger
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        self.host.source.name()
    }

    /// Subtree the host should observe, if the source asks for one.
    #[must_use]
    pub fn change_watch(&self) -> Option<ChangeWatch> {
        self.host.source.change_watch()
    }

    #[must_use]
    pub fn is_first_navigation(&self) -> bool {
        self.is_first_navigation
    }

    // --- result changes -----------------------------------------------------

    /// React to a result-list mutation reported by the host.
    pub fn on_results_changed(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::AppendedOnly => {
                let ctx = self.host.ctx();
                self.ledger.reload(&ctx);
            }
            ChangeKind::Replaced => self.rebuild(),
        }
    }

    fn rebuild(&mut self) {
        let ctx = self.host.ctx();
        self.ledger.rebuild(&ctx);
        self.is_first_navigation = !self.options.auto_select_first;
        if self.ledger.is_empty() {
            return;
        }

        let current_url = self.host.page.current_url();
        let restore = self
            .pending_restore
            .take()
            .filter(|record| record.last_query_url == current_url)
            .and_then(|record| record.last_focused_index);

        if let Some(index) = restore {
            let outcome = self.ledger.focus(&ctx, index, true);
            self.is_first_navigation = false;
            tracing::debug!(message = "navigator.restore", index, outcome = ?outcome);
        } else if self.options.auto_select_first {
            self.ledger.focus(&ctx, 0, false);
        }
    }

    // --- key dispatch -------------------------------------------------------

    /// Dispatch one key event. Returns true when the event was consumed and
    /// the host should suppress the page's default handling.
    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> bool {
        let page = &self.host.page;
        let typing = page
            .active_element()
            .is_some_and(|active| page.is_editable(&active));
        if typing && !event.has_command_modifier() && event.code != KeyCode::Escape {
            self.matcher.reset();
            return false;
        }

        match self.matcher.feed(event, now) {
            MatchOutcome::Matched(intent) => self.handle_intent(intent),
            MatchOutcome::Pending => true,
            MatchOutcome::NoMatch => false,
        }
    }

    /// Perform one intent. Returns whether it applied.
    pub fn handle_intent(&mut self, intent: Intent) -> bool {
        let handled = match intent {
            Intent::FocusNext => self.step(true),
            Intent::FocusPrevious => self.step(false),
            Intent::Navigate => self.navigate(),
            Intent::NavigateNewTab => self.open_in_tab(true),
            Intent::NavigateNewTabBackground => self.open_in_tab(false),
            Intent::FocusSearchBox => self.focus_search_box(),
            Intent::SwitchTab(tab) => {
                let page = &self.host.page;
                match self.host.source.tab_target(page, tab) {
                    Some(target) => {
                        page.click(&target);
                        true
                    }
                    None => false,
                }
            }
            Intent::ChangeTools(range) => self.change_tools(range),
        };
        tracing::debug!(message = "navigator.intent", intent = ?intent, handled);
        handled
    }

    fn step(&mut self, forward: bool) -> bool {
        if self.ledger.is_empty() {
            return false;
        }
        let ctx = self.host.ctx();
        let wrap = self.options.wrap_navigation;
        let outcome = if self.is_first_navigation {
            self.is_first_navigation = false;
            self.ledger.focus(&ctx, 0, true)
        } else if forward {
            self.ledger.focus_next(&ctx, wrap)
        } else {
            self.ledger.focus_previous(&ctx, wrap)
        };
        outcome != FocusOutcome::Unchanged
    }

    fn navigate(&self) -> bool {
        let page = &self.host.page;
        let Some(target) = resolve_target(page, &self.ledger, TargetPolicy::AnyFocused) else {
            return false;
        };
        let record = PersistedNavigation {
            last_query_url: page.current_url(),
            last_focused_index: self.ledger.focused().and(self.ledger.focused_index()),
        };
        // Must land before the click: navigation may be immediate.
        if let Err(err) = self.store.save(&record) {
            tracing::warn!(message = "navigator.persist_failed", error = %err);
        }
        page.click(&target);
        true
    }

    fn open_in_tab(&self, activate: bool) -> bool {
        let page = &self.host.page;
        let Some(address) = resolve_target(page, &self.ledger, TargetPolicy::LinkOnly)
            .and_then(|target| page.link_address(&target))
        else {
            return false;
        };
        self.tabs.open(OpenTabRequest { address, activate });
        true
    }

    fn focus_search_box(&self) -> bool {
        let page = &self.host.page;
        // Already typing: hand focus back to the results.
        if let Some(active) = page.active_element()
            && page.is_editable(&active)
        {
            return self.ledger.refocus(page);
        }
        let Some(input) = page.query_first(self.host.source.search_box_selector()) else {
            return false;
        };
        page.focus_for_typing(&input);
        page.scroll_to_top();
        true
    }

    fn change_tools(&self, range: TimeRange) -> bool {
        let supported = self.host.source.change_tools(&self.host.page, Some(range));
        if !supported {
            tracing::debug!(
                message = "navigator.change_tools_unsupported",
                source = self.host.source.name(),
                range = %range.code()
            );
        }
        supported
    }
}
