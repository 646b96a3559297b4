#![forbid(unsafe_code)]

//! Result source adapters.
//!
//! A [`ResultSource`] knows the markup of one search surface: where the
//! results are, how tall its fixed header is, which elements are its tabs,
//! and how it encodes time-range filters. The ledger and navigator are
//! written once against this trait and never ask which surface is active.

use serde::{Deserialize, Serialize};
use serpnav_core::{Tab, TimeRange};

use crate::page::Page;
use crate::result::ResultRecord;

/// How a watched subtree changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// New results were added after the existing ones (infinite scroll).
    AppendedOnly,
    /// The result list was replaced.
    Replaced,
}

/// Subtree the host should observe for result changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWatch {
    /// Selector of the element whose child list is observed.
    pub selector: String,
    /// How a mutation under it is reported.
    pub kind: ChangeKind,
}

/// Capability set of one supported search surface.
pub trait ResultSource<P: Page> {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Current results in document order.
    fn results(&self, page: &P) -> Vec<ResultRecord<P::Element>>;

    /// Pixels reserved at the top of the viewport (fixed headers).
    fn top_margin(&self, _page: &P, _element: &P::Element) -> f64 {
        0.0
    }

    /// Whether the surface draws an overlay near the bottom edge.
    fn bottom_overlay(&self) -> bool {
        false
    }

    /// Subtree to observe for result changes, if the surface loads lazily.
    fn change_watch(&self) -> Option<ChangeWatch> {
        None
    }

    /// Locator for the primary query input.
    fn search_box_selector(&self) -> &str;

    /// Clickable element for a tab, if the surface has one.
    fn tab_target(&self, _page: &P, _tab: Tab) -> Option<P::Element> {
        None
    }

    /// Apply a time-range filter. `None` clears it. Returns whether the
    /// surface supports the request.
    fn change_tools(&self, _page: &P, _range: Option<TimeRange>) -> bool {
        false
    }
}
