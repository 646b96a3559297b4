#![forbid(unsafe_code)]

//! High-level user intents.
//!
//! An [`Intent`] is what a key binding resolves to. The navigator maps each
//! intent onto exactly one operation; nothing downstream of the key matcher
//! ever looks at raw keys again.

use serde::{Deserialize, Serialize};

/// A user-triggered keyboard action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Move the highlight to the next result.
    FocusNext,
    /// Move the highlight to the previous result.
    FocusPrevious,
    /// Follow the focused element in the current tab.
    Navigate,
    /// Open the focused link in a new foreground tab.
    NavigateNewTab,
    /// Open the focused link in a new background tab.
    NavigateNewTabBackground,
    /// Put the caret in the page's query input.
    FocusSearchBox,
    /// Switch to one of the search surface's tabs.
    SwitchTab(Tab),
    /// Restrict results to a time range (or toggle verbatim search).
    ChangeTools(TimeRange),
}

/// Search surface tabs an adapter may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tab {
    All,
    Images,
    Videos,
    Maps,
    News,
    Shopping,
    Books,
    Flights,
    Financial,
    PreviousPage,
    NextPage,
}

/// Time-range filters ("change tools").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeRange {
    Any,
    Hour,
    Day,
    Week,
    Month,
    Year,
    Verbatim,
}

impl TimeRange {
    /// All ranges, in binding order.
    pub const ALL: [TimeRange; 7] = [
        TimeRange::Any,
        TimeRange::Hour,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Year,
        TimeRange::Verbatim,
    ];

    /// One-letter code used by adapters (`a`, `h`, `d`, `w`, `m`, `y`, `v`).
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            TimeRange::Any => 'a',
            TimeRange::Hour => 'h',
            TimeRange::Day => 'd',
            TimeRange::Week => 'w',
            TimeRange::Month => 'm',
            TimeRange::Year => 'y',
            TimeRange::Verbatim => 'v',
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.code() == code)
    }
}
