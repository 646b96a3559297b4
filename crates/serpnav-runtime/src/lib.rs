#![forbid(unsafe_code)]

//! serpnav Runtime
//!
//! Keyboard navigation over a search results page the runtime does not
//! control.
//!
//! # Key Components
//!
//! - [`Page`] - Capability surface of the host document
//! - [`ResultSource`] - Per-surface adapter supplying result records
//! - [`ViewportScroller`] - Minimal-movement scroll into view
//! - [`FocusLedger`] - Logical focus index and highlight bookkeeping
//! - [`resolve_target`] - Native focus vs. highlighted anchor
//! - [`Navigator`] - Binds key events and intents to ledger operations
//! - [`SurfaceRegistry`] - Built-in and JSON-loaded surface profiles
//! - [`NavigationStore`] - Last followed result, persisted across loads
//!
//! # Role in serpnav
//! `serpnav-runtime` is the orchestrator. It consumes key events and intents
//! from `serpnav-core`, mutates the page only through [`Page`], and leaves
//! the actual DOM binding to `serpnav-web`.

pub mod ledger;
pub mod navigator;
pub mod page;
pub mod resolver;
pub mod result;
pub mod scroller;
#[cfg(any(test, feature = "test-helpers"))]
pub mod simulator;
pub mod source;
pub mod state_persistence;
pub mod surfaces;
pub mod tabs;

pub use ledger::{FocusContext, FocusLedger, FocusOutcome, OUTLINE_SUPPRESSION_CLASS};
pub use navigator::Navigator;
pub use page::{Page, ScrollAlign};
pub use resolver::{TargetPolicy, resolve_target};
pub use result::ResultRecord;
pub use scroller::{OVERLAY_BOTTOM_MARGIN, SCROLL_EPSILON, ViewportScroller};
pub use source::{ChangeKind, ChangeWatch, ResultSource};
pub use state_persistence::{
    MemoryStorage, NavigationStore, PersistedNavigation, StorageBackend, StorageError,
    StorageResult,
};
pub use surfaces::{HighlightTarget, SelectorSource, SurfaceProfile, SurfaceRegistry, TimeParam};
pub use tabs::{NoopTabOpener, OpenTabRequest, TabOpener};

#[cfg(any(test, feature = "test-helpers"))]
pub use simulator::{PageSimulator, SimElement, SimEvent};
#[cfg(any(test, feature = "test-helpers"))]
pub use tabs::RecordingTabOpener;
