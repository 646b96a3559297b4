#![forbid(unsafe_code)]

//! serpnav public facade crate.
//!
//! Re-exports the vocabulary from `serpnav-core` and, with the default
//! `runtime` feature, the navigator and its collaborators. The `web`
//! feature adds the browser host.
//!
//! ```text
//!   KeyEvent ──▶ SequenceMatcher ──▶ Intent ──▶ Navigator ──▶ FocusLedger
//!                                                   │             │
//!                                              ResultSource   ViewportScroller
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use serpnav_core::{
    Intent, KeyBinding, KeyChord, KeyCode, KeyEvent, KeyEventKind, MatchOutcome, Modifiers,
    OptionSource, Options, Rect, SequenceMatcher, Tab, TimeRange,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use serpnav_runtime::{
    ChangeKind, ChangeWatch, FocusContext, FocusLedger, FocusOutcome, MemoryStorage,
    NavigationStore, Navigator, NoopTabOpener, OpenTabRequest, Page, PersistedNavigation,
    ResultRecord, ResultSource, ScrollAlign, SelectorSource, StorageBackend, StorageError,
    SurfaceProfile, SurfaceRegistry, TabOpener, TargetPolicy, ViewportScroller, resolve_target,
};

#[cfg(feature = "web")]
pub use serpnav_web::SerpNavWeb;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for serpnav hosts.
#[derive(Debug)]
pub enum Error {
    /// Options, key bindings, or surface profiles were rejected.
    Config(serpnav_core::Error),
    /// The navigation record could not be read or written.
    #[cfg(feature = "runtime")]
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<serpnav_core::Error> for Error {
    fn from(err: serpnav_core::Error) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "runtime")]
impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Standard result type for serpnav APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Attach helper ---------------------------------------------------------

/// Detect the surface for the page's current address and build an
/// initialized navigator for it. Returns `None` on unknown pages.
#[cfg(feature = "runtime")]
pub fn attach<P: Page + 'static>(
    registry: &SurfaceRegistry,
    page: P,
    options: Options,
    store: NavigationStore,
    tabs: impl TabOpener + 'static,
) -> Option<Navigator<P>> {
    let source = registry.detect(&page.current_url())?;
    let mut navigator = Navigator::new(page, source, options, store, tabs);
    navigator.init();
    Some(navigator)
}

/// Parse the stored options JSON, falling back per key to defaults.
pub fn options_from_json(text: &str) -> Result<Options> {
    Ok(Options::from_json(text)?)
}

pub mod prelude {
    pub use crate::{Error, Intent, KeyEvent, Options, Result};

    #[cfg(feature = "runtime")]
    pub use crate::{
        FocusOutcome, NavigationStore, Navigator, Page, ResultSource, SurfaceRegistry, TabOpener,
    };
}

pub use serpnav_core as core;
#[cfg(feature = "runtime")]
pub use serpnav_runtime as runtime;

#[cfg(all(test, feature = "runtime"))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serpnav_runtime::simulator::{fixture_page, fixture_profile};

    fn fixture_registry() -> SurfaceRegistry {
        let mut registry = SurfaceRegistry::new();
        registry.register(fixture_profile()).unwrap();
        registry
    }

    #[test]
    fn attach_builds_navigator_on_known_page() {
        let page = fixture_page(3);
        let navigator = attach(
            &fixture_registry(),
            page,
            Options::default(),
            NavigationStore::in_memory(),
            NoopTabOpener,
        )
        .unwrap();
        assert_eq!(navigator.source_name(), "fixture");
        assert_eq!(navigator.ledger().len(), 3);
        assert_eq!(navigator.ledger().focused_index(), Some(0));
    }

    #[test]
    fn attach_ignores_unknown_page() {
        let page = fixture_page(3).with_url("https://example.org/");
        let navigator = attach(
            &fixture_registry(),
            page,
            Options::default(),
            NavigationStore::in_memory(),
            NoopTabOpener,
        );
        assert!(navigator.is_none());
    }

    #[test]
    fn bad_options_surface_as_config_error() {
        let err = options_from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
