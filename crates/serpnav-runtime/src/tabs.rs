#![forbid(unsafe_code)]

//! Requests to the tab-creation service.
//!
//! Opening a link in a new tab needs privileges the page does not have, so
//! the navigator hands the request to an external service. Requests are
//! fire-and-forget.

use serde::{Deserialize, Serialize};

/// One "open in new tab" request. Serialized as `{address, activate}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTabRequest {
    pub address: String,
    /// Switch to the new tab immediately.
    pub activate: bool,
}

/// Sink for tab requests.
pub trait TabOpener {
    fn open(&self, request: OpenTabRequest);
}

/// Opener that drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTabOpener;

impl TabOpener for NoopTabOpener {
    fn open(&self, request: OpenTabRequest) {
        tracing::debug!(message = "tabs.dropped", address = %request.address);
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::RecordingTabOpener;

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{OpenTabRequest, TabOpener};

    /// Opener that records requests; clones share the log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTabOpener {
        requests: Rc<RefCell<Vec<OpenTabRequest>>>,
    }

    impl RecordingTabOpener {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn requests(&self) -> Vec<OpenTabRequest> {
            self.requests.borrow().clone()
        }
    }

    impl TabOpener for RecordingTabOpener {
        fn open(&self, request: OpenTabRequest) {
            self.requests.borrow_mut().push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let request = OpenTabRequest {
            address: "https://r/1".to_owned(),
            activate: false,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"address":"https://r/1","activate":false}"#
        );
    }

    #[test]
    fn recorder_clones_share_log() {
        let opener = RecordingTabOpener::new();
        let handle = opener.clone();
        opener.open(OpenTabRequest {
            address: "https://r/2".to_owned(),
            activate: true,
        });
        assert_eq!(handle.requests().len(), 1);
    }
}
