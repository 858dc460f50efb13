//! Begin/end request notifications.

use http::{Method, StatusCode, Uri};

/// What a [`RequestListener`] learns about the request being served.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub id: u64,
    pub method: Method,
    pub uri: Uri,
}

/// Observes every dispatched request.
///
/// `on_begin_request` is called after the request head is read and before routing;
/// `on_end_request` is called once the request is finished, whatever the outcome. Requests
/// to the reserved favicon path are not reported. Listeners are called from worker tasks
/// and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait RequestListener: Send + Sync {
    fn on_begin_request(&self, info: &RequestInfo);

    /// `status` is the status of the written response, or `None` when the response was
    /// abandoned because the server is shutting down.
    fn on_end_request(&self, info: &RequestInfo, status: Option<StatusCode>);
}

/// Listener logging one line per finished request at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl RequestListener for TracingListener {
    fn on_begin_request(&self, info: &RequestInfo) {
        tracing::debug!(id = info.id, method = %info.method, uri = %info.uri, "begin request");
    }

    fn on_end_request(&self, info: &RequestInfo, status: Option<StatusCode>) {
        match status {
            Some(status) => tracing::info!(id = info.id, method = %info.method, uri = %info.uri, %status, "end request"),
            None => tracing::info!(id = info.id, method = %info.method, uri = %info.uri, "request abandoned"),
        }
    }
}
