//! Cached value of the `Date` response header.
//!
//! Formatting the date for every response is wasted work when many requests are served in
//! the same second, so a background task refreshes one shared value instead. A reader that
//! finds the value older than a second refreshes it itself, which keeps the header
//! current when the refresh task's runtime is gone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::header::DATE;
use http::{HeaderMap, HeaderValue};
use once_cell::sync::Lazy;
use tracing::warn;

const UPDATE_INTERVAL: Duration = Duration::from_millis(800);

/// Age after which a read refreshes the cached value.
const STALE_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Stamp {
    at: Instant,
    value: Bytes,
}

impl Stamp {
    fn now() -> Self {
        Self { at: Instant::now(), value: now() }
    }
}

/// Maintains the current HTTP date string, refreshed by a background task.
#[derive(Debug)]
pub struct DateService {
    current: Arc<ArcSwap<Stamp>>,
    handle: tokio::task::JoinHandle<()>,
}

static DATE_SERVICE: Lazy<DateService> = Lazy::new(|| DateService::new_with_update_interval(UPDATE_INTERVAL));

fn now() -> Bytes {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    Bytes::from_owner(buf)
}

impl DateService {
    /// The shared instance. Its refresh task is spawned on the runtime of the first caller,
    /// so it must be called from within a tokio runtime.
    pub fn get_global_instance() -> &'static DateService {
        &DATE_SERVICE
    }

    fn new_with_update_interval(update_interval: Duration) -> Self {
        let current = Arc::new(ArcSwap::from_pointee(Stamp::now()));
        let current_arc = Arc::clone(&current);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(update_interval).await;
                current_arc.store(Arc::new(Stamp::now()));
            }
        });

        DateService { current, handle }
    }

    pub fn http_date(&self) -> Bytes {
        let current = self.current.load();
        if current.at.elapsed() < STALE_AFTER {
            return current.value.clone();
        }

        let fresh = Arc::new(Stamp::now());
        let value = fresh.value.clone();
        self.current.store(fresh);
        value
    }

    /// Inserts the `Date` header, replacing any value already present.
    pub(crate) fn stamp(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_maybe_shared(self.http_date()) {
            Ok(value) => {
                headers.insert(DATE, value);
            }
            Err(e) => warn!(cause = %e, "unable to build date header"),
        }
    }
}

impl Drop for DateService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stamps_rfc7231_date() {
        let service = DateService::new_with_update_interval(Duration::from_millis(10));
        let mut headers = HeaderMap::new();
        service.stamp(&mut headers);

        let date = headers.get(DATE).unwrap().to_str().unwrap();
        assert_eq!(date.len(), 29);
        assert!(date.ends_with(" GMT"));
    }

    #[tokio::test]
    async fn refreshes_in_background() {
        let service = DateService::new_with_update_interval(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!service.handle.is_finished());
        assert_eq!(service.http_date().len(), 29);
    }

    #[tokio::test]
    async fn stale_value_is_refreshed_on_read() {
        let service = DateService::new_with_update_interval(Duration::from_secs(3600));
        let old = Instant::now().checked_sub(STALE_AFTER * 2).unwrap();
        service.current.store(Arc::new(Stamp { at: old, value: Bytes::from_static(b"Thu, 01 Jan 1970 00:00:00 GMT") }));

        let date = service.http_date();
        assert_ne!(&date[..], b"Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(date.len(), 29);
        assert!(service.current.load().at.elapsed() < STALE_AFTER);
    }

    #[tokio::test]
    async fn fresh_value_is_served_from_cache() {
        let service = DateService::new_with_update_interval(Duration::from_secs(3600));
        let cached = Bytes::from_static(b"Thu, 01 Jan 1970 00:00:00 GMT");
        service.current.store(Arc::new(Stamp { at: Instant::now(), value: cached.clone() }));
        assert_eq!(service.http_date(), cached);
    }
}
