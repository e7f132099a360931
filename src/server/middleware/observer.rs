//! Response observation primitives
//!
//! [`ResponseMetrics`] records what was actually sent for one request: the
//! first status code and the running byte count. [`ObservedBody`] is a
//! [`MessageBody`] decorator that forwards every chunk unchanged while
//! feeding the counter. Both are shared between the access-log and recovery
//! layers through an `Arc`.

use actix_web::body::{BodySize, MessageBody};
use bytes::Bytes;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::task::{Context, Poll};

/// Per-request response metrics
///
/// Created once per request, discarded when the request completes. The
/// status is set at most once (first write wins); the byte counter never
/// decreases.
#[derive(Debug, Default)]
pub struct ResponseMetrics {
    status: AtomicU16,
    bytes: AtomicU64,
}

impl ResponseMetrics {
    /// Create a fresh, shareable metrics record
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record the status code effectively sent first.
    ///
    /// Later calls are no-ops; the transport only ever sends one status
    /// line.
    pub fn record_status(&self, status: u16) {
        let _ = self
            .status
            .compare_exchange(0, status, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Add to the total of body bytes handed to the transport
    pub fn add_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::AcqRel);
    }

    /// Status recorded for this request, 0 if none was sent yet
    pub fn status(&self) -> u16 {
        self.status.load(Ordering::Acquire)
    }

    /// Total body bytes handed to the transport so far
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }
}

pin_project! {
    /// Body decorator that counts every chunk without altering it
    pub struct ObservedBody<B> {
        #[pin]
        inner: B,
        metrics: Arc<ResponseMetrics>,
    }
}

impl<B> ObservedBody<B> {
    /// Wrap a body so each produced chunk is added to `metrics`
    pub fn new(inner: B, metrics: Arc<ResponseMetrics>) -> Self {
        Self { inner, metrics }
    }
}

impl<B> MessageBody for ObservedBody<B>
where
    B: MessageBody,
{
    type Error = B::Error;

    fn size(&self) -> BodySize {
        self.inner.size()
    }

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.metrics.add_bytes(chunk.len() as u64);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::{self, BoxBody};

    #[test]
    fn first_status_wins() {
        let metrics = ResponseMetrics::new();
        assert_eq!(metrics.status(), 0);

        metrics.record_status(201);
        metrics.record_status(500);
        metrics.record_status(404);

        assert_eq!(metrics.status(), 201);
    }

    #[test]
    fn byte_counter_accumulates() {
        let metrics = ResponseMetrics::new();
        metrics.add_bytes(7);
        metrics.add_bytes(0);
        metrics.add_bytes(10);
        assert_eq!(metrics.bytes(), 17);
    }

    #[actix_web::test]
    async fn observed_body_counts_exact_chunk_total() {
        let metrics = ResponseMetrics::new();
        let body = ObservedBody::new(BoxBody::new("hello world"), Arc::clone(&metrics));

        let out = body::to_bytes(body).await.unwrap();

        assert_eq!(&out[..], b"hello world");
        assert_eq!(metrics.bytes(), 11);
    }

    #[actix_web::test]
    async fn observed_body_forwards_empty_body() {
        let metrics = ResponseMetrics::new();
        let body = ObservedBody::new(BoxBody::new(()), Arc::clone(&metrics));

        let out = body::to_bytes(body).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(metrics.bytes(), 0);
    }
}
