//! Access logging middleware
//!
//! Emits exactly one structured INFO record per request, after the response
//! body has fully streamed, carrying the wall-clock latency and the status
//! and byte totals actually sent. It observes the recovery layer's output,
//! so contained failures are logged with their final status.

use actix_web::HttpMessage;
use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use bytes::Bytes;
use futures::future::{Ready, ready};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::info;

use super::observer::{ObservedBody, ResponseMetrics};
use super::recovery::SuppressAccessLog;

/// Access log middleware for Actix-web
pub struct AccessLogMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AccessLogMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<LoggedBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AccessLogMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddlewareService { service }))
    }
}

/// Service implementation for the access log middleware
pub struct AccessLogMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<LoggedBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query = req.query_string().to_string();
        let remote_addr = req
            .connection_info()
            .peer_addr()
            .map(str::to_string)
            .unwrap_or_else(|| "-".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = match fut.await {
                Ok(res) => res,
                Err(err) => {
                    // The response is produced from the error upstream;
                    // record the request with the error's status here.
                    let status = err.as_response_error().status_code().as_u16();
                    info!(
                        latency = ?start.elapsed(),
                        method = %method,
                        path = %path,
                        query = %query,
                        ip = %remote_addr,
                        status = status,
                        bytes = 0u64,
                        "accessed"
                    );
                    return Err(err);
                }
            };

            let suppressed = res
                .request()
                .extensions()
                .get::<SuppressAccessLog>()
                .is_some();

            let metrics = ResponseMetrics::new();
            metrics.record_status(res.status().as_u16());

            let record = (!suppressed).then(|| AccessLogRecord {
                start,
                method,
                path,
                query,
                remote_addr,
                metrics: Arc::clone(&metrics),
            });

            Ok(res.map_body(move |_, body| LoggedBody {
                inner: ObservedBody::new(body, metrics),
                record,
            }))
        })
    }
}

/// One request's log record, emitted exactly once when dropped.
///
/// Held by [`LoggedBody`] until the body finishes streaming, so the latency
/// covers the full request and the byte total reflects what the transport
/// received. Dropping early (client gone mid-stream) still emits.
struct AccessLogRecord {
    start: Instant,
    method: String,
    path: String,
    query: String,
    remote_addr: String,
    metrics: Arc<ResponseMetrics>,
}

impl Drop for AccessLogRecord {
    fn drop(&mut self) {
        info!(
            latency = ?self.start.elapsed(),
            method = %self.method,
            path = %self.path,
            query = %self.query,
            ip = %self.remote_addr,
            status = self.metrics.status(),
            bytes = self.metrics.bytes(),
            "accessed"
        );
    }
}

pin_project! {
    /// Body decorator pairing the byte counter with the log record
    pub struct LoggedBody<B> {
        #[pin]
        inner: ObservedBody<B>,
        record: Option<AccessLogRecord>,
    }
}

impl<B> MessageBody for LoggedBody<B>
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
        let poll = this.inner.poll_next(cx);

        // End of stream, successful or not: emit the record now
        match &poll {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => {
                drop(this.record.take());
            }
            _ => {}
        }

        poll
    }
}
