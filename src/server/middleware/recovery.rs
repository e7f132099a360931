//! Panic recovery middleware
//!
//! Contains per-request panics so one failing handler cannot take down the
//! process or other in-flight requests. It wraps the routes directly, so a
//! panic is converted into a final response before the access-log layer
//! observes it.
//!
//! Two containment points:
//! - the service call: nothing has been sent yet, so an ordinary panic is
//!   logged with a backtrace and answered with `500` and the panic payload
//!   as the body;
//! - the response body stream: the status line is already on the wire, so
//!   the failure is logged and the stream is aborted without a second
//!   response.
//!
//! A [`ClientDisconnect`] payload is the peer-abort sentinel: recovered
//! silently, with no log record and no error response. Full silence only
//! applies before the head is committed; raised mid-stream the panic is
//! still not reported, but the access record is emitted as usual, since it
//! describes the status and bytes that were actually sent.

use actix_web::body::{BodySize, BoxBody, EitherBody, MessageBody};
use actix_web::{HttpMessage, HttpResponse};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use bytes::Bytes;
use futures::FutureExt;
use futures::future::{Ready, ready};
use pin_project_lite::pin_project;
use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tracing::error;

/// Panic payload signalling that the peer closed the connection.
///
/// Handlers raise it with `std::panic::panic_any(ClientDisconnect)`. It is
/// the only payload treated as benign; every other payload produces a
/// failure report. Other disconnect-like conditions are deliberately not
/// given the same treatment.
#[derive(Debug, Clone, Copy)]
pub struct ClientDisconnect;

/// Request-extensions marker telling the access-log layer to stay silent
/// for a peer-aborted request.
pub(crate) struct SuppressAccessLog;

/// Body type produced by the recovery layer: the wrapped downstream body on
/// the normal path, a boxed replacement response on the panic path.
pub type RecoveryBody<B> = EitherBody<RecoveredBody<B>, BoxBody>;

/// Panic recovery middleware for Actix-web
pub struct RecoveryMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RecoveryMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<RecoveryBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RecoveryMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoveryMiddlewareService { service }))
    }
}

/// Service implementation for the panic recovery middleware
pub struct RecoveryMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RecoveryMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<RecoveryBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let info = RequestInfo::capture(&req);
        let http_req = req.request().clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(res)) => Ok(res
                    .map_body(move |_, body| RecoveredBody { inner: body, info })
                    .map_into_left_body::<BoxBody>()),
                Ok(Err(err)) => Err(err),
                Err(panic) => {
                    if panic.downcast_ref::<ClientDisconnect>().is_some() {
                        http_req.extensions_mut().insert(SuppressAccessLog);
                        let res = HttpResponse::Ok().finish();
                        return Ok(ServiceResponse::new(http_req, res)
                            .map_into_right_body::<RecoveredBody<B>>());
                    }

                    let message = report_panic(&info, panic.as_ref());
                    let res = HttpResponse::InternalServerError()
                        .content_type("text/plain; charset=utf-8")
                        .body(message);
                    Ok(ServiceResponse::new(http_req, res)
                        .map_into_right_body::<RecoveredBody<B>>())
                }
            }
        })
    }
}

/// Request metadata attached to every failure report
#[derive(Debug, Clone)]
struct RequestInfo {
    method: String,
    path: String,
    query: String,
    remote_addr: String,
}

impl RequestInfo {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            remote_addr: req
                .connection_info()
                .peer_addr()
                .map(str::to_string)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Emit the failure report for a contained panic and return the payload's
/// string representation.
fn report_panic(info: &RequestInfo, panic: &(dyn Any + Send)) -> String {
    let message = panic_message(panic);
    let stack = Backtrace::force_capture();

    error!(
        error = %message,
        stack = %stack,
        method = %info.method,
        path = %info.path,
        query = %info.query,
        ip = %info.remote_addr,
        "panic!"
    );

    message
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Error terminating a body stream whose producer panicked
#[derive(Debug, Error)]
#[error("handler panicked while streaming the response body")]
struct StreamPanicked;

pin_project! {
    /// Body decorator catching panics raised while the response streams.
    ///
    /// At this point the response head is committed, so the failure can
    /// only be logged and the connection aborted.
    pub struct RecoveredBody<B> {
        #[pin]
        inner: B,
        info: RequestInfo,
    }
}

impl<B> MessageBody for RecoveredBody<B>
where
    B: MessageBody,
{
    type Error = Box<dyn std::error::Error>;

    fn size(&self) -> BodySize {
        self.inner.size()
    }

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.project();
        let inner = this.inner;

        match std::panic::catch_unwind(AssertUnwindSafe(move || inner.poll_next(cx))) {
            Ok(Poll::Ready(Some(Ok(chunk)))) => Poll::Ready(Some(Ok(chunk))),
            Ok(Poll::Ready(Some(Err(err)))) => Poll::Ready(Some(Err(err.into()))),
            Ok(Poll::Ready(None)) => Poll::Ready(None),
            Ok(Poll::Pending) => Poll::Pending,
            Err(panic) => {
                if panic.downcast_ref::<ClientDisconnect>().is_none() {
                    report_panic(this.info, panic.as_ref());
                }
                Poll::Ready(Some(Err(Box::new(StreamPanicked))))
            }
        }
    }
}
