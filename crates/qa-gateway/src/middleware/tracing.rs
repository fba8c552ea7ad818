//! Request tracing middleware.
//!
//! Opens an `api_request` span per request, tags it with a request id taken
//! from `x-request-id` (or freshly generated), echoes the id back on the
//! response and feeds the outcome into [`GatewayMetrics`].

use crate::domain::correlation::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::metrics::{GatewayMetrics, RequestTimer};
use axum::http::HeaderValue;
use axum::{body::Body, http::Request, response::Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info_span, Instrument, Span};

/// Tracing layer that creates spans for each request
#[derive(Clone, Default)]
pub struct TracingLayer {
    metrics: Option<Arc<GatewayMetrics>>,
}

impl TracingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also count every request in `metrics`.
    pub fn with_metrics(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
    metrics: Option<Arc<GatewayMetrics>>,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let timer = self.metrics.clone().map(RequestTimer::new);

        let request_id = extract_request_id(&req).unwrap_or_default();
        req.extensions_mut().insert(request_id);

        let span = info_span!(
            "api_request",
            http.method = %req.method(),
            http.target = %req.uri().path(),
            request_id = %request_id,
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let result = inner.call(req).await;

                match result {
                    Ok(mut response) => {
                        let status = response.status().as_u16();
                        Span::current().record("http.status_code", status);
                        if let Some(timer) = timer {
                            timer.finish(status);
                        }
                        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                            response.headers_mut().insert(REQUEST_ID_HEADER, value);
                        }
                        Ok(response)
                    }
                    Err(err) => {
                        if let Some(timer) = timer {
                            timer.finish(500);
                        }
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Request id supplied by the caller, if well formed
fn extract_request_id<B>(req: &Request<B>) -> Option<RequestId> {
    let value = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    RequestId::parse(value).ok()
}
