//! Per-request tracing.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use super::{BoxFuture, Middleware, Next, Outcome};
use crate::request::Request;

/// Emits one `info` event per request with method, path, status and latency,
/// inside a `request` span that covers every layer further in.
///
/// Register it near the front of the global chain so the span encloses the
/// router and handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Trace {
    fn name(&self) -> &str {
        "trace"
    }

    fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        Box::pin(
            async move {
                let start = Instant::now();
                let outcome = next.run(req).await;
                let latency_us = start.elapsed().as_micros() as u64;
                match &outcome {
                    Ok(res) => info!(status = res.status_code().as_u16(), latency_us, "request completed"),
                    Err(fault) => warn!(latency_us, "request faulted: {fault}"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}
