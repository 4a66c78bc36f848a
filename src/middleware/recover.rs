//! Fault recovery.

use http::StatusCode;
use tracing::error;

use super::{BoxFuture, Middleware, Next, Outcome};
use crate::request::Request;
use crate::response::Response;

/// Converts any fault raised further in into `500 Internal Server Error`.
///
/// Belongs first in the global chain: its "before" phase is outermost in and
/// its recovery is outermost out, so every other layer's fault reaches it.
/// The fault itself is logged, never sent to the client.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recover;

impl Recover {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Recover {
    fn name(&self) -> &str {
        "recover"
    }

    fn process<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let path = req.path().to_owned();
            match next.run(req).await {
                Ok(res) => Ok(res),
                Err(fault) => {
                    error!(%path, "unhandled fault: {fault:#}");
                    Ok(Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .text("Internal Server Error"))
                }
            }
        })
    }
}
