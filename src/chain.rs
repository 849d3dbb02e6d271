use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, Method, Uri, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::{
    auth::IdentityClaim,
    error::{DispatchError, HandlerError},
    pattern::PathParams,
};

/// Upper bound on request bodies read through [`RequestContext::json`].
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Outcome
///
/// What a handler decided after seeing the request.
pub enum Outcome {
    /// Hand the request to the next handler in the chain.
    Continue,
    /// Stop here; this response is final.
    Halt(Response),
    /// Stop here with an unexpected failure (reported as a 500).
    Fail(HandlerError),
}

impl Outcome {
    pub fn respond(response: impl IntoResponse) -> Self {
        Self::Halt(response.into_response())
    }

    pub fn reject(error: DispatchError) -> Self {
        Self::Halt(error.into_response())
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Halt(response) => f.debug_tuple("Halt").field(&response.status()).finish(),
            Self::Fail(error) => f.debug_tuple("Fail").field(error).finish(),
        }
    }
}

/// Handler
///
/// A single unit of request processing. The two auth predicates implement
/// this, as does every business controller action.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &mut RequestContext) -> Outcome;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub type BoxHandler = Arc<dyn Handler>;

/// RequestContext
///
/// Per-request state threaded through the handler chain. Owned by the task
/// serving the request and dropped once the response is produced.
pub struct RequestContext {
    parts: Parts,
    body: Option<Body>,
    params: PathParams,
    identity: Option<IdentityClaim>,
    response_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(parts: Parts, body: Body, params: PathParams) -> Self {
        Self {
            parts,
            body: Some(body),
            params,
            identity: None,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn from_request(request: Request, params: PathParams) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, params)
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn identity(&self) -> Option<&IdentityClaim> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, identity: IdentityClaim) {
        self.identity = Some(identity);
    }

    /// Headers merged into whichever response ends the chain.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    /// Takes the request body. Returns `None` once it has been consumed.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Reads the body as JSON, up to [`MAX_BODY_BYTES`].
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, HandlerError> {
        let body = self
            .take_body()
            .ok_or_else(|| HandlerError::new("request body already consumed"))?;
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| HandlerError::with_source("failed to read request body", e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| HandlerError::with_source("request body is not valid JSON", e))
    }
}

/// execute
///
/// Runs `chain` in order against `ctx`. The first Halt or Fail ends the
/// request and later handlers never run. Work already done by earlier
/// handlers is not undone. A chain that runs out without halting is itself
/// a handler failure, so every request gets exactly one response.
pub async fn execute(chain: &[BoxHandler], ctx: &mut RequestContext) -> Response {
    for handler in chain {
        match handler.call(ctx).await {
            Outcome::Continue => {}
            Outcome::Halt(response) => {
                tracing::trace!(handler = handler.name(), status = %response.status(), "chain halted");
                return finish(response, ctx);
            }
            Outcome::Fail(error) => {
                tracing::error!(handler = handler.name(), error = %error, "handler failed");
                return finish(DispatchError::from(error).into_response(), ctx);
            }
        }
    }

    tracing::error!(uri = %ctx.uri(), "handler chain finished without a response");
    let error = HandlerError::new("handler chain produced no response");
    finish(DispatchError::from(error).into_response(), ctx)
}

fn finish(mut response: Response, ctx: &mut RequestContext) -> Response {
    let headers = std::mem::take(&mut ctx.response_headers);
    response.headers_mut().extend(headers);
    response
}
