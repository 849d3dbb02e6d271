use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};

use crate::{
    chain::{self, RequestContext},
    registry::RouteTable,
};

/// dispatch
///
/// Entry point for every request that is not a documentation route: resolves
/// it against the shared route table and runs the matched handler chain.
/// Lookup failures become 404/405 responses; nothing here is shared mutably
/// between requests. A `HEAD` request served by a `GET` route gets that
/// route's status and headers with an empty body.
pub async fn dispatch(State(routes): State<Arc<RouteTable>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let matched = match routes.lookup(&parts.method, parts.uri.path()) {
        Ok(matched) => matched,
        Err(error) => {
            tracing::debug!(%error, "no route");
            return error.into_response();
        }
    };

    tracing::debug!(route = %matched.route, params = matched.params.len(), "dispatching");

    let head = parts.method == Method::HEAD;
    let mut ctx = RequestContext::new(parts, body, matched.params);
    let response = chain::execute(matched.route.chain(), &mut ctx).await;

    if head {
        let (parts, _) = response.into_parts();
        return Response::from_parts(parts, Body::empty());
    }
    response
}
