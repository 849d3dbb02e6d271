use axum::{
    Json,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Numeric codes carried in the `errNo` field of every JSON error envelope.
/// Clients of the forum front-end branch on these rather than on HTTP status.
pub mod code {
    pub const ERROR: u32 = 1;
    pub const FORBIDDEN: u32 = 403;
    pub const NOT_FOUND: u32 = 404;
    pub const METHOD_NOT_ALLOWED: u32 = 405;
    pub const NOT_IMPLEMENTED: u32 = 501;
    pub const LOGIN_TIMEOUT: u32 = 1001;
    pub const INACTIVE: u32 = 1002;
    pub const FROZEN: u32 = 1003;
}

/// ErrorBody
///
/// The `{"errNo", "msg", "data"}` envelope returned for every non-success outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "errNo")]
    pub err_no: u32,
    pub msg: String,
    pub data: serde_json::Value,
}

impl ErrorBody {
    pub fn new(err_no: u32, msg: impl Into<String>) -> Self {
        Self {
            err_no,
            msg: msg.into(),
            data: serde_json::json!({}),
        }
    }
}

/// RouteError
///
/// Startup-time failures raised while the route table is being composed.
/// Any of these is fatal: the process must not begin serving.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("duplicate route {method} {pattern}: {attempted} collides with {existing}")]
    DuplicateRoute {
        method: Method,
        pattern: String,
        existing: String,
        attempted: String,
    },

    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
}

/// ForbiddenReason
///
/// Why a verified caller was refused. Kept separate from `Unauthorized` since
/// the credential itself was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    NotAdmin,
    AccountInactive,
    AccountFrozen,
}

impl ForbiddenReason {
    fn code(self) -> u32 {
        match self {
            Self::NotAdmin => code::FORBIDDEN,
            Self::AccountInactive => code::INACTIVE,
            Self::AccountFrozen => code::FROZEN,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::NotAdmin => "permission denied",
            Self::AccountInactive => "account is not activated",
            Self::AccountFrozen => "account is frozen",
        }
    }
}

impl std::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// HandlerError
///
/// An unexpected failure raised by a business handler. It is reported to the
/// client as a generic internal error; the message and source are only logged.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// DispatchError
///
/// Per-request failures. Each one is converted into exactly one terminal
/// response and never escapes the request that produced it.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("{method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),

    #[error("handler failure: {0}")]
    HandlerFailure(#[from] HandlerError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::HandlerFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::RouteNotFound { .. } => ErrorBody::new(code::NOT_FOUND, "not found"),
            Self::MethodNotAllowed { .. } => {
                ErrorBody::new(code::METHOD_NOT_ALLOWED, "method not allowed")
            }
            Self::Unauthorized(_) => ErrorBody::new(code::LOGIN_TIMEOUT, "not signed in"),
            Self::Forbidden(reason) => ErrorBody::new(reason.code(), reason.message()),
            // Internal details stay in the logs.
            Self::HandlerFailure(_) => ErrorBody::new(code::ERROR, "internal server error"),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();

        if let Self::MethodNotAllowed { allowed, .. } = &self {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }

        response
    }
}
