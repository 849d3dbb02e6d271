use axum::http::Method;

use super::{GroupPolicy, RouteDef, RouteGroup};
use crate::controllers::Action;

/// Public Router Module
///
/// Account entry points reachable without any credential: signin, signup,
/// activation links from the welcome mail, and the password reset flow.
pub fn public_routes() -> RouteGroup {
    RouteGroup::new("public", "", GroupPolicy::PerRoute)
        .route(RouteDef::open(Method::POST, "/signin", Action::Signin))
        .route(RouteDef::open(Method::POST, "/signup", Action::Signup))
        // Link from the activation mail.
        .route(RouteDef::open(Method::GET, "/active/:id/:secret", Action::ActiveAccount))
        // Password reset: request the mail, check the link, submit the new password.
        .route(RouteDef::open(Method::POST, "/reset", Action::ResetPasswordMail))
        .route(RouteDef::open(Method::POST, "/reset/:id/:secret", Action::ResetPassword))
        .route(RouteDef::open(
            Method::GET,
            "/reset/verify/:id/:secret",
            Action::VerifyResetPasswordLink,
        ))
}
