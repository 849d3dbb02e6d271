//! Router Composition
//!
//! Builds the route table from three groups, each defined in its own module:
//! the open account endpoints, the forum endpoints that gate themselves per
//! route, and the admin endpoints gated as a whole. Guards are prepended at
//! composition time so the per-request executor never branches on groups.

/// Signin, signup, activation and password reset. No guards.
pub mod public;

/// Forum reads and writes; each route declares whether sign-in is required.
pub mod mixed;

/// Moderation endpoints under `/admin`; `AdminRequired` on every route.
pub mod admin;

use std::sync::Arc;

use axum::http::Method;

use crate::{
    auth::{AdminRequired, SignedInRequired, VerifierState},
    chain::BoxHandler,
    config::AppConfig,
    controllers::{Action, Controllers},
    error::RouteError,
    registry::{Access, Route, RouteTable},
};

/// RouteDef
///
/// One line of a group's route list.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub method: Method,
    pub path: &'static str,
    pub signed_in: bool,
    pub action: Action,
}

impl RouteDef {
    pub fn open(method: Method, path: &'static str, action: Action) -> Self {
        Self {
            method,
            path,
            signed_in: false,
            action,
        }
    }

    pub fn signed_in(method: Method, path: &'static str, action: Action) -> Self {
        Self {
            method,
            path,
            signed_in: true,
            action,
        }
    }
}

/// GroupPolicy
///
/// How a group decides which predicates precede each business handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPolicy {
    /// Each route's own `signed_in` flag decides.
    PerRoute,
    /// `AdminRequired` heads every route, whatever the route declares.
    AdminRequired,
}

/// RouteGroup
#[derive(Debug, Clone)]
pub struct RouteGroup {
    name: &'static str,
    prefix: &'static str,
    policy: GroupPolicy,
    routes: Vec<RouteDef>,
}

impl RouteGroup {
    pub fn new(name: &'static str, prefix: &'static str, policy: GroupPolicy) -> Self {
        Self {
            name,
            prefix,
            policy,
            routes: Vec::new(),
        }
    }

    pub fn route(mut self, def: RouteDef) -> Self {
        self.routes.push(def);
        self
    }
}

/// Composer
///
/// Accumulates groups into one `RouteTable`. Any collision, whether inside a
/// group or across groups, aborts composition.
pub struct Composer<'a> {
    table: RouteTable,
    api_prefix: String,
    signed_in: BoxHandler,
    admin: BoxHandler,
    controllers: &'a dyn Controllers,
}

impl<'a> Composer<'a> {
    pub fn new(api_prefix: &str, verifier: VerifierState, controllers: &'a dyn Controllers) -> Self {
        Self {
            table: RouteTable::new(),
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            signed_in: Arc::new(SignedInRequired::new(Arc::clone(&verifier))),
            admin: Arc::new(AdminRequired::new(verifier)),
            controllers,
        }
    }

    pub fn group(&mut self, group: &RouteGroup) -> Result<&mut Self, RouteError> {
        for def in &group.routes {
            let (mut chain, access): (Vec<BoxHandler>, _) = match group.policy {
                GroupPolicy::AdminRequired => (vec![Arc::clone(&self.admin)], Access::Admin),
                GroupPolicy::PerRoute if def.signed_in => {
                    (vec![Arc::clone(&self.signed_in)], Access::SignedIn)
                }
                GroupPolicy::PerRoute => (Vec::new(), Access::Public),
            };
            chain.push(self.controllers.handler(def.action));

            let path = format!("{}{}{}", self.api_prefix, group.prefix, def.path);
            let route = Route::new(def.method.clone(), &path, chain)?
                .named(def.action.name())
                .in_group(group.name, access);
            self.table.register(route)?;
        }

        tracing::debug!(group = group.name, routes = group.routes.len(), "route group composed");
        Ok(self)
    }

    pub fn finish(self) -> RouteTable {
        self.table
    }
}

/// compose
///
/// Builds the forum's full route table under the configured API prefix.
pub fn compose(
    config: &AppConfig,
    verifier: VerifierState,
    controllers: &dyn Controllers,
) -> Result<RouteTable, RouteError> {
    let mut composer = Composer::new(&config.api_prefix, verifier, controllers);
    composer
        .group(&public::public_routes())?
        .group(&mixed::mixed_routes())?
        .group(&admin::admin_routes())?;

    let table = composer.finish();
    tracing::info!(routes = table.len(), prefix = %config.api_prefix, "route table composed");
    Ok(table)
}
