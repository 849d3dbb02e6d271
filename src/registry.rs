use std::{collections::HashMap, fmt};

use axum::http::Method;

use crate::{
    chain::BoxHandler,
    error::{DispatchError, RouteError},
    pattern::{PathParams, Pattern, Segment, split_path},
};

/// Access
///
/// Which identity proof a route demands before its business handler runs.
/// Recorded for introspection and documentation; enforcement lives in the
/// handler chain itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SignedIn,
    Admin,
}

/// Route
///
/// A single (method, pattern) binding and its ordered handler chain.
/// Immutable once registered.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: Pattern,
    chain: Vec<BoxHandler>,
    name: String,
    group: &'static str,
    access: Access,
}

impl Route {
    pub fn new(method: Method, pattern: &str, chain: Vec<BoxHandler>) -> Result<Self, RouteError> {
        let pattern = Pattern::parse(pattern)?;
        Ok(Self {
            name: format!("{method} {pattern}"),
            method,
            pattern,
            chain,
            group: "default",
            access: Access::Public,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn in_group(mut self, group: &'static str, access: Access) -> Self {
        self.group = group;
        self.access = access;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn chain(&self) -> &[BoxHandler] {
        &self.chain
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &'static str {
        self.group
    }

    pub fn access(&self) -> Access {
        self.access
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.method, self.pattern, self.name)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .field("group", &self.group)
            .field("access", &self.access)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// One level of the per-method segment tree. Literal children are tried
/// before the capture child, which gives literals precedence at every
/// position independent of registration order.
#[derive(Debug, Default)]
struct Node {
    literals: HashMap<String, Node>,
    capture: Option<Box<Node>>,
    route: Option<usize>,
}

impl Node {
    /// Inserts a route index at the end of `segments`. Capture names are
    /// ignored here, so `/a/:x` and `/a/:y` land on the same node and collide.
    /// Returns the index already occupying the node on collision.
    fn insert(&mut self, segments: &[Segment], id: usize) -> Result<(), usize> {
        let Some((first, rest)) = segments.split_first() else {
            return match self.route {
                Some(existing) => Err(existing),
                None => {
                    self.route = Some(id);
                    Ok(())
                }
            };
        };

        let child = match first {
            Segment::Literal(literal) => self.literals.entry(literal.clone()).or_default(),
            Segment::Capture(_) => self.capture.get_or_insert_with(Box::default),
        };
        child.insert(rest, id)
    }

    fn find<'p>(&self, parts: &[&'p str], captured: &mut Vec<&'p str>) -> Option<usize> {
        let Some((first, rest)) = parts.split_first() else {
            return self.route;
        };

        if let Some(child) = self.literals.get(*first) {
            if let Some(id) = child.find(rest, captured) {
                return Some(id);
            }
        }

        if let Some(child) = &self.capture {
            if !first.is_empty() {
                captured.push(*first);
                if let Some(id) = child.find(rest, captured) {
                    return Some(id);
                }
                captured.pop();
            }
        }

        None
    }
}

/// RouteMatch
///
/// The result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// RouteTable
///
/// The handler registry. Built once during startup composition, then shared
/// behind an `Arc` and only ever read, so concurrent lookups need no locking.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    trees: HashMap<Method, Node>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// register
    ///
    /// Records a route. Fails with `DuplicateRoute` if a structurally identical
    /// pattern is already bound for the same method; the earlier route is kept.
    pub fn register(&mut self, route: Route) -> Result<(), RouteError> {
        let id = self.routes.len();
        let tree = self.trees.entry(route.method.clone()).or_default();

        if let Err(existing) = tree.insert(route.pattern.segments(), id) {
            let existing = &self.routes[existing];
            return Err(RouteError::DuplicateRoute {
                method: route.method.clone(),
                pattern: route.pattern.to_string(),
                existing: existing.to_string(),
                attempted: route.to_string(),
            });
        }

        tracing::debug!(route = %route, access = ?route.access, "route registered");
        self.routes.push(route);
        Ok(())
    }

    /// lookup
    ///
    /// Resolves a request to its route and captured parameters. A path that
    /// only matches under other methods is reported as `MethodNotAllowed`,
    /// listing those methods; otherwise `RouteNotFound`.
    ///
    /// `HEAD` falls back to the `GET` route for the same path unless a `HEAD`
    /// route was registered explicitly. The dispatcher drops the body.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, DispatchError> {
        let not_found = || DispatchError::RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let parts = split_path(path).ok_or_else(not_found)?;

        if let Some(found) = self.find(method, &parts) {
            return Ok(found);
        }
        if *method == Method::HEAD {
            if let Some(found) = self.find(&Method::GET, &parts) {
                return Ok(found);
            }
        }

        let mut allowed: Vec<Method> = self
            .trees
            .keys()
            .filter(|other| *other != method)
            .filter(|other| self.find(other, &parts).is_some())
            .cloned()
            .collect();

        if allowed.is_empty() {
            return Err(not_found());
        }
        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }

        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Err(DispatchError::MethodNotAllowed {
            method: method.clone(),
            path: path.to_string(),
            allowed,
        })
    }

    fn find(&self, method: &Method, parts: &[&str]) -> Option<RouteMatch<'_>> {
        let tree = self.trees.get(method)?;
        let mut captured = Vec::new();
        let id = tree.find(parts, &mut captured)?;
        let route = &self.routes[id];
        let values = captured.into_iter().map(str::to_string).collect();
        Some(RouteMatch {
            route,
            params: route.pattern.bind(values),
        })
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
