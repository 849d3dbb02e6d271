use axum::http::Method;

use super::{GroupPolicy, RouteDef, RouteGroup};
use crate::controllers::Action;

/// Admin Router Module
///
/// Moderation endpoints. The group policy puts `AdminRequired` in front of
/// every entry, so routes here are declared `open` and still gated.
pub fn admin_routes() -> RouteGroup {
    RouteGroup::new("admin", "/admin", GroupPolicy::AdminRequired)
        // All categories, including disabled ones.
        .route(RouteDef::open(Method::GET, "/categories", Action::AdminCategoryList))
        .route(RouteDef::open(Method::POST, "/category/create", Action::CreateCategory))
        .route(RouteDef::open(Method::POST, "/category/update", Action::UpdateCategory))
        .route(RouteDef::open(
            Method::POST,
            "/category/status/update",
            Action::UpdateCategoryStatus,
        ))
        // All articles regardless of review status.
        .route(RouteDef::open(Method::GET, "/articles", Action::AdminArticleList))
        .route(RouteDef::open(
            Method::POST,
            "/article/status/update",
            Action::UpdateArticleStatus,
        ))
}
