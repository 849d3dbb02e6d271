use axum::http::Method;

use super::{GroupPolicy, RouteDef, RouteGroup};
use crate::controllers::Action;

/// Forum Router Module
///
/// Everything a reader or member does. Reads are open; anything that writes
/// on the caller's behalf (profile, uploads, articles, collections, comments)
/// or lists the caller's own data declares `signed_in`.
pub fn mixed_routes() -> RouteGroup {
    RouteGroup::new("forum", "", GroupPolicy::PerRoute)
        // --- Users ---
        .route(RouteDef::open(Method::GET, "/user/info", Action::UserInfo))
        .route(RouteDef::signed_in(Method::POST, "/user/update", Action::UpdateUserInfo))
        .route(RouteDef::signed_in(
            Method::POST,
            "/user/password/update",
            Action::UpdatePassword,
        ))
        .route(RouteDef::open(Method::GET, "/user/score/top10", Action::Top10))
        .route(RouteDef::open(Method::GET, "/user/score/top100", Action::Top100))
        .route(RouteDef::signed_in(Method::POST, "/upload", Action::Upload))
        .route(RouteDef::open(Method::GET, "/message/unread", Action::UnreadMessages))
        .route(RouteDef::open(
            Method::GET,
            "/message/unread/count",
            Action::UnreadMessageCount,
        ))
        // --- Categories ---
        .route(RouteDef::open(Method::GET, "/categories", Action::CategoryList))
        // --- Articles ---
        .route(RouteDef::open(Method::GET, "/articles", Action::ArticleList))
        .route(RouteDef::signed_in(Method::GET, "/articles/recent", Action::RecentArticles))
        .route(RouteDef::open(Method::GET, "/articles/maxcomment", Action::ArticlesMaxComment))
        .route(RouteDef::open(Method::GET, "/articles/maxbrowse", Action::ArticlesMaxBrowse))
        .route(RouteDef::open(Method::GET, "/article/:id", Action::ArticleInfo))
        .route(RouteDef::signed_in(Method::POST, "/article/create", Action::CreateArticle))
        .route(RouteDef::signed_in(Method::POST, "/article/update", Action::UpdateArticle))
        // --- Collections ---
        .route(RouteDef::signed_in(Method::POST, "/collect/create", Action::CreateCollect))
        .route(RouteDef::signed_in(Method::POST, "/collect/delete", Action::DeleteCollect))
        .route(RouteDef::signed_in(Method::GET, "/collects", Action::CollectList))
        // --- Comments ---
        .route(RouteDef::signed_in(Method::POST, "/comment/create", Action::CreateComment))
}
