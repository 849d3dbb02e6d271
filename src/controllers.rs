use std::sync::Arc;

use async_trait::async_trait;
use axum::{Json, http::StatusCode};

use crate::{
    chain::{BoxHandler, Handler, Outcome, RequestContext},
    error::{ErrorBody, code},
};

/// Action
///
/// Every controller action the forum exposes. Routes bind to actions; the
/// `Controllers` collaborator decides which handler serves each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // --- Accounts ---
    Signin,
    Signup,
    ActiveAccount,
    ResetPasswordMail,
    ResetPassword,
    VerifyResetPasswordLink,

    // --- Users ---
    UserInfo,
    UpdateUserInfo,
    UpdatePassword,
    Top10,
    Top100,
    Upload,
    UnreadMessages,
    UnreadMessageCount,

    // --- Content ---
    CategoryList,
    ArticleList,
    RecentArticles,
    ArticlesMaxComment,
    ArticlesMaxBrowse,
    ArticleInfo,
    CreateArticle,
    UpdateArticle,
    CreateCollect,
    DeleteCollect,
    CollectList,
    CreateComment,

    // --- Moderation ---
    AdminCategoryList,
    CreateCategory,
    UpdateCategory,
    UpdateCategoryStatus,
    AdminArticleList,
    UpdateArticleStatus,
}

impl Action {
    /// Stable dotted name, used as the OpenAPI operation id and in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Signin => "user.signin",
            Self::Signup => "user.signup",
            Self::ActiveAccount => "user.active_account",
            Self::ResetPasswordMail => "user.reset_password_mail",
            Self::ResetPassword => "user.reset_password",
            Self::VerifyResetPasswordLink => "user.verify_reset_password_link",
            Self::UserInfo => "user.info",
            Self::UpdateUserInfo => "user.update_info",
            Self::UpdatePassword => "user.update_password",
            Self::Top10 => "user.top10",
            Self::Top100 => "user.top100",
            Self::Upload => "common.upload",
            Self::UnreadMessages => "message.unread",
            Self::UnreadMessageCount => "message.unread_count",
            Self::CategoryList => "category.list",
            Self::ArticleList => "article.list",
            Self::RecentArticles => "article.recent_list",
            Self::ArticlesMaxComment => "article.list_max_comment",
            Self::ArticlesMaxBrowse => "article.list_max_browse",
            Self::ArticleInfo => "article.info",
            Self::CreateArticle => "article.create",
            Self::UpdateArticle => "article.update",
            Self::CreateCollect => "collect.create",
            Self::DeleteCollect => "collect.delete",
            Self::CollectList => "collect.list",
            Self::CreateComment => "comment.create",
            Self::AdminCategoryList => "admin.category.all_list",
            Self::CreateCategory => "admin.category.create",
            Self::UpdateCategory => "admin.category.update",
            Self::UpdateCategoryStatus => "admin.category.update_status",
            Self::AdminArticleList => "admin.article.all_list",
            Self::UpdateArticleStatus => "admin.article.update_status",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Controllers
///
/// The seam to the business layer (persistence, mail, uploads). Called once
/// per route during composition; the returned handler is shared by every
/// request to that route.
pub trait Controllers: Send + Sync {
    fn handler(&self, action: Action) -> BoxHandler;
}

/// UnimplementedControllers
///
/// Answers every action with 501 so the gateway can run before the business
/// layer is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedControllers;

impl Controllers for UnimplementedControllers {
    fn handler(&self, action: Action) -> BoxHandler {
        Arc::new(Unimplemented(action))
    }
}

struct Unimplemented(Action);

#[async_trait]
impl Handler for Unimplemented {
    async fn call(&self, _ctx: &mut RequestContext) -> Outcome {
        Outcome::respond((
            StatusCode::NOT_IMPLEMENTED,
            Json(ErrorBody::new(
                code::NOT_IMPLEMENTED,
                format!("{} is not implemented", self.0),
            )),
        ))
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}
