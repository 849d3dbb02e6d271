use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use forum_gateway::{
    Action, AppConfig, AppState, BoxHandler, Controllers, Handler, IdentityClaim, JwtVerifier,
    Outcome, RequestContext, RouteError, UnimplementedControllers, VerifierState,
    auth::{AccountStatus, Role},
    compose, create_router,
    registry::Access,
    routes::{Composer, GroupPolicy, RouteDef, RouteGroup, mixed::mixed_routes, public::public_routes},
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

// --- Recording Controllers ---

#[derive(Debug, Clone)]
struct Call {
    action: Action,
    params: Vec<(String, String)>,
    user: Option<Uuid>,
}

/// Business layer stand-in: every action records the call and answers 200
/// with the action name and captured parameters.
#[derive(Default, Clone)]
struct RecordingControllers {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingControllers {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, action: Action) -> usize {
        self.calls().iter().filter(|c| c.action == action).count()
    }
}

struct Recorder {
    action: Action,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl Handler for Recorder {
    async fn call(&self, ctx: &mut RequestContext) -> Outcome {
        let params: Vec<(String, String)> = ctx
            .params()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.calls.lock().unwrap().push(Call {
            action: self.action,
            params: params.clone(),
            user: ctx.identity().map(|i| i.id),
        });
        let params: serde_json::Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Outcome::respond(Json(json!({
            "errNo": 0,
            "data": { "action": self.action.name(), "params": params }
        })))
    }
}

impl Controllers for RecordingControllers {
    fn handler(&self, action: Action) -> BoxHandler {
        Arc::new(Recorder {
            action,
            calls: Arc::clone(&self.calls),
        })
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "router-test-secret";

fn config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn verifier() -> VerifierState {
    Arc::new(JwtVerifier::from_config(&config()))
}

fn spawn_app() -> (Router, RecordingControllers) {
    let controllers = RecordingControllers::default();
    let routes = compose(&config(), verifier(), &controllers).expect("composition failed");
    (create_router(AppState::new(routes, config())), controllers)
}

fn token(role: Role) -> String {
    JwtVerifier::from_config(&config())
        .issue(&IdentityClaim {
            id: Uuid::from_u128(42),
            role,
            status: AccountStatus::Active,
        })
        .unwrap()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Composition ---

#[test]
fn test_full_table_matches_route_listing() {
    let routes = compose(&config(), verifier(), &UnimplementedControllers).unwrap();

    assert_eq!(routes.len(), 32);

    let admin: Vec<_> = routes
        .routes()
        .iter()
        .filter(|r| r.access() == Access::Admin)
        .collect();
    assert_eq!(admin.len(), 6);
    assert!(admin.iter().all(|r| r.pattern().as_str().starts_with("/api/admin/")));
    // Admin gate plus the business handler; no separate sign-in step.
    assert!(admin.iter().all(|r| r.chain().len() == 2));

    let signed_in = routes
        .routes()
        .iter()
        .filter(|r| r.access() == Access::SignedIn)
        .count();
    assert_eq!(signed_in, 10);

    let public = routes
        .routes()
        .iter()
        .filter(|r| r.access() == Access::Public);
    assert!(public.clone().all(|r| r.chain().len() == 1));
    assert_eq!(public.count(), 16);
}

#[test]
fn test_duplicate_across_groups_fails_composition() {
    let controllers = UnimplementedControllers;
    let mut composer = Composer::new("/api", verifier(), &controllers);
    composer.group(&public_routes()).unwrap();

    let clash = RouteGroup::new("extra", "", GroupPolicy::PerRoute).route(RouteDef::signed_in(
        Method::POST,
        "/signin",
        Action::Signup,
    ));

    match composer.group(&clash) {
        Err(RouteError::DuplicateRoute {
            existing,
            attempted,
            ..
        }) => {
            assert!(existing.contains("user.signin"), "{existing}");
            assert!(attempted.contains("user.signup"), "{attempted}");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("collision was accepted"),
    }
}

#[test]
fn test_admin_policy_applies_to_routes_without_annotation() {
    let controllers = UnimplementedControllers;
    let mut composer = Composer::new("", verifier(), &controllers);
    let group = RouteGroup::new("admin", "/admin", GroupPolicy::AdminRequired)
        .route(RouteDef::open(Method::GET, "/reports", Action::AdminArticleList));
    composer.group(&group).unwrap();

    let table = composer.finish();
    let route = table.lookup(&Method::GET, "/admin/reports").unwrap().route;
    assert_eq!(route.access(), Access::Admin);
    assert_eq!(route.chain()[0].name(), "admin_required");
}

// --- Dispatch ---

#[tokio::test]
async fn test_public_only_signin_reaches_business_handler() {
    let controllers = RecordingControllers::default();
    let mut composer = Composer::new("/api", verifier(), &controllers);
    composer.group(&public_routes()).unwrap();
    let table = composer.finish();

    let route = table.lookup(&Method::POST, "/api/signin").unwrap().route;
    assert_eq!(route.chain().len(), 1);

    let app = create_router(AppState::new(table, config()));
    let response = send(&app, Method::POST, "/api/signin", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(controllers.count(Action::Signin), 1);
}

#[tokio::test]
async fn test_article_capture_is_extracted() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::GET, "/api/article/42", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["action"], "article.info");
    assert_eq!(body["data"]["params"]["id"], "42");
    assert_eq!(controllers.calls()[0].user, None);
}

#[tokio::test]
async fn test_activation_link_extracts_both_captures() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::GET, "/api/active/7/abc123", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = controllers.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].action, Action::ActiveAccount);
    assert_eq!(
        calls[0].params,
        vec![
            ("id".to_string(), "7".to_string()),
            ("secret".to_string(), "abc123".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_literal_route_wins_over_capture_route() {
    let controllers = RecordingControllers::default();
    let mut composer = Composer::new("/api", verifier(), &controllers);
    // Registered before the literal `/user/info` so order cannot decide.
    let profiles = RouteGroup::new("profiles", "", GroupPolicy::PerRoute)
        .route(RouteDef::open(Method::GET, "/user/:id", Action::ArticleInfo));
    composer
        .group(&profiles)
        .unwrap()
        .group(&mixed_routes())
        .unwrap();
    let app = create_router(AppState::new(composer.finish(), config()));

    send(&app, Method::GET, "/api/user/info", None).await;
    send(&app, Method::GET, "/api/user/17", None).await;

    let calls = controllers.calls();
    assert_eq!(calls[0].action, Action::UserInfo);
    assert!(calls[0].params.is_empty());
    assert_eq!(calls[1].action, Action::ArticleInfo);
    assert_eq!(calls[1].params, vec![("id".to_string(), "17".to_string())]);
}

#[tokio::test]
async fn test_update_without_credential_never_reaches_handler() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::POST, "/api/user/update", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["errNo"], 1001);
    assert_eq!(controllers.count(Action::UpdateUserInfo), 0);
}

#[tokio::test]
async fn test_update_with_credential_carries_identity() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::POST, "/api/user/update", Some(&token(Role::Normal))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let calls = controllers.calls();
    assert_eq!(calls[0].action, Action::UpdateUserInfo);
    assert_eq!(calls[0].user, Some(Uuid::from_u128(42)));
}

#[tokio::test]
async fn test_public_read_ignores_missing_credential() {
    let (app, _) = spawn_app();

    for uri in ["/api/user/info", "/api/message/unread/count", "/api/articles/maxbrowse"] {
        let response = send(&app, Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_route_gating_order() {
    let (app, controllers) = spawn_app();
    let uri = "/api/admin/category/create";

    let anonymous = send(&app, Method::POST, uri, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let member = send(&app, Method::POST, uri, Some(&token(Role::Normal))).await;
    assert_eq!(member.status(), StatusCode::FORBIDDEN);

    assert_eq!(controllers.count(Action::CreateCategory), 0);

    let admin = send(&app, Method::POST, uri, Some(&token(Role::Admin))).await;
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(controllers.count(Action::CreateCategory), 1);
}

#[tokio::test]
async fn test_every_admin_route_refuses_non_admin() {
    let (app, controllers) = spawn_app();
    let member = token(Role::Editor);

    for (method, uri) in [
        (Method::GET, "/api/admin/categories"),
        (Method::POST, "/api/admin/category/create"),
        (Method::POST, "/api/admin/category/update"),
        (Method::POST, "/api/admin/category/status/update"),
        (Method::GET, "/api/admin/articles"),
        (Method::POST, "/api/admin/article/status/update"),
    ] {
        let response = send(&app, method, uri, Some(&member)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
    assert!(controllers.calls().is_empty());
}

#[tokio::test]
async fn test_admin_and_public_listings_are_distinct_routes() {
    let (app, controllers) = spawn_app();

    send(&app, Method::GET, "/api/categories", None).await;
    send(&app, Method::GET, "/api/admin/categories", Some(&token(Role::SuperAdmin))).await;

    let actions: Vec<Action> = controllers.calls().iter().map(|c| c.action).collect();
    assert_eq!(actions, vec![Action::CategoryList, Action::AdminCategoryList]);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (app, _) = spawn_app();

    let response = send(&app, Method::GET, "/api/nothing/here", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["errNo"], 404);

    // Routes only exist under the API prefix.
    let response = send(&app, Method::POST, "/signin", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_is_method_not_allowed() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::GET, "/api/signin", None).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
    assert!(controllers.calls().is_empty());
}

#[tokio::test]
async fn test_head_is_served_by_the_get_route_without_a_body() {
    let (app, controllers) = spawn_app();

    let response = send(&app, Method::HEAD, "/api/categories", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
    assert_eq!(controllers.count(Action::CategoryList), 1);
}

#[tokio::test]
async fn test_head_on_post_only_path_is_method_not_allowed() {
    let (app, _) = spawn_app();

    let response = send(&app, Method::HEAD, "/api/signin", None).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
}

#[tokio::test]
async fn test_reset_submission_path_only_allows_post() {
    let (app, _) = spawn_app();

    // Only POST /reset/:id/:secret has this shape; GET verification needs `/verify`.
    let response = send(&app, Method::DELETE, "/api/reset/1/abc", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");

    let response = send(&app, Method::GET, "/api/reset/1/abc", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unimplemented_controllers_answer_501() {
    let routes = compose(&config(), verifier(), &UnimplementedControllers).unwrap();
    let app = create_router(AppState::new(routes, config()));

    let response = send(&app, Method::GET, "/api/articles", None).await;

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    let body = json_body(response).await;
    assert!(body["msg"].as_str().unwrap().contains("article.list"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (app, _) = spawn_app();

    let response = send(&app, Method::GET, "/api/categories", None).await;

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (app, _) = spawn_app();

    let response = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = json_body(response).await;
    let article = &doc["paths"]["/api/article/{id}"]["get"];
    assert_eq!(article["operationId"], "article.info");
    assert_eq!(article["parameters"][0]["name"], "id");

    let create = &doc["paths"]["/api/admin/category/create"]["post"];
    assert!(create["responses"].get("403").is_some());
    assert!(create["security"].is_array());

    let signin = &doc["paths"]["/api/signin"]["post"];
    assert!(signin.get("security").is_none());
}
