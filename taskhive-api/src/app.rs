/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::auth::identity::IdentityProvider;
use taskhive_shared::auth::middleware::{authenticate, AuthError};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Identity-provider verifier, injected at startup
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            identity,
        }
    }

    /// Gets the session-token signing secret
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                          # Health check (public)
/// ├── /auth/
/// │   ├── POST /verify-token                           # Sign-in (public)
/// │   └── GET  /me                                     # Current user (session)
/// ├── /organization/                                   # All session-protected
/// │   ├── POST /create
/// │   ├── GET  /current
/// │   └── PUT  /update/:organizationId
/// ├── /project/
/// │   ├── POST   /create
/// │   ├── GET    /get/:organizationId
/// │   ├── PUT    /update/:projectId
/// │   └── DELETE /delete/:projectId
/// ├── /member/
/// │   ├── POST   /add/:organizationId/:projectId
/// │   ├── GET    /get/:organizationId/:projectId
/// │   ├── GET    /organization/:organizationId
/// │   ├── PUT    /update/:organizationId/:projectId/:memberId
/// │   └── DELETE /delete/:organizationId/:projectId/:memberId
/// └── /task/
///     ├── POST   /create
///     ├── PUT    /update-status/:taskId
///     ├── GET    /get/:organizationId/:projectId
///     └── DELETE /delete/:taskId
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (per-router basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes: sign-in is public, /me requires a session
    let auth_routes = Router::new()
        .route("/verify-token", post(routes::auth::verify_token))
        .route(
            "/me",
            get(routes::auth::me).route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                session_auth_layer,
            )),
        );

    let organization_routes = Router::new()
        .route("/create", post(routes::organization::create_organization))
        .route("/current", get(routes::organization::current_organization))
        .route(
            "/update/:organizationId",
            put(routes::organization::update_organization),
        );

    let project_routes = Router::new()
        .route("/create", post(routes::project::create_project))
        .route("/get/:organizationId", get(routes::project::get_projects))
        .route("/update/:projectId", put(routes::project::update_project))
        .route("/delete/:projectId", delete(routes::project::delete_project));

    let member_routes = Router::new()
        .route(
            "/add/:organizationId/:projectId",
            post(routes::member::add_member),
        )
        .route(
            "/get/:organizationId/:projectId",
            get(routes::member::get_project_members),
        )
        .route(
            "/organization/:organizationId",
            get(routes::member::get_organization_members),
        )
        .route(
            "/update/:organizationId/:projectId/:memberId",
            put(routes::member::update_member),
        )
        .route(
            "/delete/:organizationId/:projectId/:memberId",
            delete(routes::member::delete_member),
        );

    let task_routes = Router::new()
        .route("/create", post(routes::task::create_task))
        .route("/update-status/:taskId", put(routes::task::update_task_status))
        .route(
            "/get/:organizationId/:projectId",
            get(routes::task::get_project_tasks),
        )
        .route("/delete/:taskId", delete(routes::task::delete_task));

    // Everything below /organization, /project, /member, /task requires a
    // session. route_layer keeps the middleware off the router fallback, so
    // unmatched paths still produce a plain 404.
    let protected_routes = Router::new()
        .nest("/organization", organization_routes)
        .nest("/project", project_routes)
        .nest("/member", member_routes)
        .nest("/task", task_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Verifies the session token from the Authorization header, loads the
/// acting user, and injects [`taskhive_shared::auth::middleware::AuthContext`]
/// into request extensions.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let context = authenticate(&state.db, state.session_secret(), auth_header).await?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, Config, DatabaseConfig, IdentityConfig, SessionConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use taskhive_shared::auth::identity::GoogleIdentityProvider;
    use tower::ServiceExt;

    // Lazy pool: no connection is made until a query runs, so routing and
    // authentication rejection paths are testable without a database.
    fn test_state() -> AppState {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/taskhive_test".to_string(),
                max_connections: 1,
            },
            session: SessionConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            identity: IdentityConfig {
                project_id: "demo-project".to_string(),
                jwks_url: GoogleIdentityProvider::DEFAULT_JWKS_URL.to_string(),
            },
        };

        let pool = sqlx::PgPool::connect_lazy(&config.database.url).expect("lazy pool");
        let identity = Arc::new(GoogleIdentityProvider::new(
            config.identity.project_id.clone(),
            config.identity.jwks_url.clone(),
        ));

        AppState::new(pool, config, identity)
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_credentials() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/organization/current")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_rejects_non_bearer_header() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header("Authorization", "Basic abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_token_rejects_empty_token() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/verify-token")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"token": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_token_rejects_garbage_token() {
        // Header decoding fails before any key fetch, so no network is hit.
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/verify-token")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"token": "not-a-jwt"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        // Unmatched paths must hit the fallback without passing through the
        // session middleware; a 401 here means the layer leaked onto it.
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_on_me_is_405() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
