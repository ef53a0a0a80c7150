use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{Method, header},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use eventposter_auth::Hs256Jwt;

use crate::{config::Config, middleware};

pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// A fully wired application: the router plus the services behind it.
pub struct App {
    pub router: Router,
    pub services: Arc<AppServices>,
}

/// Open the store, wire the services and build the router.
///
/// Background work (the expiry sweeper) is left to the caller to start.
pub async fn build_app(config: &Config) -> anyhow::Result<App> {
    let pool = eventposter_infra::db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let ttl = chrono::Duration::from_std(config.token_ttl).context("token TTL out of range")?;
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), ttl));
    let auth_state = middleware::AuthState { jwt: jwt.clone() };

    let services = Arc::new(AppServices::new(pool, jwt));

    // Protected routes: require a bearer token.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router()
        .merge(protected)
        .layer(Extension(services.clone()));

    let router = Router::new()
        .route("/healthz", get(routes::system::healthz))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer()),
        );

    Ok(App { router, services })
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}
