use axum::{
    Extension, Router, middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{
    Res,
    api::{self, AppState},
    config::Config,
    info,
};

/// Builds the service router around `state`.
pub fn router(state: AppState) -> Router {
    // credentials are allowed, so origins are mirrored instead of "*"
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/health", get(api::health))
        .route("/pulse", get(api::pulse))
        .route("/authToken", get(api::auth_token))
        .route("/authorize", get(api::authorize))
        .route("/callback", get(api::callback))
        .route("/refreshToken", get(api::refresh_token))
        .route("/randomizePlaylist", post(api::randomize_playlist))
        .layer(Extension(state))
        .layer(cors)
        .layer(middleware::from_fn(api::log_requests))
}

/// Binds `config.server_addr()` and serves until the process stops.
pub async fn start_api_server(config: Config) -> Res<()> {
    let addr = config.server_addr();
    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
