//! # API Module
//!
//! This module provides the HTTP endpoints of the shuffler service. It is a
//! thin layer: every handler validates its input, calls into
//! [`crate::spotify`] or [`crate::pipeline`] and maps the outcome onto a JSON
//! response. Failures are returned as [`crate::Error`], which renders itself
//! as `{ error, message, statusCode }` with the matching status code.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`auth_token`] - `GET /authToken`, client-credentials token
//! - [`authorize`] - `GET /authorize`, redirect to Spotify plus nonce cookie
//! - [`callback`] - `GET /callback`, nonce check and code exchange
//! - [`refresh_token`] - `GET /refreshToken`, new access token from a refresh token
//!
//! ### Playlists
//!
//! - [`randomize_playlist`] - `POST /randomizePlaylist`, runs the randomize pipeline
//!
//! ### Monitoring
//!
//! - [`health`] - `GET /health`, status and version
//! - [`pulse`] - `GET /pulse`, empty 204
//!
//! ## Security Considerations
//!
//! - The CSRF nonce travels in the `spotify` cookie and is removed on the
//!   first callback, successful or not.
//! - The service keeps no session between requests; every request builds
//!   its own [`OAuthSession`].

mod auth;
mod health;
mod middleware;
mod playlists;

use std::sync::Arc;

use crate::{config::Config, spotify::SpotifyClient, spotify::auth::OAuthSession};

pub use auth::{NONCE_COOKIE, auth_token, authorize, callback, refresh_token};
pub use health::{health, pulse};
pub use middleware::log_requests;
pub use playlists::randomize_playlist;

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub spotify: SpotifyClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let spotify = SpotifyClient::with_http(http.clone(), &config.api_url);
        Self {
            config: Arc::new(config),
            http,
            spotify,
        }
    }

    /// Fresh OAuth session for one request.
    pub fn oauth_session(&self) -> OAuthSession {
        OAuthSession::with_http(Arc::clone(&self.config), self.http.clone())
    }
}
