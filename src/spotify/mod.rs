//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API and the Spotify
//! accounts service needed to shuffle a playlist. It serves as the integration
//! layer between the randomize pipeline and Spotify's services, handling all
//! HTTP communication, token grants and response decoding.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers / CLI
//!          ↓
//! Randomize pipeline (stage graph)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code, client credentials, refresh)
//!     ├── Pagination (cursor-following traversal)
//!     └── Playlist Operations (list, locate, create, add tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - [`auth::OAuthSession`], the OAuth state machine with nonce
//!   verification, code exchange, refresh and client-credentials grants.
//! - [`pagination`] - Generic traversal of `next`-linked listings, shared by
//!   playlist and track enumeration.
//! - [`playlists`] - Enumeration, lookup by name, creation of the shuffled
//!   copy and concurrent batch uploads.
//!
//! ## API Coverage
//!
//! - `GET /me` - Profile of the token's owner
//! - `GET /me/playlists` - User's playlists, paginated
//! - `GET /playlists/{id}/tracks` - Playlist items, paginated
//! - `POST /users/{user_id}/playlists` - Create new playlists
//! - `POST /playlists/{playlist_id}/tracks` - Add tracks to playlists
//! - `POST /api/token` - Token exchange and refresh operations
//!
//! ## Error Types
//!
//! Every upstream failure surfaces as an [`UpstreamError`]: non-2xx answers
//! become [`UpstreamError::NonSuccessStatus`], undecodable bodies
//! [`UpstreamError::MalformedBody`], transport failures
//! [`UpstreamError::Request`]. Nothing is retried.

pub mod auth;
pub mod pagination;
pub mod playlists;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::UpstreamError,
    types::{Page, User},
};

/// Thin client for the Spotify Web API.
///
/// Holds no credentials; every call takes the bearer token it should run
/// with, so a single client can serve concurrent runs for different users.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http(Client::new(), &config.api_url)
    }

    pub fn with_http(http: Client, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Profile of the user owning `token`.
    pub async fn me(&self, token: &str) -> Result<User, UpstreamError> {
        let url = format!("{}/me", self.api_url);
        let response = send(self.http.get(&url).bearer_auth(token), &url).await?;
        decode(response).await
    }

    /// Fetches one page of a paginated listing.
    ///
    /// Returns `Ok(None)` when the body carries no page object (empty or
    /// `null`), which the paginator reports as an empty response.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        token: &str,
        url: String,
    ) -> Result<Option<Page<T>>, UpstreamError> {
        let response = send(self.http.get(&url).bearer_auth(token), &url).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<Page<T>>>(&body)
            .map_err(|e| UpstreamError::MalformedBody(e.to_string()))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
}

/// Sends `request` and turns non-2xx answers into
/// [`UpstreamError::NonSuccessStatus`].
pub(crate) async fn send(request: RequestBuilder, url: &str) -> Result<Response, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::NonSuccessStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| UpstreamError::MalformedBody(e.to_string()))
}
