//! Common test utilities: an in-process fake of the Spotify accounts service
//! and Web API, plus helpers to drive the service router without a socket.
//!
//! The fake binds `127.0.0.1:0`, serves every endpoint the shuffler calls
//! and records what it was asked to do so tests can assert on it.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    body::Body,
    extract::{Form, Path, Query, State},
    http::{HeaderMap, Request, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::Barrier;
use tower::ServiceExt;

use spotshuffle::config::Config;

pub const USER_ID: &str = "user-1";
pub const GOOD_CODE: &str = "good-code";
pub const PLAYLIST_PAGE_SIZE: usize = 2;
pub const TRACK_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub user: String,
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Default)]
pub struct Upstream {
    pub base: String,
    pub playlists: Vec<(String, String)>,
    /// Track URIs per playlist id; `None` stands for an unavailable track.
    pub tracks: HashMap<String, Vec<Option<String>>>,
    /// Playlist ids whose track listing answers with a `null` body.
    pub null_pages: HashSet<String>,
    pub created: Vec<CreatedPlaylist>,
    pub added: Vec<(String, Vec<String>)>,
    pub token_requests: Vec<HashMap<String, String>>,
    pub fail_uploads: bool,
    /// Access tokens from the code grant expire immediately.
    pub short_lived_tokens: bool,
    /// Every add-tracks request waits here before it is answered.
    pub upload_barrier: Option<Arc<Barrier>>,
}

type Shared = Arc<Mutex<Upstream>>;

pub struct FakeSpotify {
    pub base: String,
    pub state: Shared,
}

impl FakeSpotify {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let state: Shared = Arc::new(Mutex::new(Upstream {
            base: base.clone(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/token", post(token))
            .route("/v1/me", get(me))
            .route("/v1/me/playlists", get(my_playlists))
            .route("/v1/playlists/{id}/tracks", get(playlist_tracks).post(add_tracks))
            .route("/v1/users/{user}/playlists", post(create_playlist))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base, state }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::new("client-id", "client-secret");
        config.auth_url = format!("{}/authorize", self.base);
        config.token_url = format!("{}/api/token", self.base);
        config.api_url = format!("{}/v1", self.base);
        config
    }

    pub fn add_playlist(&self, id: &str, name: &str, uris: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.playlists.push((id.to_string(), name.to_string()));
        state.tracks.insert(
            id.to_string(),
            uris.iter().map(|u| Some(u.to_string())).collect(),
        );
    }

    pub fn add_playlist_with_tracks(&self, id: &str, name: &str, tracks: Vec<Option<String>>) {
        let mut state = self.state.lock().unwrap();
        state.playlists.push((id.to_string(), name.to_string()));
        state.tracks.insert(id.to_string(), tracks);
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, Upstream> {
        self.state.lock().unwrap()
    }
}

fn has_scheme(headers: &HeaderMap, scheme: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(scheme))
}

fn offset(query: &HashMap<String, String>) -> usize {
    query
        .get("offset")
        .and_then(|o| o.parse().ok())
        .unwrap_or(0)
}

async fn token(
    State(state): State<Shared>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let short_lived = {
        let mut state = state.lock().unwrap();
        state.token_requests.push(form.clone());
        state.short_lived_tokens
    };

    if !has_scheme(&headers, "Basic ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let expires_in = if short_lived { 0 } else { 3600 };
    let grant = form.get("grant_type").map(String::as_str);
    let code = form.get("code").map(String::as_str);
    match (grant, code) {
        (Some("authorization_code"), Some(GOOD_CODE)) => Json(json!({
            "access_token": "user-token",
            "token_type": "Bearer",
            "scope": "playlist-read-private playlist-modify-private",
            "expires_in": expires_in,
            "refresh_token": "refresh-token"
        }))
        .into_response(),
        (Some("refresh_token"), _) => Json(json!({
            "access_token": "refreshed-token",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        (Some("client_credentials"), _) => Json(json!({
            "access_token": "app-token",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response(),
    }
}

async fn me(headers: HeaderMap) -> Response {
    if !has_scheme(&headers, "Bearer ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "id": USER_ID, "display_name": "Test User" })).into_response()
}

async fn my_playlists(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !has_scheme(&headers, "Bearer ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let offset = offset(&query);
    let state = state.lock().unwrap();
    let items: Vec<Value> = state
        .playlists
        .iter()
        .skip(offset)
        .take(PLAYLIST_PAGE_SIZE)
        .map(|(id, name)| {
            json!({
                "id": id,
                "name": name,
                "href": format!("{}/v1/playlists/{}", state.base, id),
                "external_urls": { "spotify": format!("https://open.spotify.com/playlist/{}", id) },
                "owner": { "id": USER_ID }
            })
        })
        .collect();
    let next = (offset + PLAYLIST_PAGE_SIZE < state.playlists.len())
        .then(|| format!("{}/v1/me/playlists?offset={}", state.base, offset + PLAYLIST_PAGE_SIZE));

    Json(json!({ "items": items, "next": next })).into_response()
}

async fn playlist_tracks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !has_scheme(&headers, "Bearer ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let state = state.lock().unwrap();
    if state.null_pages.contains(&id) {
        return Json(Value::Null).into_response();
    }
    let Some(tracks) = state.tracks.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let offset = offset(&query);
    let items: Vec<Value> = tracks
        .iter()
        .skip(offset)
        .take(TRACK_PAGE_SIZE)
        .map(|uri| match uri {
            Some(uri) => {
                let track_id = uri.rsplit(':').next().unwrap_or(uri);
                json!({
                    "track": {
                        "id": track_id,
                        "uri": uri,
                        "name": format!("Track {}", track_id),
                        "href": format!("{}/v1/tracks/{}", state.base, track_id),
                        "external_urls": {
                            "spotify": format!("https://open.spotify.com/track/{}", track_id)
                        }
                    }
                })
            }
            None => json!({ "track": null }),
        })
        .collect();
    let next = (offset + TRACK_PAGE_SIZE < tracks.len()).then(|| {
        format!(
            "{}/v1/playlists/{}/tracks?offset={}",
            state.base,
            id,
            offset + TRACK_PAGE_SIZE
        )
    });

    Json(json!({ "items": items, "next": next })).into_response()
}

async fn create_playlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !has_scheme(&headers, "Bearer ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut state = state.lock().unwrap();
    let id = format!("new-{}", state.created.len() + 1);
    let name = body["name"].as_str().unwrap_or_default().to_string();
    state.created.push(CreatedPlaylist {
        user,
        name: name.clone(),
        description: body["description"].as_str().unwrap_or_default().to_string(),
        public: body["public"].as_bool().unwrap_or(true),
    });
    state.tracks.insert(id.clone(), Vec::new());

    let href = format!("{}/v1/playlists/{}", state.base, id);
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "name": name, "href": href })),
    )
        .into_response()
}

async fn add_tracks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !has_scheme(&headers, "Bearer ") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let barrier = state.lock().unwrap().upload_barrier.clone();
    if let Some(barrier) = barrier {
        barrier.wait().await;
    }

    let mut state = state.lock().unwrap();
    if state.fail_uploads {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let uris: Vec<String> = body["uris"]
        .as_array()
        .map(|a| a.iter().filter_map(|u| u.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    state.added.push((id, uris));

    (
        StatusCode::CREATED,
        Json(json!({ "snapshot_id": format!("snapshot-{}", state.added.len()) })),
    )
        .into_response()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends `request` through `router` in-process.
pub async fn call(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn randomize_request(authorization: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/randomizePlaylist")
        .header("content-type", "application/json");
    if let Some(auth) = authorization {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
