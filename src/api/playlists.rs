use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, header::AUTHORIZATION},
};

use crate::{
    Res,
    api::AppState,
    error::Error,
    info,
    pipeline::randomize,
    success,
    types::{RandomizeRequest, RandomizeResponse},
    utils,
};

/// Copies the named playlist into a new playlist in shuffled order.
///
/// Requires an `authorization` header carrying a user access token (with or
/// without the `Bearer ` prefix) and a JSON body `{ "playlist": name }`.
pub async fn randomize_playlist(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Result<Json<RandomizeRequest>, JsonRejection>,
) -> Res<Json<RandomizeResponse>> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(utils::bearer_token)
        .ok_or_else(|| Error::Validation("header 'authorization' is required".to_string()))?
        .to_string();

    let Json(request) = body.map_err(|e| Error::Validation(e.body_text()))?;
    let playlist = request
        .playlist
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::Validation("field 'playlist' is required".to_string()))?;

    info!("Randomizing playlist {}", playlist);
    let outcome = randomize::run(&state.spotify, &token, &playlist).await?;
    success!(
        "Created {} with {} tracks",
        outcome.playlist.name,
        outcome.uploaded_tracks
    );

    Ok(Json(RandomizeResponse {
        new_playlist: outcome.playlist.name,
    }))
}
