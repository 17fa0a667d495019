use axum::{
    Extension, Json,
    extract::Query,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use crate::{
    Res,
    api::AppState,
    error::Error,
    success,
    types::{CallbackPayload, RefreshPayload, TokenPayload},
    utils,
};

/// Name of the cookie carrying the authorization nonce.
pub const NONCE_COOKIE: &str = "spotify";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshParams {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

pub async fn auth_token(Extension(state): Extension<AppState>) -> Res<Json<TokenPayload>> {
    let token = state.oauth_session().client_credentials_token().await?;
    Ok(Json(TokenPayload { token }))
}

pub async fn authorize(
    Extension(state): Extension<AppState>,
    jar: CookieJar,
) -> Res<(CookieJar, Redirect)> {
    let mut session = state.oauth_session();
    let request = session.begin_authorization_code_flow(&state.config.scopes())?;

    let cookie = Cookie::build((NONCE_COOKIE, utils::encode_cookie_value(&request.nonce)))
        .path("/")
        .build();

    Ok((jar.add(cookie), Redirect::to(&request.redirect_url)))
}

/// Completes the authorization-code flow.
///
/// The nonce cookie is removed whatever the outcome, so the same callback
/// cannot be replayed.
pub async fn callback(
    Extension(state): Extension<AppState>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> (CookieJar, Res<Json<CallbackPayload>>) {
    let stored_nonce = jar
        .get(NONCE_COOKIE)
        .and_then(|c| utils::decode_cookie_value(c.value()));
    let jar = jar.remove(Cookie::build(NONCE_COOKIE).path("/"));

    let result = complete(&state, params, stored_nonce).await;
    (jar, result.map(Json))
}

async fn complete(
    state: &AppState,
    params: CallbackParams,
    stored_nonce: Option<String>,
) -> Res<CallbackPayload> {
    let mut session = state.oauth_session();
    let creds = session
        .complete_authorization_code_flow(
            params.code.as_deref(),
            params.state.as_deref(),
            stored_nonce.as_deref(),
        )
        .await?;

    let user = state.spotify.me(&creds.access_token).await?;
    success!("Authenticated Spotify user {}", user.id);

    Ok(CallbackPayload { creds, user })
}

pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    Query(params): Query<RefreshParams>,
) -> Res<Json<RefreshPayload>> {
    let refresh_token = params
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Error::Validation("query parameter 'refreshToken' is required".to_string())
        })?;

    let refreshed = state
        .oauth_session()
        .refresh_access_token(&refresh_token)
        .await?;

    Ok(Json(RefreshPayload {
        token: refreshed.access_token,
        expires_in: refreshed.expires_in,
    }))
}
