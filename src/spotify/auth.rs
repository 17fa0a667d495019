use std::{mem, sync::Arc};

use chrono::Utc;
use reqwest::{Client, Url};

use crate::{
    config::Config,
    error::{AuthError, Error},
    types::{AuthorizationRequest, Credentials, RefreshedToken, Token, TokenResponse},
    utils,
};

/// Where an [`OAuthSession`] stands in the authorization-code flow.
#[derive(Debug, Clone)]
pub enum AuthState {
    Unauthenticated,
    /// A nonce was issued and the provider's callback has not arrived yet.
    AwaitingCallback { nonce: String },
    Authenticated(Token),
    /// Tokens are held but the access token is past its expiry.
    Expired(Token),
}

/// OAuth session against the Spotify accounts service.
///
/// Drives the authorization-code grant (nonce issuance, callback
/// verification, code exchange), token refresh and the independent
/// client-credentials grant. Credentials and endpoints come from the
/// [`Config`] the session is built with.
///
/// # State Machine
///
/// ```text
/// Unauthenticated --begin--> AwaitingCallback --complete--> Authenticated
///        ^                          |                          |  ^
///        +------ state mismatch ----+                  expiry  |  | refresh
///                                                              v  |
///                                                            Expired
/// ```
///
/// A nonce is consumed by the first callback attempt whatever its outcome,
/// so a replayed callback carrying the same state fails.
#[derive(Debug)]
pub struct OAuthSession {
    config: Arc<Config>,
    http: Client,
    state: AuthState,
}

impl OAuthSession {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_http(config, Client::new())
    }

    pub fn with_http(config: Arc<Config>, http: Client) -> Self {
        Self {
            config,
            http,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Moves an authenticated session to [`AuthState::Expired`] once its
    /// access token is past `expires_at`.
    pub fn refresh_state(&mut self) -> &AuthState {
        if let AuthState::Authenticated(token) = &self.state {
            if token.is_expired() {
                self.state = AuthState::Expired(token.clone());
            }
        }
        &self.state
    }

    /// Starts the authorization-code flow.
    ///
    /// Draws a fresh nonce and builds the provider's authorize URL carrying
    /// it as `state` together with `scopes`. The caller persists the nonce
    /// for the in-flight request (the HTTP service uses a cookie) and hands
    /// it back to [`complete_authorization_code_flow`](Self::complete_authorization_code_flow).
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configured authorize URL does not parse.
    pub fn begin_authorization_code_flow<S: AsRef<str>>(
        &mut self,
        scopes: &[S],
    ) -> Result<AuthorizationRequest, Error> {
        let nonce = utils::generate_nonce(utils::NONCE_LENGTH);
        let scope = scopes
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");

        let redirect_url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", scope.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", nonce.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorize url: {}", e)))?;

        self.state = AuthState::AwaitingCallback {
            nonce: nonce.clone(),
        };

        Ok(AuthorizationRequest {
            redirect_url: redirect_url.to_string(),
            nonce,
        })
    }

    /// Finishes the authorization-code flow.
    ///
    /// `presented_state` is the `state` the provider echoed on the callback,
    /// `stored_nonce` the value persisted when the flow began. When the
    /// caller has none, the nonce issued by this session (if any) is used.
    /// Either way the nonce is consumed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::StateMismatch`] if the presented state is absent or
    ///   differs from the stored nonce. No request is sent in that case.
    /// - [`AuthError::TokenExchangeFailed`] if the code is missing or the
    ///   token endpoint rejects the exchange.
    pub async fn complete_authorization_code_flow(
        &mut self,
        code: Option<&str>,
        presented_state: Option<&str>,
        stored_nonce: Option<&str>,
    ) -> Result<Credentials, AuthError> {
        let issued = match mem::replace(&mut self.state, AuthState::Unauthenticated) {
            AuthState::AwaitingCallback { nonce } => Some(nonce),
            _ => None,
        };
        let expected = stored_nonce.map(str::to_string).or(issued);

        match (presented_state, expected.as_deref()) {
            (Some(presented), Some(expected)) if presented == expected => {}
            _ => return Err(AuthError::StateMismatch),
        }

        let code =
            code.ok_or_else(|| AuthError::TokenExchangeFailed("missing code".to_string()))?;
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        let refresh_token = response.refresh_token.clone().ok_or_else(|| {
            AuthError::TokenExchangeFailed("response carries no refresh token".to_string())
        })?;

        let token = to_token(response, refresh_token);
        let credentials = Credentials {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
        };
        self.state = AuthState::Authenticated(token);

        Ok(credentials)
    }

    /// Exchanges `refresh_token` for a new access token.
    ///
    /// Works without a prior authorization-code flow in this session. When
    /// the session holds tokens it is updated and ends up
    /// [`AuthState::Authenticated`]; a refresh token that the provider does
    /// not rotate is kept.
    pub async fn refresh_access_token(
        &mut self,
        refresh_token: &str,
    ) -> Result<RefreshedToken, AuthError> {
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        let refreshed = RefreshedToken {
            access_token: response.access_token.clone(),
            expires_in: response.expires_in.unwrap_or(3600),
        };

        let refresh_token = response
            .refresh_token
            .clone()
            .unwrap_or_else(|| refresh_token.to_string());
        self.state = AuthState::Authenticated(to_token(response, refresh_token));

        Ok(refreshed)
    }

    /// Current access token, refreshed first if it has expired.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] when the session holds no tokens, or
    /// the refresh failure.
    pub async fn valid_access_token(&mut self) -> Result<String, AuthError> {
        match self.refresh_state().clone() {
            AuthState::Authenticated(token) => Ok(token.access_token),
            AuthState::Expired(token) => {
                let refreshed = self.refresh_access_token(&token.refresh_token).await?;
                Ok(refreshed.access_token)
            }
            AuthState::Unauthenticated | AuthState::AwaitingCallback { .. } => {
                Err(AuthError::NotAuthenticated)
            }
        }
    }

    /// Anonymous, scope-less app token for public read-only endpoints.
    ///
    /// Independent of the session state.
    pub async fn client_credentials_token(&self) -> Result<String, AuthError> {
        let response = self
            .request_token(&[("grant_type", "client_credentials")])
            .await?;
        Ok(response.access_token)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::TokenExchangeFailed(format!(
                "token endpoint responded with {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;
        serde_json::from_slice::<TokenResponse>(&body)
            .map_err(|e| AuthError::TokenExchangeFailed(format!("malformed token body: {}", e)))
    }
}

fn to_token(response: TokenResponse, refresh_token: String) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token,
        scope: response.scope.unwrap_or_default(),
        expires_in: response.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    }
}
