//! Error types shared by the OAuth flows, the Spotify client, the pipeline
//! executor and the HTTP boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures of the OAuth flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The `state` presented on callback is absent or differs from the stored nonce.
    #[error("State mismatch.")]
    StateMismatch,

    /// The token endpoint answered with a non-success status or a malformed body.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The session holds no tokens yet.
    #[error("Not authenticated.")]
    NotAuthenticated,
}

/// Failures talking to the Spotify Web API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// A page fetch yielded no page object at all.
    #[error("Upstream returned an empty response")]
    EmptyResponse,

    /// At least one add-tracks request was rejected.
    #[error("{failed} of {total} track batches failed to upload")]
    BatchUploadFailed { failed: usize, total: usize },

    #[error("Upstream responded with {status} for {url}")]
    NonSuccessStatus { status: u16, url: String },

    #[error("Upstream returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The named playlist is not among the user's playlists.
    #[error("Playlist not found: {0}")]
    NotFound(String),

    /// A required request field is missing or malformed.
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The stage graph is malformed or a stage read a context key it may not.
    #[error("Invalid stage graph: {0}")]
    Graph(String),

    /// A pipeline stage failed; the run was aborted.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps `self` with the name of the stage that produced it.
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        Error::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through stage annotations.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the failing stage, if the error came out of a pipeline run.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Error::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Machine-readable kind reported to HTTP clients.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Error::Auth(AuthError::StateMismatch) => "state_mismatch",
            Error::Auth(AuthError::TokenExchangeFailed(_)) => "token_exchange_failed",
            Error::Auth(AuthError::NotAuthenticated) => "not_authenticated",
            Error::Upstream(UpstreamError::EmptyResponse) => "empty_response",
            Error::Upstream(UpstreamError::BatchUploadFailed { .. }) => "batch_upload_failed",
            Error::Upstream(UpstreamError::NonSuccessStatus { .. }) => "non_success_status",
            Error::Upstream(UpstreamError::MalformedBody(_)) => "malformed_body",
            Error::Upstream(UpstreamError::Request(_)) => "upstream_request_failed",
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "validation",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Graph(_) => "invalid_graph",
            Error::Stage { .. } => "stage_failed",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "statusCode": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
