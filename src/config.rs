//! Configuration management for the Spotify Playlist Shuffler.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files. The values are read exactly once at startup
//! into an immutable [`Config`] which is then handed explicitly to the OAuth
//! session, the Spotify client and the HTTP router.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use serde::Deserialize;

use crate::error::Error;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPE: &str =
    "playlist-modify-private playlist-read-private user-modify-playback-state";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist and loads variables
/// from `spotshuffle/.env` under the platform-specific local data directory:
/// - Linux: `~/.local/share/spotshuffle/.env`
/// - macOS: `~/Library/Application Support/spotshuffle/.env`
/// - Windows: `%LOCALAPPDATA%/spotshuffle/.env`
///
/// A missing file is not an error; the process environment alone may carry
/// every value.
///
/// # Errors
///
/// Returns [`Error::Config`] if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), Error> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotshuffle/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::Config(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| Error::Config(e.to_string()))?;
    }
    Ok(())
}

/// Shape of the `SPOTIFY_CREDS` variable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    client_id: String,
    client_secret: String,
}

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub host: String,
    pub port: u16,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
}

impl Config {
    /// Builds a configuration with the given credentials and every other
    /// value at its default.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            redirect_uri: default_redirect_uri(DEFAULT_PORT),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Credentials come from `SPOTIFY_CREDS` (JSON with `clientId` and
    /// `clientSecret`) when set, otherwise from `SPOTIFY_CLIENT_ID` and
    /// `SPOTIFY_CLIENT_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when credentials are missing or malformed,
    /// or when `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, Error> {
        let creds = match env::var("SPOTIFY_CREDS") {
            Ok(raw) => serde_json::from_str::<Credentials>(&raw)
                .map_err(|e| Error::Config(format!("SPOTIFY_CREDS is malformed: {}", e)))?,
            Err(_) => Credentials {
                client_id: required("SPOTIFY_CLIENT_ID")?,
                client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            },
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT '{}' is invalid: {}", raw, e)))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            client_id: creds.client_id,
            client_secret: creds.client_secret,
            host: optional("HOST", DEFAULT_HOST),
            port,
            redirect_uri: env::var("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|_| default_redirect_uri(port)),
            auth_url: optional("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: optional("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: optional("SPOTIFY_API_URL", DEFAULT_API_URL),
            scope: optional("SPOTIFY_SCOPE", DEFAULT_SCOPE),
        })
    }

    /// Address the HTTP server binds to, e.g. `localhost:8888`.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Scopes requested by the authorization-code flow.
    pub fn scopes(&self) -> Vec<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

fn default_redirect_uri(port: u16) -> String {
    format!("http://localhost:{}/callback", port)
}

fn required(key: &str) -> Result<String, Error> {
    env::var(key).map_err(|_| Error::Config(format!("{} must be set", key)))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
