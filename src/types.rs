use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of track URIs the add-tracks endpoint accepts per request.
pub const BATCH_CAPACITY: usize = 90;

/// Ordered track URIs sent in a single add-tracks request.
pub type Batch = Vec<String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Unix timestamp after which the access token is no longer valid.
    pub fn expires_at(&self) -> u64 {
        self.obtained_at + self.expires_in
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() as u64 >= self.expires_at()
    }
}

/// Body of a successful answer from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Where to send the user to start the authorization-code flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub redirect_url: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    pub href: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub external_href: Option<String>,
    pub href: String,
    pub owner: Option<String>,
}

impl From<PlaylistObject> for Playlist {
    fn from(p: PlaylistObject) -> Self {
        Playlist {
            id: p.id,
            name: p.name,
            external_href: p.external_urls.spotify,
            href: p.href,
            owner: p.owner.map(|o| o.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackObject {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    pub href: Option<String>,
    pub external_href: Option<String>,
}

impl From<TrackObject> for Track {
    fn from(t: TrackObject) -> Self {
        Track {
            id: t.id,
            uri: t.uri,
            name: t.name,
            href: t.href,
            external_href: t.external_urls.spotify,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub href: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomizeRequest {
    #[serde(default)]
    pub playlist: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizeResponse {
    pub new_playlist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub creds: Credentials,
    pub user: User,
}

/// Outcome of one randomize run.
#[derive(Debug, Clone)]
pub struct RandomizeOutcome {
    pub playlist: Playlist,
    pub uploaded_tracks: usize,
}

/// Source playlist located by name, with all of its tracks.
#[derive(Debug, Clone)]
pub struct PlaylistInfo {
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}
