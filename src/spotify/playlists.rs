use rand::Rng;

use crate::{
    error::{Error, UpstreamError},
    spotify::{SpotifyClient, decode, pagination, send},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, Batch, CreatePlaylistRequest,
        CreatePlaylistResponse, Playlist, PlaylistObject, PlaylistTrackItem, Track,
    },
    utils, warning,
};

impl SpotifyClient {
    /// Every playlist of the user owning `token`, in listing order.
    ///
    /// Follows the `next` links of `GET /me/playlists` until the listing ends.
    pub async fn playlists(&self, token: &str) -> Result<Vec<Playlist>, UpstreamError> {
        let start = format!("{}/me/playlists", self.api_url());
        let items = pagination::traverse(start, |cursor| {
            self.fetch_page::<PlaylistObject>(token, cursor)
        })
        .await?;

        Ok(items.into_iter().map(Playlist::from).collect())
    }

    /// Every track of `playlist`, in playlist order.
    ///
    /// Items without a track object (removed or unavailable tracks) are
    /// skipped.
    pub async fn playlist_tracks(
        &self,
        token: &str,
        playlist: &Playlist,
    ) -> Result<Vec<Track>, UpstreamError> {
        let start = format!("{}/tracks", playlist.href.trim_end_matches('/'));
        let items = pagination::traverse(start, |cursor| {
            self.fetch_page::<PlaylistTrackItem>(token, cursor)
        })
        .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.track)
            .map(Track::from)
            .collect())
    }

    /// Creates a private playlist owned by `user_id`.
    pub async fn create_playlist(
        &self,
        token: &str,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist, UpstreamError> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: false,
        };

        let url = format!("{}/users/{}/playlists", self.api_url(), user_id);
        let response = send(self.http().post(&url).bearer_auth(token).json(&body), &url).await?;
        let created: CreatePlaylistResponse = decode(response).await?;

        Ok(Playlist {
            id: created.id,
            name: created.name.unwrap_or_else(|| name.to_string()),
            external_href: created.external_urls.spotify,
            href: created.href,
            owner: Some(user_id.to_string()),
        })
    }

    /// Creates the destination playlist for a shuffled copy of `source_name`.
    ///
    /// The name is `{source_name} -shuffled-{n}` with `n` drawn from `rng`.
    /// Existing playlists are not checked, so a name may repeat.
    pub async fn create_shuffled_playlist<R: Rng + ?Sized>(
        &self,
        token: &str,
        user_id: &str,
        source_name: &str,
        rng: &mut R,
    ) -> Result<Playlist, UpstreamError> {
        let name = shuffled_name(source_name, utils::random_suffix(rng));
        let description = format!(
            "Shuffled playlist created by shuffler from playlist {}",
            source_name
        );

        self.create_playlist(token, user_id, &name, &description).await
    }

    /// Appends `uris` to the playlist in a single request.
    pub async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: Batch,
    ) -> Result<AddTrackToPlaylistResponse, UpstreamError> {
        let url = format!("{}/playlists/{}/tracks", self.api_url(), playlist_id);
        let body = AddTrackToPlaylistRequest { uris };
        let response = send(self.http().post(&url).bearer_auth(token).json(&body), &url).await?;
        decode(response).await
    }
}

pub fn shuffled_name(source_name: &str, suffix: u16) -> String {
    format!("{} -shuffled-{}", source_name, suffix)
}

/// First playlist named exactly `name`, in enumeration order.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no playlist carries that name.
pub fn locate<'a>(playlists: &'a [Playlist], name: &str) -> Result<&'a Playlist, Error> {
    playlists
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

/// Dispatches one add-tracks request per batch, all at once.
///
/// Each batch runs in its own task, so completion order (and with it the
/// order the provider appends in) is not the submission order. Every task is
/// awaited; a failing batch neither cancels nor rolls back the others.
///
/// # Errors
///
/// Returns [`UpstreamError::BatchUploadFailed`] if any batch failed.
pub async fn upload_batches(
    client: &SpotifyClient,
    token: &str,
    playlist_id: &str,
    batches: Vec<Batch>,
) -> Result<(), UpstreamError> {
    let total = batches.len();
    let mut handles = Vec::with_capacity(total);

    for batch in batches {
        let client = client.clone();
        let token = token.to_string();
        let playlist_id = playlist_id.to_string();
        let handle =
            tokio::spawn(async move { client.add_tracks(&token, &playlist_id, batch).await });
        handles.push(handle);
    }

    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warning!("Failed to add tracks to playlist {}: {}", playlist_id, e);
                failed += 1;
            }
            Err(e) => {
                warning!("Task join error: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(UpstreamError::BatchUploadFailed { failed, total });
    }
    Ok(())
}
