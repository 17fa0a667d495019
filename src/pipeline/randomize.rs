//! The randomize run as a stage graph:
//!
//! ```text
//! {fetch-playlists, fetch-user}
//!            ↓
//! locate-playlist-and-fetch-tracks
//!            ↓
//! create-destination-playlist
//!            ↓
//! shuffle-and-batch-and-upload
//! ```

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Res,
    pipeline::{Context, Pipeline, Stage},
    spotify::{
        SpotifyClient,
        playlists::{locate, upload_batches},
    },
    types::{BATCH_CAPACITY, Playlist, PlaylistInfo, RandomizeOutcome, User},
    utils,
};

pub const FETCH_PLAYLISTS: &str = "fetch-playlists";
pub const FETCH_USER: &str = "fetch-user";
pub const LOCATE_AND_FETCH_TRACKS: &str = "locate-playlist-and-fetch-tracks";
pub const CREATE_DESTINATION: &str = "create-destination-playlist";
pub const SHUFFLE_AND_UPLOAD: &str = "shuffle-and-batch-and-upload";

const PLAYLISTS_KEY: &str = "playlists";
const USER_KEY: &str = "user";
const PLAYLIST_INFO_KEY: &str = "playlistInfo";
const NEW_PLAYLIST_KEY: &str = "newPlaylist";
const UPLOADED_KEY: &str = "uploaded";

/// Copies the playlist named `playlist_name` into a new, shuffled playlist.
///
/// Randomness comes from the operating system.
pub async fn run(
    client: &SpotifyClient,
    token: &str,
    playlist_name: &str,
) -> Res<RandomizeOutcome> {
    run_with_rng(client, token, playlist_name, StdRng::from_os_rng()).await
}

/// Same as [`run`], drawing the name suffix and the permutation from `rng`.
///
/// A failing stage aborts the run. A destination playlist created before
/// the failure is left in place.
pub async fn run_with_rng(
    client: &SpotifyClient,
    token: &str,
    playlist_name: &str,
    mut rng: StdRng,
) -> Res<RandomizeOutcome> {
    let naming_rng = StdRng::from_rng(&mut rng);
    let token = token.to_string();
    let playlist_name = playlist_name.to_string();

    let pipeline = Pipeline::new()
        .stage(
            Stage::new(FETCH_PLAYLISTS, {
                let (client, token) = (client.clone(), token.clone());
                move |_| fetch_playlists(client, token)
            })
            .publishes(PLAYLISTS_KEY),
        )
        .stage(
            Stage::new(FETCH_USER, {
                let (client, token) = (client.clone(), token.clone());
                move |_| fetch_user(client, token)
            })
            .publishes(USER_KEY),
        )
        .stage(
            Stage::new(LOCATE_AND_FETCH_TRACKS, {
                let (client, token) = (client.clone(), token.clone());
                move |ctx| locate_and_fetch_tracks(ctx, client, token, playlist_name)
            })
            .depends_on([FETCH_PLAYLISTS])
            .publishes(PLAYLIST_INFO_KEY),
        )
        .stage(
            Stage::new(CREATE_DESTINATION, {
                let (client, token) = (client.clone(), token.clone());
                move |ctx| create_destination(ctx, client, token, naming_rng)
            })
            .depends_on([FETCH_USER, LOCATE_AND_FETCH_TRACKS])
            .publishes(NEW_PLAYLIST_KEY),
        )
        .stage(
            Stage::new(SHUFFLE_AND_UPLOAD, {
                let client = client.clone();
                move |ctx| shuffle_and_upload(ctx, client, token, rng)
            })
            .depends_on([LOCATE_AND_FETCH_TRACKS, CREATE_DESTINATION])
            .publishes(UPLOADED_KEY),
        );

    let context = pipeline.run().await?;
    let playlist = context.get::<Playlist>(NEW_PLAYLIST_KEY)?;
    let uploaded_tracks = context.get::<usize>(UPLOADED_KEY)?;

    Ok(RandomizeOutcome {
        playlist: (*playlist).clone(),
        uploaded_tracks: *uploaded_tracks,
    })
}

async fn fetch_playlists(client: SpotifyClient, token: String) -> Res<Vec<Playlist>> {
    Ok(client.playlists(&token).await?)
}

async fn fetch_user(client: SpotifyClient, token: String) -> Res<User> {
    Ok(client.me(&token).await?)
}

async fn locate_and_fetch_tracks(
    ctx: Arc<Context>,
    client: SpotifyClient,
    token: String,
    playlist_name: String,
) -> Res<PlaylistInfo> {
    let playlists = ctx.get::<Vec<Playlist>>(PLAYLISTS_KEY)?;
    let playlist = locate(&playlists, &playlist_name)?.clone();
    let tracks = client.playlist_tracks(&token, &playlist).await?;

    Ok(PlaylistInfo { playlist, tracks })
}

async fn create_destination(
    ctx: Arc<Context>,
    client: SpotifyClient,
    token: String,
    mut rng: StdRng,
) -> Res<Playlist> {
    let user = ctx.get::<User>(USER_KEY)?;
    let info = ctx.get::<PlaylistInfo>(PLAYLIST_INFO_KEY)?;

    let created = client
        .create_shuffled_playlist(&token, &user.id, &info.playlist.name, &mut rng)
        .await?;
    Ok(created)
}

async fn shuffle_and_upload(
    ctx: Arc<Context>,
    client: SpotifyClient,
    token: String,
    mut rng: StdRng,
) -> Res<usize> {
    let info = ctx.get::<PlaylistInfo>(PLAYLIST_INFO_KEY)?;
    let destination = ctx.get::<Playlist>(NEW_PLAYLIST_KEY)?;

    let uris: Vec<String> = info.tracks.iter().map(|t| t.uri.clone()).collect();
    let shuffled = utils::shuffle(&uris, &mut rng);
    let batches = utils::chunk(&shuffled, BATCH_CAPACITY);

    upload_batches(&client, &token, &destination.id, batches).await?;
    Ok(shuffled.len())
}
