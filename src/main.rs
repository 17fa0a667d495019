use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotshuffle::{
    config::{self, Config},
    error, info,
    pipeline::randomize,
    server,
    spotify::{SpotifyClient, auth::OAuthSession},
    success, warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeOptions),

    /// Print a client-credentials token
    Token,

    /// Shuffle a playlist into a new playlist
    Randomize(RandomizeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Port to listen on (overrides PORT)
    #[clap(long)]
    port: Option<u16>,

    /// Open the authorization page in the browser once the server is up
    #[clap(long)]
    open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RandomizeOptions {
    /// Exact name of the playlist to shuffle
    #[clap(long)]
    playlist: String,

    /// User access token with playlist read and modify scopes
    #[clap(long, env = "SPOTIFY_ACCESS_TOKEN")]
    token: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load .env file. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    match cli.command {
        Command::Serve(opt) => {
            if let Some(port) = opt.port {
                config.port = port;
            }
            if opt.open {
                let url = format!("http://{}/authorize", config.server_addr());
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                    if webbrowser::open(&url).is_err() {
                        warning!(
                            "Failed to open browser. Please navigate to the following URL manually:\n{}",
                            url
                        )
                    }
                });
            }
            if let Err(e) = server::start_api_server(config).await {
                error!("Server stopped. Err: {}", e);
            }
        }
        Command::Token => {
            let session = OAuthSession::new(std::sync::Arc::new(config));
            match session.client_credentials_token().await {
                Ok(token) => println!("{}", token),
                Err(e) => error!("Failed to fetch token. Err: {}", e),
            }
        }
        Command::Randomize(opt) => {
            let client = SpotifyClient::new(&config);
            info!("Randomizing playlist {}", opt.playlist);
            match randomize::run(&client, &opt.token, &opt.playlist).await {
                Ok(outcome) => success!(
                    "Created {} with {} tracks",
                    outcome.playlist.name,
                    outcome.uploaded_tracks
                ),
                Err(e) => error!("Failed to randomize playlist. Err: {}", e),
            }
        }
        Command::Completions(_) => {}
    }
}
