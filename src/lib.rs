//! Spotify Playlist Shuffler Library
//!
//! This library provides functionality for copying a user's Spotify playlist into
//! a freshly created playlist with the tracks in randomized order. It includes
//! modules for the OAuth flows, the Spotify Web API calls, the stage graph that
//! sequences a randomize run and the HTTP service exposing all of it.
//!
//! # Modules
//!
//! - `api` - HTTP handlers of the local service
//! - `config` - Configuration loading from environment and `.env` files
//! - `error` - Error taxonomy shared by every layer
//! - `pipeline` - Dependency-graph executor and the randomize graph
//! - `server` - Router construction and server bootstrap
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Shuffling, batching and random helpers
//!
//! # Example
//!
//! ```
//! use spotshuffle::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotshuffle::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{AuthError, Error, UpstreamError};

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports one of the kinds of
/// [`Error`], so callers can match on the failure instead of inspecting
/// strings.
///
/// # Example
///
/// ```
/// use spotshuffle::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Example
///
/// ```
/// info!("Starting server on {}", addr);
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Used to provide positive feedback when operations complete successfully.
///
/// # Example
///
/// ```
/// success!("Playlist {} created", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It is only used by the binary for fatal startup
/// errors; request handling never calls it.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues, such as a failed request or a stage of the
/// randomize pipeline that aborted the run.
///
/// # Example
///
/// ```
/// warning!("Stage {} failed: {}", stage, err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
