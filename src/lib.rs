//! # gdpull
//!
//! Pattern-matching batch downloader for Google Drive.
//!
//! gdpull lists every file visible to the authorized account, keeps the ones
//! whose display name matches a regular expression, and downloads the matches
//! with a bounded number of concurrent transfers.
//!
//! ## Design
//!
//! - **Listing is sequential** — pages are fetched one at a time with the
//!   provider's cursor pagination and filtered into a [`MatchSet`].
//! - **Downloading is parallel** — the coordinator spawns one task per match
//!   and admits at most K transfers at once via a counting semaphore.
//! - **Failures stay local** — a failed transfer is logged and reported in
//!   its [`DownloadOutcome`]; siblings are never aborted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gdpull::{Config, DriveClient, FileStore, list_matching, download_all};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let auth = gdpull::Authenticator::new(config.auth.clone());
//!     let token = auth.access_token().await?;
//!
//!     let store: Arc<dyn FileStore> =
//!         Arc::new(DriveClient::new(token, config.download.page_size));
//!     let filter = regex::Regex::new("^report_")?;
//!
//!     let matches = list_matching(store.as_ref(), &filter).await?;
//!     let outcomes = download_all(
//!         store,
//!         &matches,
//!         &config.download.download_dir,
//!         config.download.max_concurrent_downloads,
//!     )
//!     .await;
//!     println!("downloaded {} files", outcomes.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// OAuth2 token acquisition and caching
pub mod auth;
/// Configuration types
pub mod config;
/// Interactive confirmation prompt
pub mod confirm;
/// Bounded-concurrency download coordinator
pub mod coordinator;
/// Remote store seam and the Drive v3 client
pub mod drive;
/// Error types
pub mod error;
/// Paginated listing and name filtering
pub mod lister;
/// Core types: listing pages, the match set, download outcomes
pub mod types;

// Re-export commonly used types
pub use auth::{Authenticator, CachedToken, DRIVE_READONLY_SCOPE};
pub use config::{AuthConfig, Config, DownloadConfig, ENV_CLIENT_ID, ENV_CLIENT_SECRET};
pub use confirm::confirm_download;
pub use coordinator::download_all;
pub use drive::{ByteStream, DriveClient, FileStore};
pub use error::{Error, Result};
pub use lister::list_matching;
pub use types::{DownloadOutcome, FilePage, MatchSet, OutcomeKind, RemoteFile};
