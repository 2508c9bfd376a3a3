//! OAuth2 token acquisition and caching for the Drive API
//!
//! Implements the installed-application flow: a consent URL is printed for
//! the operator, the authorization code is typed back in, and the exchanged
//! token is cached on disk so later runs skip the browser round-trip.
//! Expired access tokens are refreshed silently when a refresh token is
//! available.
//!
//! The rest of the crate only consumes the resulting bearer token; everything
//! here is the external-collaborator boundary in front of the core.

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use url::Url;

/// Read-only Drive scope requested during authorization
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Out-of-band redirect: the provider displays the code for manual copy
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tokens are refreshed this long before their nominal expiry so one does not
/// lapse mid-request
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access/refresh token pair persisted in the cache file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    /// Bearer token attached to API requests
    pub access_token: String,
    /// Long-lived token used to mint new access tokens, when granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Instant the access token stops being valid
    pub expiry: DateTime<Utc>,
}

impl CachedToken {
    /// Whether the access token is expired (or about to expire) at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry - TimeDelta::seconds(EXPIRY_MARGIN_SECS) <= now
    }
}

/// Wire format of the provider's token endpoint responses
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

impl TokenResponse {
    fn into_cached(self, now: DateTime<Utc>, fallback_refresh: Option<String>) -> CachedToken {
        CachedToken {
            access_token: self.access_token,
            // Refresh responses usually omit the refresh token; keep the one
            // already on file so subsequent runs can still refresh.
            refresh_token: self.refresh_token.or(fallback_refresh),
            expiry: now + TimeDelta::seconds(self.expires_in),
        }
    }
}

/// Produces bearer tokens for the Drive client, caching them across runs
pub struct Authenticator {
    http: reqwest::Client,
    config: AuthConfig,
}

impl Authenticator {
    /// Create an authenticator for the given OAuth configuration
    pub fn new(config: AuthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Obtain a valid access token, consulting the cache first
    ///
    /// Resolution order:
    /// 1. cached token that is still valid → used as-is
    /// 2. cached token with a refresh token → refresh grant
    /// 3. otherwise → interactive authorization-code flow on the terminal
    ///
    /// Steps 2 and 3 rewrite the cache file on success.
    pub async fn access_token(&self) -> Result<String> {
        if let Ok(cached) = self.load_cached() {
            if !cached.is_expired(Utc::now()) {
                return Ok(cached.access_token);
            }
            if let Some(refresh_token) = cached.refresh_token.clone() {
                tracing::debug!("cached access token expired, refreshing");
                let token = self.refresh(&refresh_token).await?;
                self.save_cached(&token)?;
                return Ok(token.access_token);
            }
        }

        let token = self.authorize_interactively().await?;
        self.save_cached(&token)?;
        Ok(token.access_token)
    }

    /// Consent URL the operator must open to authorize this client
    pub fn consent_url(&self) -> Result<Url> {
        Url::parse_with_params(
            &self.config.auth_url,
            [
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
                ("scope", DRIVE_READONLY_SCOPE),
                ("access_type", "offline"),
                ("state", "state-token"),
            ],
        )
        .map_err(|e| Error::Auth(format!("invalid authorization endpoint: {}", e)))
    }

    /// Exchange an authorization code for a token pair
    pub async fn exchange_code(&self, code: &str) -> Result<CachedToken> {
        let response = self
            .request_token(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", REDIRECT_URI),
                ("grant_type", "authorization_code"),
            ])
            .await?;
        Ok(response.into_cached(Utc::now(), None))
    }

    /// Mint a fresh access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<CachedToken> {
        let response = self
            .request_token(&[
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .await?;
        Ok(response.into_cached(Utc::now(), Some(refresh_token.to_string())))
    }

    /// Load the token cached on disk, if any
    pub fn load_cached(&self) -> Result<CachedToken> {
        let bytes = std::fs::read(&self.config.token_cache_path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Persist a token to the cache file (mode 0600 on Unix)
    pub fn save_cached(&self, token: &CachedToken) -> Result<()> {
        println!(
            "Saving credential file to: {}",
            self.config.token_cache_path.display()
        );
        let mut file = open_cache_file(&self.config.token_cache_path)?;
        serde_json::to_writer(&mut file, token)?;
        Ok(())
    }

    async fn authorize_interactively(&self) -> Result<CachedToken> {
        let url = self.consent_url()?;
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            url
        );
        print!("Enter authorization code: ");
        std::io::stdout().flush()?;

        let mut code = String::new();
        std::io::stdin().read_line(&mut code)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Auth("no authorization code entered".to_string()));
        }

        self.exchange_code(code).await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

#[cfg(unix)]
fn open_cache_file(path: &std::path::Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_cache_file(path: &std::path::Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
