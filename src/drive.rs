//! Remote store seam and the Google Drive v3 client
//!
//! The lister and the download coordinator only speak [`FileStore`]; the
//! trait keeps them testable against in-memory doubles and keeps every
//! Drive-specific detail (endpoints, auth header, response shapes) in
//! [`DriveClient`].

use crate::error::{Error, Result};
use crate::types::FilePage;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

/// Byte-chunk stream for a single remote file's content
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Abstraction over the remote file store
///
/// Two opaque operations, each of which can fail: fetch one listing page, and
/// open a content stream for one identifier.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch one listing page; `None` requests the first page
    async fn list_page(&self, page_token: Option<&str>) -> Result<FilePage>;

    /// Open a byte stream for the content of a single file
    async fn open_stream(&self, file_id: &str) -> Result<ByteStream>;
}

/// Default API base
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Partial-response selector: only the fields the match set needs
const LIST_FIELDS: &str = "nextPageToken,files(id,name)";

/// Google Drive v3 implementation of [`FileStore`]
///
/// No request timeout is configured; a hung API call blocks its task
/// indefinitely, matching the tool's historical behavior.
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    page_size: usize,
}

impl DriveClient {
    /// Create a client against the public Drive API
    pub fn new(access_token: impl Into<String>, page_size: usize) -> Self {
        Self::with_base_url(access_token, page_size, DEFAULT_BASE_URL)
    }

    /// Create a client against an alternate API base (used by tests)
    pub fn with_base_url(
        access_token: impl Into<String>,
        page_size: usize,
        base_url: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token: access_token.into(),
            page_size,
        }
    }
}

#[async_trait]
impl FileStore for DriveClient {
    async fn list_page(&self, page_token: Option<&str>) -> Result<FilePage> {
        let page_size = self.page_size.to_string();
        let mut request = self
            .http
            .get(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("pageSize", page_size.as_str()), ("fields", LIST_FIELDS)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::RemoteApi {
                endpoint: "drive/v3/files".to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<FilePage>().await?)
    }

    async fn open_stream(&self, file_id: &str) -> Result<ByteStream> {
        let response = self
            .http
            .get(format!("{}/drive/v3/files/{}", self.base_url, file_id))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::RemoteApi {
                endpoint: format!("drive/v3/files/{}", file_id),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes_stream().map_err(Error::from).boxed())
    }
}
