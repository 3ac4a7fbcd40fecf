use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VideoError {
    #[error("video id cannot be empty")]
    EmptyId,

    #[error("not a valid video URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported video host: {0}")]
    UnsupportedHost(String),

    #[error("URL does not carry a video id")]
    MissingId,
}

//
// ─── VIDEO ID ──────────────────────────────────────────────────────────────────
//

/// Reference to an externally hosted lesson video.
///
/// Only the provider-side id is stored; embed and thumbnail URLs are derived
/// on demand.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Creates a `VideoId` from a raw id string.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::EmptyId` if the id is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, VideoError> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(VideoError::EmptyId);
        }
        Ok(Self(id.to_owned()))
    }

    /// Extracts the video id from a watch URL.
    ///
    /// Accepts both `youtube.com/watch?v=<id>` and `youtu.be/<id>` forms.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::InvalidUrl` for unparseable input,
    /// `VideoError::UnsupportedHost` for non-YouTube hosts, and
    /// `VideoError::MissingId` when the URL carries no id.
    pub fn from_watch_url(raw: &str) -> Result<Self, VideoError> {
        let url = Url::parse(raw).map_err(|_| VideoError::InvalidUrl(raw.to_owned()))?;
        let host = url
            .host_str()
            .ok_or_else(|| VideoError::InvalidUrl(raw.to_owned()))?;

        if host.ends_with("youtube.com") {
            let id = url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .ok_or(VideoError::MissingId)?;
            Self::new(id)
        } else if host.ends_with("youtu.be") {
            let id = url.path().trim_start_matches('/');
            if id.is_empty() {
                return Err(VideoError::MissingId);
            }
            Self::new(id)
        } else {
            Err(VideoError::UnsupportedHost(host.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Player URL for embedding the video.
    #[must_use]
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.0)
    }

    /// Full-size thumbnail URL for the video.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", self.0)
    }
}

impl fmt::Debug for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VideoId({})", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
