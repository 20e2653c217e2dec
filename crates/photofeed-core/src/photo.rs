//! Photo entity and wire mapping
//!
//! [`PhotoEntry`] is the cached form of one feed item. The `*Payload` types
//! mirror the API's JSON bodies; field names are fixed by the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feed item as known to the cache
///
/// All fields except `is_liked` are immutable once the entry is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub welcome_description: Option<String>,
    pub thumbnail_url: String,
    pub full_url: String,
    pub width: u32,
    pub height: u32,
    pub is_liked: bool,
}

impl PhotoEntry {
    /// Copy of this entry with a different like state
    pub fn with_liked(&self, is_liked: bool) -> Self {
        Self {
            is_liked,
            ..self.clone()
        }
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// One element of a page response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoPayload {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    pub width: u32,
    pub height: u32,
    pub liked_by_user: bool,
    pub urls: PhotoUrlsPayload,
}

/// Nested URL object of a photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrlsPayload {
    pub thumb: String,
    pub full: String,
}

/// Body of a like or unlike response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponsePayload {
    pub photo: LikedPhotoPayload,
}

/// The part of the liked photo the cache reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikedPhotoPayload {
    pub liked_by_user: bool,
}

impl TryFrom<PhotoPayload> for PhotoEntry {
    type Error = crate::Error;

    fn try_from(payload: PhotoPayload) -> Result<Self, Self::Error> {
        if payload.id.is_empty() {
            return Err(crate::Error::data("photo id cannot be empty"));
        }
        if payload.width == 0 || payload.height == 0 {
            return Err(crate::Error::data(format!(
                "photo {} has non-positive dimensions {}x{}",
                payload.id, payload.width, payload.height
            )));
        }

        Ok(Self {
            id: payload.id,
            created_at: payload.created_at,
            welcome_description: payload.description,
            thumbnail_url: payload.urls.thumb,
            full_url: payload.urls.full,
            width: payload.width,
            height: payload.height,
            is_liked: payload.liked_by_user,
        })
    }
}

/// Decode a page body into entries, in response order
///
/// Fails as a whole if any element is malformed.
pub fn decode_page(body: &[u8]) -> Result<Vec<PhotoEntry>, crate::Error> {
    let payloads: Vec<PhotoPayload> = serde_json::from_slice(body)?;
    payloads.into_iter().map(PhotoEntry::try_from).collect()
}

/// Decode the server-confirmed like state from a toggle response body
pub fn decode_like(body: &[u8]) -> Result<bool, crate::Error> {
    let payload: LikeResponsePayload = serde_json::from_slice(body)?;
    Ok(payload.photo.liked_by_user)
}
