use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live, time-limited read grant issued by the object-storage service.
/// The storage service owns grant state; this is only a point-in-time view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: String,
    pub name: String,
    /// Path fragment the storage service serves the grant under; the final
    /// playback URL is `endpoint + access_uri + object_path`.
    pub access_uri: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Parameters for a new grant request against the storage service.
#[derive(Debug, Clone)]
pub struct GrantRequest {
    pub name: String,
    pub object_path: String,
    pub access: AccessMode,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read access to the single named object.
    ObjectRead,
    /// Read access to any object in the bucket.
    AnyObjectRead,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ObjectRead => "ObjectRead",
            AccessMode::AnyObjectRead => "AnyObjectRead",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageObject {
    pub name: String,
    pub size: Option<u64>,
    pub time_created: Option<DateTime<Utc>>,
}

/// One page of a bucket listing; `next_start` is the opaque cursor for the
/// following page, absent on the last page.
#[derive(Debug, Clone)]
pub struct ObjectPage {
    pub objects: Vec<StorageObject>,
    pub next_start: Option<String>,
}

/// A playable catalog entry: the object path to request a grant for plus
/// the name shown to the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoEntry {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Hls,
    Mp4,
}

impl MediaType {
    /// Content type handed to the player.
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaType::Hls => "application/x-mpegURL",
            MediaType::Mp4 => "video/mp4",
        }
    }
}
