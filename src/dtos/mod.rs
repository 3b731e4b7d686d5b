use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::VideoEntry;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Identifier the viewing device polls on.
    pub session_id: String,
    /// URL the second device should open to enter credentials.
    pub authenticate_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub session_id: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckAuthParams {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckAuthResponse {
    pub is_authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Object path to share.
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub url: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedParams {
    pub auth_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailParams {
    pub name: Option<String>,
}

/// Everything a player needs to start playback of one object.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaybackResponse {
    pub url: String,
    pub video_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub media_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub sections: BTreeMap<String, Vec<VideoEntry>>,
}
