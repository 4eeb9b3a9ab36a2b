use thiserror::Error;

use crate::OrgSelector;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid page location: {0}")]
    InvalidLocation(String),

    #[error("no login button bound for org {0}")]
    UnboundButton(OrgSelector),

    #[error("unknown org selector: {0}")]
    UnknownOrg(String),

    #[error("navigation failed: {message}")]
    Navigation { message: String },
}
