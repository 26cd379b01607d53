use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet is not valid UTF-8")]
    Encoding,
    #[error("expected at least 4 fields, got {0}")]
    TooFewFields(usize),
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("{0} out of range")]
    OutOfRange(&'static str),
    #[error("timestamp {timestamp} is too far from local time {now}")]
    ClockSkew { timestamp: i64, now: i64 },
    #[error("timestamp {timestamp} is not after {last}")]
    NotMonotonic { timestamp: i64, last: i64 },
    #[error("signed packet has no digest field")]
    MissingDigest,
    #[error("no secret configured to check packet digests")]
    NoSecret,
    #[error("packet digest does not match")]
    DigestMismatch,
}
