use std::path::PathBuf;

use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file is too small to be a film ({size} bytes)")]
    FileTooSmall { size: u64 },

    #[error("short read at offset {offset}: got {read} bytes")]
    PartialRead { offset: u64, read: usize },

    #[error("not a valid fingerprint: {0:?}")]
    InvalidFingerprint(String),

    #[error("server responded with {0}")]
    HttpStatus(StatusCode),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("subtitles not found")]
    NotFound,

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("filename extension not matched: expected {expected:?}, got {found:?}")]
    ExtensionMismatch { expected: String, found: String },

    #[error("filename not determined")]
    FilenameUndetermined,

    #[error("no free name for {} after {attempts} attempts", .path.display())]
    CollisionExhausted { path: PathBuf, attempts: u32 },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("download task did not finish: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
