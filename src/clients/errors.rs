use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LastFM transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LastFM API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("LastFM Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("LastFM API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("LastFM API unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("LastFM authentication failed: {0}")]
    Authentication(#[source] Box<Error>),

    #[error("Track not found on LastFM: {0}")]
    TrackNotFound(String),

    #[error("Failed to search LastFM for {title:?}: {source}")]
    Search {
        title: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to submit {title:?} to LastFM: {source}")]
    Submission {
        title: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// Errors after which the client (or the whole process) cannot go on.
    /// Everything else only spoils the current track.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_) | Error::ConfigurationError(_)
        )
    }
}
