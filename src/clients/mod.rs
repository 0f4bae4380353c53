/// Credentials, session and track entities
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Last.fm API client
pub mod lastfm;
/// Last.fm request signing
pub mod signature;

pub use lastfm::LastFmClient;
