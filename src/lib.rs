//! Rscrobbler - Scrobble tracks played by a music bot to Last.fm
//!
//! The bot only knows what it is playing by title. Each title is looked up in
//! the Last.fm catalog and the best match is scrobbled under the user's
//! mobile session.

/// Client modules for interacting with the Last.fm API
pub mod clients;
/// Environment based configuration
pub mod config;
/// Concurrent batch scrobbling
pub mod scrobbler;
