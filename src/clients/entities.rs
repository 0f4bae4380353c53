use std::fmt;

/// Everything needed to open a mobile session.
/// `api_key`/`api_secret` are issued by Last.fm when registering an application.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub username: String,
    pub password: String,
}

// password and api_secret must never end up in logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Mobile session key (`sk`). Lives as long as the client that obtained it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    /// Returns `None` for an empty key, the API never hands those out.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct TrackQuery {
    pub title: String,
}

/// Top catalog match for a [`TrackQuery`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub artist: String,
    pub name: String,
}

impl fmt::Display for ResolvedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.name)
    }
}

/// An entry of the player queue. Only its title is used to find the track.
pub trait NowPlaying {
    fn title(&self) -> &str;
}

impl NowPlaying for TrackQuery {
    fn title(&self) -> &str {
        &self.title
    }
}

impl NowPlaying for str {
    fn title(&self) -> &str {
        self
    }
}

impl NowPlaying for String {
    fn title(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials {
            api_key: "K".into(),
            api_secret: "top-secret".into(),
            username: "u".into(),
            password: "hunter2".into(),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("\"u\""));

        let sk = SessionKey::new("SK1").unwrap();
        assert!(!format!("{sk:?}").contains("SK1"));
        assert_eq!(sk.as_str(), "SK1");
    }

    #[test]
    fn empty_session_key_is_rejected() {
        assert!(SessionKey::new("").is_none());
    }

    #[test]
    fn queue_entries_expose_their_title() {
        let query = TrackQuery {
            title: "Believer".into(),
        };
        assert_eq!(query.title(), "Believer");
        assert_eq!("Song X".title(), "Song X");
        assert_eq!(String::from("Song Y").title(), "Song Y");
    }
}
