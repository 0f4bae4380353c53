use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::clients::{
    entities::{Credentials, NowPlaying, ResolvedTrack, SessionKey},
    errors::{Error, Result},
    signature::{Params, sign},
};

/// Public Last.fm API root
pub const API_ROOT: &str = "https://ws.audioscrobbler.com/2.0/";
/// Applied to every request so a stalled API never blocks the player
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize, Debug)]
struct LastFMAPITrack {
    name: String,
    artist: String,
}

#[derive(Deserialize, Debug)]
struct Tracks {
    track: Vec<LastFMAPITrack>,
}

#[derive(Deserialize, Debug)]
struct TrackMatches {
    trackmatches: Tracks,
}

#[derive(Deserialize, Debug)]
struct TrackSearchResponse {
    results: TrackMatches,
}

#[derive(Deserialize, Debug)]
struct AuthSession {
    key: Option<String>,
}

#[derive(Deserialize, Debug)]
struct AuthSessionResponse {
    session: Option<AuthSession>,
}

// Last.fm reports failures as {"error": <code>, "message": "..."}, sometimes with HTTP 200
#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    error: i64,
    message: String,
}

fn api_error(value: &Value) -> Option<Error> {
    ApiErrorResponse::deserialize(value)
        .ok()
        .map(|e| Error::Api {
            code: e.error,
            message: e.message,
        })
}

fn first_match(value: Value) -> Result<Option<ResolvedTrack>> {
    let response: TrackSearchResponse = serde_json::from_value(value)?;
    Ok(response
        .results
        .trackmatches
        .track
        .into_iter()
        .next()
        .map(|t| ResolvedTrack {
            artist: t.artist,
            name: t.name,
        }))
}

fn session_key(value: Value) -> Result<SessionKey> {
    let response: AuthSessionResponse = serde_json::from_value(value)?;
    response
        .session
        .and_then(|s| s.key)
        .and_then(SessionKey::new)
        .ok_or_else(|| Error::UnexpectedResponse("no session.key in auth response".into()))
}

// A scrobble can be "ignored" by the API (bad timestamp, filtered artist) while the call itself succeeds
fn check_scrobble_accepted(value: &Value) -> Result<()> {
    let ignored = value
        .pointer("/scrobbles/@attr/ignored")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
        .unwrap_or(0);
    if ignored > 0 {
        return Err(Error::UnexpectedResponse(format!(
            "scrobble was ignored by LastFM: {}",
            value
                .pointer("/scrobbles/scrobble/ignoredMessage")
                .unwrap_or(&Value::Null)
        )));
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// Form-encoded POST to the API root, decoded as JSON
async fn post_form(http: &reqwest::Client, url: &str, params: &Params) -> Result<Value> {
    debug!(
        "LastFM API call: method={}",
        params.get("method").map_or("unknown", String::as_str)
    );
    let response = http.post(url).form(params).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // error payloads usually come with 4xx, keep the API's own message when there is one
        if let Some(err) = serde_json::from_str::<Value>(&body).ok().as_ref().and_then(api_error) {
            return Err(err);
        }
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    match api_error(&value) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// Configures and authenticates a [`LastFmClient`]
pub struct LastFmClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
}

impl LastFmClientBuilder {
    /// Point the client at another endpoint, e.g. a Libre.fm instance
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exchange the credentials for a mobile session.
    ///
    /// Every failure is reported as [`Error::Authentication`]: a client
    /// without a session cannot scrobble, so there is nothing to fall back to.
    pub async fn connect(self) -> Result<LastFmClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| Error::Authentication(Box::new(e.into())))?;

        let session_key = Self::open_session(&http, &self.base_url, &self.credentials)
            .await
            .map_err(|e| Error::Authentication(Box::new(e)))?;
        info!(
            "Opened LastFM session for user {}",
            self.credentials.username
        );

        Ok(LastFmClient {
            http,
            base_url: self.base_url,
            credentials: self.credentials,
            session_key,
        })
    }

    async fn open_session(
        http: &reqwest::Client,
        url: &str,
        credentials: &Credentials,
    ) -> Result<SessionKey> {
        let mut params = Params::from([
            ("method", "auth.getMobileSession".to_string()),
            ("username", credentials.username.clone()),
            ("password", credentials.password.clone()),
            ("api_key", credentials.api_key.clone()),
        ]);
        params.insert("api_sig", sign(&params, &credentials.api_secret));
        params.insert("format", "json".to_string());

        session_key(post_form(http, url, &params).await?)
    }
}

/// Scrobbles tracks on behalf of one Last.fm user.
///
/// A value of this type always holds a valid session key; it can only be
/// obtained through [`LastFmClientBuilder::connect`]. The session is read-only
/// afterwards, so a single client can be shared between concurrent tasks.
pub struct LastFmClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    session_key: SessionKey,
}

impl LastFmClient {
    pub fn builder(credentials: Credentials) -> LastFmClientBuilder {
        LastFmClientBuilder {
            credentials,
            base_url: API_ROOT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Authenticate against the public API with default settings
    pub async fn connect(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).connect().await
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    async fn request(&self, params: &Params) -> Result<Value> {
        post_form(&self.http, &self.base_url, params).await
    }

    // Adds the session, api_key and api_sig required by write methods
    fn signed(&self, mut params: Params) -> Params {
        params.insert("api_key", self.credentials.api_key.clone());
        params.insert("sk", self.session_key.as_str().to_string());
        params.insert("api_sig", sign(&params, &self.credentials.api_secret));
        params.insert("format", "json".to_string());
        params
    }

    /// Look up the best catalog match for a title. `Ok(None)` when nothing matches.
    pub async fn search_track(&self, title: &str) -> Result<Option<ResolvedTrack>> {
        let params = Params::from([
            ("method", "track.search".to_string()),
            ("track", title.to_string()),
            ("api_key", self.credentials.api_key.clone()),
            ("limit", "1".to_string()),
            ("format", "json".to_string()),
        ]);
        first_match(self.request(&params).await?)
    }

    async fn resolve(&self, title: &str) -> Result<ResolvedTrack> {
        match self.search_track(title).await {
            Ok(Some(track)) => {
                debug!("Resolved {title:?} to {track}");
                Ok(track)
            }
            Ok(None) => Err(Error::TrackNotFound(title.to_string())),
            Err(source) => Err(Error::Search {
                title: title.to_string(),
                source: Box::new(source),
            }),
        }
    }

    /// Resolve the entry's title and scrobble the match, timestamped now
    pub async fn try_scrobble<E>(&self, entry: &E) -> Result<ResolvedTrack>
    where
        E: NowPlaying + ?Sized,
    {
        let title = entry.title();
        let track = self.resolve(title).await?;

        let params = self.signed(Params::from([
            ("method", "track.scrobble".to_string()),
            ("artist", track.artist.clone()),
            ("track", track.name.clone()),
            ("timestamp", unix_now().to_string()),
        ]));
        self.request(&params)
            .await
            .and_then(|value| check_scrobble_accepted(&value))
            .map_err(|source| Error::Submission {
                title: title.to_string(),
                source: Box::new(source),
            })?;

        Ok(track)
    }

    /// Resolve the entry's title and mark the match as currently playing
    pub async fn try_update_now_playing<E>(&self, entry: &E) -> Result<ResolvedTrack>
    where
        E: NowPlaying + ?Sized,
    {
        let title = entry.title();
        let track = self.resolve(title).await?;

        let params = self.signed(Params::from([
            ("method", "track.updateNowPlaying".to_string()),
            ("artist", track.artist.clone()),
            ("track", track.name.clone()),
        ]));
        self.request(&params)
            .await
            .map_err(|source| Error::Submission {
                title: title.to_string(),
                source: Box::new(source),
            })?;

        Ok(track)
    }

    /// Best-effort [`try_scrobble`](Self::try_scrobble): failures are logged, never returned
    pub async fn scrobble<E>(&self, entry: &E)
    where
        E: NowPlaying + ?Sized,
    {
        report("Scrobbled", self.try_scrobble(entry).await);
    }

    /// Best-effort [`try_update_now_playing`](Self::try_update_now_playing)
    pub async fn update_now_playing<E>(&self, entry: &E)
    where
        E: NowPlaying + ?Sized,
    {
        report("Now playing", self.try_update_now_playing(entry).await);
    }
}

fn report(action: &str, result: Result<ResolvedTrack>) {
    match result {
        Ok(track) => info!("{action}: {track}"),
        Err(Error::TrackNotFound(title)) => warn!("Track {title:?} not found on LastFM"),
        Err(e) => error!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_search_match_wins() {
        let value = json!({"results": {"trackmatches": {"track": [
            {"artist": "Imagine Dragons", "name": "Believer", "url": "https://www.last.fm/x", "listeners": "100"},
            {"artist": "Someone Else", "name": "Believer (Cover)"}
        ]}}});
        assert_eq!(
            first_match(value).unwrap(),
            Some(ResolvedTrack {
                artist: "Imagine Dragons".into(),
                name: "Believer".into(),
            })
        );
    }

    #[test]
    fn empty_search_is_none() {
        let value = json!({"results": {"trackmatches": {"track": []}}});
        assert_eq!(first_match(value).unwrap(), None);
    }

    #[test]
    fn malformed_search_is_an_error() {
        let value = json!({"results": {}});
        assert!(matches!(first_match(value), Err(Error::Deserialization(_))));
    }

    #[test]
    fn session_key_is_required() {
        let sk = session_key(json!({"session": {"name": "u", "key": "SK1", "subscriber": 0}})).unwrap();
        assert_eq!(sk.as_str(), "SK1");

        assert!(matches!(
            session_key(json!({"session": {"name": "u"}})),
            Err(Error::UnexpectedResponse(_))
        ));
        assert!(matches!(
            session_key(json!({})),
            Err(Error::UnexpectedResponse(_))
        ));
        assert!(matches!(
            session_key(json!({"session": {"key": ""}})),
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn error_payload_is_detected() {
        let err = api_error(&json!({"error": 4, "message": "Authentication Failed"}));
        assert!(matches!(err, Some(Error::Api { code: 4, .. })));
        assert!(api_error(&json!({"session": {"key": "SK1"}})).is_none());
    }

    #[test]
    fn ignored_scrobble_is_rejected() {
        let accepted = json!({"scrobbles": {"@attr": {"accepted": 1, "ignored": 0}}});
        assert!(check_scrobble_accepted(&accepted).is_ok());

        let ignored = json!({"scrobbles": {
            "@attr": {"accepted": "0", "ignored": "1"},
            "scrobble": {"ignoredMessage": {"code": "3", "#text": "Timestamp too old"}}
        }});
        assert!(matches!(
            check_scrobble_accepted(&ignored),
            Err(Error::UnexpectedResponse(_))
        ));

        assert!(check_scrobble_accepted(&json!({})).is_ok());
    }

    #[test]
    fn timestamp_is_whole_seconds() {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let ts = unix_now();
        assert!(ts >= before && ts <= before + 1);
    }
}
