use futures::stream::{StreamExt, iter};
use log::{debug, info, warn};

use crate::clients::{
    LastFmClient,
    entities::ResolvedTrack,
    errors::{Error, Result},
};

/// Outcome of a batch of scrobbles
#[derive(Debug, Default)]
pub struct ScrobbleReport {
    pub scrobbled: Vec<ResolvedTrack>,
    pub not_found: Vec<String>,
    pub failed: Vec<Error>,
}

// Scrobbles several queue entries at once against a single session
pub struct Scrobbler {
    client: LastFmClient,
    concurrency: usize,
}

impl Scrobbler {
    pub fn new(client: LastFmClient) -> Self {
        Scrobbler {
            client,
            concurrency: 4,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn client(&self) -> &LastFmClient {
        &self.client
    }

    pub async fn scrobble_all<I>(&self, titles: I) -> ScrobbleReport
    where
        I: IntoIterator<Item = String>,
    {
        let client = &self.client;
        let results = iter(titles)
            .map(|title| async move { client.try_scrobble(title.as_str()).await })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<Result<ResolvedTrack>>>()
            .await;

        let mut report = ScrobbleReport::default();
        for result in results {
            match result {
                Ok(track) => {
                    debug!("Scrobbled {track}");
                    report.scrobbled.push(track);
                }
                Err(Error::TrackNotFound(title)) => {
                    warn!("Track {title:?} not found on LastFM");
                    report.not_found.push(title);
                }
                Err(e) => {
                    warn!("Error scrobbling track: {e}");
                    report.failed.push(e);
                }
            }
        }

        info!(
            "Scrobbled {} tracks, {} not found, {} failed",
            report.scrobbled.len(),
            report.not_found.len(),
            report.failed.len()
        );
        report
    }
}
