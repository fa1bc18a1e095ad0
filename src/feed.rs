//! Direct city/station feed lookups.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, instrument};

use crate::envelope;
use crate::error::{FailureKind, LookupFailure};
use crate::fetch::{HttpClient, fetch_json};
use crate::record::StationRecord;
use crate::request::{LookupRequest, feed_path_token};

/// Looks up the real-time feed for one city or station.
pub struct FeedClient<C: ?Sized> {
    http: Arc<C>,
    base: Url,
}

impl<C: ?Sized> Clone for FeedClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            base: self.base.clone(),
        }
    }
}

impl<C: HttpClient + ?Sized> FeedClient<C> {
    /// `base` is the feed endpoint; the identifier is appended as a path
    /// segment followed by a trailing slash.
    pub fn new(http: Arc<C>, base: Url) -> Self {
        Self { http, base }
    }

    pub(crate) fn http(&self) -> &C {
        &self.http
    }

    /// URL for `identifier`, with numeric station ids prefixed by `@`.
    pub fn url_for(&self, identifier: &str) -> Result<Url, FailureKind> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FailureKind::Network(format!("feed endpoint {} cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .push(&feed_path_token(identifier))
            .push("");
        Ok(url)
    }

    /// Performs one lookup. Never retries.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub async fn fetch(&self, identifier: &str) -> Result<StationRecord, LookupFailure> {
        let fail = |kind| LookupFailure::new(LookupRequest::City(identifier.to_string()), kind);

        let url = self.url_for(identifier).map_err(fail)?;
        let body = fetch_json(self.http.as_ref(), url).await.map_err(fail)?;
        let data = envelope::open(&body).map_err(fail)?;
        let record = StationRecord::from_feed_data(data).map_err(fail)?;

        debug!(station = %record.station, aqi = %record.aqi, "Feed parsed");
        Ok(record)
    }
}
