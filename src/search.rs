//! Keyword searches that expand into per-station feed lookups.

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::envelope;
use crate::error::{FailureKind, LookupFailure};
use crate::feed::FeedClient;
use crate::fetch::{HttpClient, fetch_json};
use crate::record::StationRecord;
use crate::request::LookupRequest;

/// Everything one keyword produced, in the order it was produced.
#[derive(Debug, Default)]
pub struct SearchResults {
    pub outcomes: Vec<Result<StationRecord, LookupFailure>>,
}

impl SearchResults {
    fn failed(failure: LookupFailure) -> Self {
        Self {
            outcomes: vec![Err(failure)],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &StationRecord> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &LookupFailure> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    /// Splits into the success list and the failure list.
    pub fn into_parts(self) -> (Vec<StationRecord>, Vec<LookupFailure>) {
        let mut records = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome {
                Ok(r) => records.push(r),
                Err(f) => failures.push(f),
            }
        }
        (records, failures)
    }
}

/// Searches stations by keyword, then fetches each match's feed.
pub struct SearchClient<C: ?Sized> {
    feed: FeedClient<C>,
    base: Url,
}

impl<C: ?Sized> Clone for SearchClient<C> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            base: self.base.clone(),
        }
    }
}

impl<C: HttpClient + ?Sized> SearchClient<C> {
    /// Searches go to `base` and reuse `feed` (and its HTTP client) for the
    /// per-station lookups.
    pub fn new(feed: FeedClient<C>, base: Url) -> Self {
        Self { feed, base }
    }

    pub fn url_for(&self, keyword: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("keyword", keyword);
        url
    }

    /// Runs the search and fetches every matched station sequentially.
    ///
    /// A rejected search yields a single failure for the keyword. A search
    /// with no matches yields nothing at all.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn search(&self, keyword: &str) -> SearchResults {
        let fail = |kind| LookupFailure::new(LookupRequest::Keyword(keyword.to_string()), kind);

        let uids = match self.station_uids(keyword).await {
            Ok(uids) => uids,
            Err(kind) => return SearchResults::failed(fail(kind)),
        };
        debug!(matches = uids.len(), "Search resolved");

        let mut results = SearchResults::default();
        for uid in uids {
            let outcome = match uid {
                Some(uid) => self.feed.fetch(&uid).await,
                None => {
                    warn!("Search entry without uid");
                    Err(fail(FailureKind::MalformedEnvelope(
                        "search entry without uid".into(),
                    )))
                }
            };
            results.outcomes.push(outcome);
        }
        results
    }

    async fn station_uids(&self, keyword: &str) -> Result<Vec<Option<String>>, FailureKind> {
        let body = fetch_json(self.feed_http(), self.url_for(keyword)).await?;
        let data = envelope::open(&body)?;
        let entries = data
            .as_array()
            .ok_or_else(|| FailureKind::MalformedEnvelope("search data is not a list".into()))?;

        Ok(entries.iter().map(uid_of).collect())
    }

    fn feed_http(&self) -> &C {
        self.feed.http()
    }
}

fn uid_of(entry: &Value) -> Option<String> {
    match &entry["uid"] {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
