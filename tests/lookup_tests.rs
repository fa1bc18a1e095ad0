mod common;

use std::sync::Arc;

use aqi_report::config::Endpoints;
use aqi_report::error::FailureKind;
use aqi_report::feed::FeedClient;
use aqi_report::fetch::auth::UrlParam;
use aqi_report::record::Metric;
use aqi_report::request::LookupRequest;
use aqi_report::search::SearchClient;
use common::*;
use serde_json::json;

fn clients(http: ScriptedClient) -> (FeedClient<ScriptedClient>, SearchClient<ScriptedClient>) {
    let endpoints = Endpoints::parse(FEED_URL, SEARCH_URL).unwrap();
    let feed = FeedClient::new(Arc::new(http), endpoints.feed);
    let search = SearchClient::new(feed.clone(), endpoints.search);
    (feed, search)
}

#[tokio::test]
async fn test_feed_success_parses_record() {
    let (feed, _) = clients(ScriptedClient::new().feed("here", feed_ok("Home", 42)));

    let record = feed.fetch("here").await.unwrap();
    assert_eq!(record.station, "Home");
    assert_eq!(record.aqi.as_f64(), Some(42.0));
    assert!(record.reading(Metric::Pm25).is_some());
}

#[tokio::test]
async fn test_numeric_identifier_hits_station_path() {
    let (feed, _) = clients(ScriptedClient::new().feed("@1437", feed_ok("Station", 5)));

    let record = feed.fetch("1437").await.unwrap();
    assert_eq!(record.station, "Station");
}

#[tokio::test]
async fn test_remote_error_carries_data_text() {
    let (feed, _) = clients(ScriptedClient::new().feed("@42", feed_error("Unknown ID")));

    let failure = feed.fetch("42").await.unwrap_err();
    assert_eq!(failure.request, LookupRequest::City("42".into()));
    assert_eq!(failure.kind, FailureKind::RemoteError("Unknown ID".into()));
}

#[tokio::test]
async fn test_missing_status_is_malformed_not_remote_error() {
    let body = json!({ "data": "Unknown ID", "aqi": 3 });
    let (feed, _) = clients(ScriptedClient::new().feed("here", Reply::Json(body)));

    let failure = feed.fetch("here").await.unwrap_err();
    assert!(matches!(failure.kind, FailureKind::MalformedEnvelope(_)));
}

#[tokio::test]
async fn test_ok_without_station_name_is_malformed() {
    let body = json!({ "status": "ok", "data": { "aqi": 3 } });
    let (feed, _) = clients(ScriptedClient::new().feed("here", Reply::Json(body)));

    let failure = feed.fetch("here").await.unwrap_err();
    assert!(matches!(failure.kind, FailureKind::MalformedEnvelope(_)));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (feed, _) = clients(ScriptedClient::new().feed("here", Reply::Raw("<html>")));

    let failure = feed.fetch("here").await.unwrap_err();
    assert!(matches!(failure.kind, FailureKind::MalformedEnvelope(_)));
}

#[tokio::test]
async fn test_transport_error_is_network() {
    let (feed, _) = clients(ScriptedClient::new().feed("here", Reply::NetworkError));

    let failure = feed.fetch("here").await.unwrap_err();
    assert!(matches!(failure.kind, FailureKind::Network(_)));
}

#[tokio::test]
async fn test_search_fetches_matches_in_order() {
    let http = ScriptedClient::new()
        .search("paris", search_ok(&[101, 102, 103]))
        .feed("@101", feed_ok("s101", 10))
        .feed("@102", Reply::NetworkError)
        .feed("@103", feed_ok("s103", 30));
    let (_, search) = clients(http);

    let results = search.search("paris").await;
    assert_eq!(results.outcomes.len(), 3);
    assert!(results.outcomes[0].is_ok());
    assert!(results.outcomes[1].is_err());
    assert!(results.outcomes[2].is_ok());

    let (records, failures) = results.into_parts();
    let names: Vec<_> = records.iter().map(|r| r.station.as_str()).collect();
    assert_eq!(names, vec!["s101", "s103"]);
    assert_eq!(failures[0].request, LookupRequest::City("102".into()));
    assert!(matches!(failures[0].kind, FailureKind::Network(_)));
}

#[tokio::test]
async fn test_search_without_matches_yields_nothing() {
    let (_, search) = clients(ScriptedClient::new().search("atlantis", search_ok(&[])));

    let results = search.search("atlantis").await;
    assert!(results.outcomes.is_empty());
}

#[tokio::test]
async fn test_rejected_search_is_one_keyword_failure() {
    let (_, search) = clients(ScriptedClient::new().search("paris", feed_error("Invalid key")));

    let (records, failures) = search.search("paris").await.into_parts();
    assert!(records.is_empty());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].request, LookupRequest::Keyword("paris".into()));
    assert_eq!(failures[0].kind, FailureKind::RemoteError("Invalid key".into()));
}

#[tokio::test]
async fn test_search_without_data_list_is_malformed() {
    let body = json!({ "status": "ok", "data": { "uid": 1 } });
    let (_, search) = clients(ScriptedClient::new().search("paris", Reply::Json(body)));

    let (_, failures) = search.search("paris").await.into_parts();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].kind, FailureKind::MalformedEnvelope(_)));
}

#[tokio::test]
async fn test_search_entry_without_uid_does_not_stop_the_rest() {
    let body = json!({ "status": "ok", "data": [{ "station": {} }, { "uid": 7 }] });
    let http = ScriptedClient::new()
        .search("paris", Reply::Json(body))
        .feed("@7", feed_ok("s7", 1));
    let (_, search) = clients(http);

    let results = search.search("paris").await;
    assert_eq!(results.failures().count(), 1);
    assert_eq!(results.records().next().map(|r| r.station.as_str()), Some("s7"));
}

#[tokio::test]
async fn test_token_and_keyword_are_query_parameters() {
    let scripted = ScriptedClient::new()
        .search("new york", search_ok(&[5]))
        .feed("@5", feed_ok("s5", 1));
    let seen = scripted.seen();
    let endpoints = Endpoints::parse(FEED_URL, SEARCH_URL).unwrap();
    let feed = FeedClient::new(Arc::new(UrlParam::token(scripted, "tkn")), endpoints.feed);
    let search = SearchClient::new(feed.clone(), endpoints.search);

    let results = search.search("new york").await;
    assert_eq!(results.records().count(), 1);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "http://aqi.test/search/?keyword=new+york&token=tkn".to_string(),
            "http://aqi.test/feed/@5/?token=tkn".to_string(),
        ]
    );
}
