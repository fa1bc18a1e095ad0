#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use aqi_report::error::LookupFailure;
use aqi_report::fetch::HttpClient;
use aqi_report::output::{ErrorSink, Presenter};
use aqi_report::record::StationRecord;
use async_trait::async_trait;
use reqwest::{Request, Response};
use serde_json::{Value, json};

pub const FEED_URL: &str = "http://aqi.test/feed/";
pub const SEARCH_URL: &str = "http://aqi.test/search/";

pub enum Reply {
    Json(Value),
    Raw(&'static str),
    NetworkError,
    Panic,
}

struct Route {
    reply: Reply,
    delay: Duration,
}

/// Answers requests from a fixed table instead of the network.
///
/// Feed requests are keyed by path (`/feed/@42/`), searches by
/// `search:<keyword>`. Unknown keys get an `Unknown station` error envelope.
#[derive(Default)]
pub struct ScriptedClient {
    routes: HashMap<String, Route>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(self, path_token: &str, reply: Reply) -> Self {
        self.feed_after(path_token, reply, Duration::ZERO)
    }

    pub fn feed_after(mut self, path_token: &str, reply: Reply, delay: Duration) -> Self {
        self.routes
            .insert(format!("/feed/{path_token}/"), Route { reply, delay });
        self
    }

    pub fn search(mut self, keyword: &str, reply: Reply) -> Self {
        self.routes.insert(
            format!("search:{keyword}"),
            Route {
                reply,
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Every requested URL, in request order.
    pub fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.seen)
    }

    fn key(req: &Request) -> String {
        let url = req.url();
        if url.path().starts_with("/search") {
            let keyword = url
                .query_pairs()
                .find(|(k, _)| k == "keyword")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            format!("search:{keyword}")
        } else {
            url.path().to_string()
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.seen.lock().unwrap().push(req.url().to_string());

        let body = match self.routes.get(&Self::key(&req)) {
            Some(route) => {
                if !route.delay.is_zero() {
                    tokio::time::sleep(route.delay).await;
                }
                match &route.reply {
                    Reply::Json(value) => value.to_string(),
                    Reply::Raw(text) => text.to_string(),
                    Reply::NetworkError => return Err(network_error()),
                    Reply::Panic => panic!("scripted panic"),
                }
            }
            None => json!({ "status": "error", "data": "Unknown station" }).to_string(),
        };

        let resp = http::Response::builder()
            .status(200)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        Ok(Response::from(resp))
    }
}

/// A genuine `reqwest::Error`, produced without touching the network.
fn network_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err()
}

pub fn feed_ok(name: &str, aqi: i64) -> Reply {
    Reply::Json(json!({
        "status": "ok",
        "data": {
            "aqi": aqi,
            "city": { "name": name },
            "iaqi": { "pm25": { "v": aqi } },
            "time": { "s": "2024-03-01 12:00:00" }
        }
    }))
}

pub fn feed_error(message: &str) -> Reply {
    Reply::Json(json!({ "status": "error", "data": message }))
}

pub fn search_ok(uids: &[i64]) -> Reply {
    let entries: Vec<Value> = uids
        .iter()
        .map(|uid| json!({ "uid": uid, "aqi": "10", "station": { "name": format!("s{uid}") } }))
        .collect();
    Reply::Json(json!({ "status": "ok", "data": entries }))
}

#[derive(Default)]
pub struct Collected {
    pub records: Vec<StationRecord>,
}

impl Collected {
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.station.as_str()).collect()
    }
}

impl Presenter for Collected {
    fn render(&mut self, record: &StationRecord) {
        self.records.push(record.clone());
    }
}

#[derive(Default)]
pub struct Failures(pub Vec<LookupFailure>);

impl ErrorSink for Failures {
    fn report(&mut self, failure: &LookupFailure) {
        self.0.push(failure.clone());
    }
}
