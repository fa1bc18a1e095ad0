//! Startup configuration: rc file, environment and command-line overrides.
//!
//! Everything is resolved once into a [`Settings`] value that is passed down
//! explicitly; nothing downstream reads ambient state.

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::output::Locale;
use crate::request::LookupRequest;

pub const DEFAULT_RC_FILE: &str = "~/.aqirc";
pub const DEFAULT_FEED_URL: &str = "https://api.waqi.info/feed/";
pub const DEFAULT_SEARCH_URL: &str = "https://api.waqi.info/search/";
/// Looked up when neither cities nor keywords are configured.
pub const DEFAULT_CITY: &str = "here";

/// Where feed and search requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub feed: Url,
    pub search: Url,
}

impl Endpoints {
    pub fn parse(feed: &str, search: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            feed: parse_endpoint(feed)?,
            search: parse_endpoint(search)?,
        })
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::parse(DEFAULT_FEED_URL, DEFAULT_SEARCH_URL)
            .expect("built-in endpoints are valid urls")
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::Endpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(ConfigError::Endpoint {
            url: url.to_string(),
            reason: "not a hierarchical url".into(),
        });
    }
    Ok(parsed)
}

/// A list that may be written as a TOML array or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StringList {
    Joined(String),
    Items(Vec<String>),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringList::Joined(s) => split_list([s]),
            StringList::Items(items) => split_list(items),
        }
    }
}

/// Contents of the rc file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    token: Option<String>,
    zhcn: Option<bool>,
    cities: Option<StringList>,
    keywords: Option<StringList>,
}

impl FileConfig {
    /// Reads the rc file at `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file");
                return Ok(None);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&text, path).map(Some)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub token: Option<String>,
    pub cities: Vec<String>,
    pub keywords: Vec<String>,
    pub zhcn: bool,
    pub json: bool,
    pub feed_url: Option<String>,
    pub search_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Report,
    Json,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub cities: Vec<String>,
    pub keywords: Vec<String>,
    pub locale: Locale,
    pub format: OutputFormat,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Layers `cli` over `file`. Non-empty command-line lists replace the
    /// file's lists. Fails if no token is available from either source.
    pub fn resolve(file: FileConfig, cli: Overrides) -> Result<Self, ConfigError> {
        let token = cli
            .token
            .or(file.token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let cli_cities = split_list(cli.cities);
        let cli_keywords = split_list(cli.keywords);
        let mut cities = if cli_cities.is_empty() {
            file.cities.map(StringList::into_vec).unwrap_or_default()
        } else {
            cli_cities
        };
        let keywords = if cli_keywords.is_empty() {
            file.keywords.map(StringList::into_vec).unwrap_or_default()
        } else {
            cli_keywords
        };
        if cities.is_empty() && keywords.is_empty() {
            cities.push(DEFAULT_CITY.to_string());
        }

        let locale = if cli.zhcn || file.zhcn.unwrap_or(false) {
            Locale::Chinese
        } else {
            Locale::English
        };
        let format = if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Report
        };
        let endpoints = Endpoints::parse(
            cli.feed_url.as_deref().unwrap_or(DEFAULT_FEED_URL),
            cli.search_url.as_deref().unwrap_or(DEFAULT_SEARCH_URL),
        )?;

        Ok(Self {
            token,
            cities,
            keywords,
            locale,
            format,
            endpoints,
        })
    }

    /// Cities first, then keywords.
    pub fn requests(&self) -> Vec<LookupRequest> {
        LookupRequest::batch(self.cities.iter().cloned(), self.keywords.iter().cloned())
    }
}

/// Splits comma-separated entries and drops blanks.
fn split_list<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    items
        .into_iter()
        .flat_map(|item| {
            item.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Replaces a leading `~` with the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
