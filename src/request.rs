//! Input items for the aggregation engine.

use std::fmt;

/// One top-level lookup: a direct city/station feed or a keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupRequest {
    City(String),
    Keyword(String),
}

impl LookupRequest {
    /// Builds the request list in submission order: cities first, then keywords.
    pub fn batch<C, K>(cities: C, keywords: K) -> Vec<LookupRequest>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        cities
            .into_iter()
            .map(|c| LookupRequest::City(c.into()))
            .chain(keywords.into_iter().map(|k| LookupRequest::Keyword(k.into())))
            .collect()
    }
}

impl fmt::Display for LookupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupRequest::City(id) => write!(f, "city {id}"),
            LookupRequest::Keyword(term) => write!(f, "search {term}"),
        }
    }
}

/// Converts a city identifier into the path token the feed endpoint expects.
///
/// Integer-looking identifiers are numeric station ids and get an `@` prefix;
/// anything else is passed through as a city name.
pub fn feed_path_token(identifier: &str) -> String {
    if identifier.parse::<i64>().is_ok() {
        format!("@{identifier}")
    } else {
        identifier.to_string()
    }
}
