use serde::Deserialize;
use slog::{debug, info};

use crate::{
    parse_timestamp, AcquireError, EarthdataSession, Endpoints, HttpClient, Timestamp,
    VariableQuery,
};

/// Granules requested per search page
pub const SEARCH_PAGE_SIZE: usize = 50;

const DATA_REL_SUFFIX: &str = "/data#";

/// A downloadable granule found by a search
#[derive(Debug, Clone, PartialEq)]
pub struct GranuleRef {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Start of the granule's temporal coverage
    pub time_start: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub feed: Feed,
}

#[derive(Debug, Default, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub entry: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub time_start: Option<String>,
    #[serde(default)]
    pub links: Vec<FeedLink>,
}

#[derive(Debug, Deserialize)]
pub struct FeedLink {
    #[serde(default)]
    pub rel: String,
    pub href: String,
}

/// Search the granule catalogue for files covering the query's point and window
pub async fn search_granules(
    http: &HttpClient,
    endpoints: &Endpoints,
    session: &EarthdataSession,
    query: &VariableQuery,
) -> Result<Vec<GranuleRef>, AcquireError> {
    let url = &endpoints.cmr_granules;
    let params = [
        ("short_name", query.variable.collection.clone()),
        ("temporal", query.temporal()),
        ("bounding_box", query.bounding_box().to_string()),
        ("page_size", SEARCH_PAGE_SIZE.to_string()),
    ];
    debug!(http.logger(), "granule search params: {:?}", params);

    let request = http
        .get(url)
        .query(&params)
        .bearer_auth(session.access_token());
    let body = http.text(request, url).await?;
    let response: SearchResponse = serde_json::from_str(&body)
        .map_err(|e| AcquireError::Decode(format!("granule search response: {}", e)))?;

    let granules = granules_from_feed(response.feed);
    info!(http.logger(), "granule search matched {} files", granules.len());
    Ok(granules)
}

/// Keep entries with an HTTP(S) data link, first such link per entry
pub fn granules_from_feed(feed: Feed) -> Vec<GranuleRef> {
    feed.entry
        .into_iter()
        .filter_map(|entry| {
            let url = entry
                .links
                .iter()
                .find(|link| link.rel.ends_with(DATA_REL_SUFFIX) && is_http(&link.href))?
                .href
                .clone();
            Some(GranuleRef {
                time_start: entry.time_start.as_deref().and_then(parse_timestamp),
                id: entry.id,
                title: entry.title,
                url,
            })
        })
        .collect()
}

fn is_http(href: &str) -> bool {
    href.starts_with("https://") || href.starts_with("http://")
}
