use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::{error::Error, util::default_agent};

use super::SuggestionSource;

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
const REST_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const SUGGESTION_LIMIT: usize = 5;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("valid year pattern"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub title: String,
    pub description: Option<String>,
    pub extract: String,
    pub year: Option<i32>,
}

/// Title search and page summaries from the English Wikipedia.
pub struct WikiClient {
    agent: ureq::Agent,
}

impl WikiClient {
    pub fn new(proxy_url: Option<&str>) -> Self {
        Self {
            agent: default_agent(proxy_url),
        }
    }

    pub fn search(&self, query: &str) -> Result<Vec<String>, Error> {
        // [query, titles, descriptions, urls]
        type OpenSearch = (String, Vec<String>, Vec<String>, Vec<String>);

        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let (_, titles, _, _): OpenSearch = self
            .agent
            .get(API_URL)
            .query("action", "opensearch")
            .query("search", query)
            .query("limit", SUGGESTION_LIMIT.to_string())
            .query("namespace", "0")
            .query("format", "json")
            .call()?
            .body_mut()
            .read_json()?;
        log::debug!("{} suggestions for {query:?}", titles.len());
        Ok(titles)
    }

    pub fn summary(&self, title: &str) -> Result<PageInfo, Error> {
        #[derive(Deserialize)]
        struct Summary {
            title: String,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            extract: String,
        }

        let summary: Summary = self
            .agent
            .get(summary_url(title)?.as_str())
            .call()?
            .body_mut()
            .read_json()?;
        let year = summary
            .description
            .as_deref()
            .and_then(extract_year)
            .or_else(|| extract_year(&summary.extract));
        Ok(PageInfo {
            title: summary.title,
            description: summary.description,
            extract: summary.extract,
            year,
        })
    }
}

impl SuggestionSource for WikiClient {
    fn suggest(&self, query: &str) -> Result<Vec<String>, Error> {
        self.search(query)
    }
}

fn summary_url(title: &str) -> Result<Url, Error> {
    let mut url = Url::parse(REST_URL).map_err(|err| Error::NetworkError(Box::new(err)))?;
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&title.replace(' ', "_"));
    }
    Ok(url)
}

/// First plausible release year (1800-2099) mentioned in `text`.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_year() {
        assert_eq!(extract_year("1999 American science fiction film"), Some(1999));
        assert_eq!(extract_year("video game released in 2020, remade 2024"), Some(2020));
        assert_eq!(extract_year("runs 120 minutes, 12345 frames"), None);
        assert_eq!(extract_year("Greek god"), None);
    }

    #[test]
    fn summary_url_escapes_title() {
        let url = summary_url("The Matrix (film)").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/The_Matrix_(film)"
        );
        let url = summary_url("AC/DC").unwrap();
        assert!(url.as_str().ends_with("/summary/AC%2FDC"));
    }
}
