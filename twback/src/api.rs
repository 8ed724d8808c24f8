pub mod profile;
pub mod timeline;

use std::fmt;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use url::{Url, form_urlencoded};

use crate::client::HttpClient;
use crate::config::Config;
use crate::error::{Error, Result};

pub use profile::{ProfileApi, extract_profile};
pub use timeline::{TimelineApi, TimelinePage, extract_page};

const X_TWITTER_ACTIVE_USER: &str = "x-twitter-active-user";
const X_REQUESTED_WITH: &str = "x-requested-with";

pub trait ApiClient: ProfileApi + TimelineApi {}

/// Whose posts to stream: a user's own timeline, or a hashtag search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    User(String),
    Hashtag(String),
}

impl Target {
    /// A leading `#` selects a hashtag search, anything else is a username.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.strip_prefix('#') {
            Some(tag) => Target::Hashtag(tag.to_string()),
            None => Target::User(input.to_string()),
        }
    }

    /// The path segment as it appears in the `Referer` header.
    pub fn referer_path(&self) -> String {
        match self {
            Target::User(name) => name.clone(),
            Target::Hashtag(tag) => form_urlencoded::byte_serialize(format!("#{tag}").as_bytes())
                .collect(),
        }
    }
}

impl From<&str> for Target {
    fn from(input: &str) -> Self {
        Target::parse(input)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::User(name) => write!(f, "{name}"),
            Target::Hashtag(tag) => write!(f, "#{tag}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClientImpl<C: HttpClient> {
    pub client: C,
    config: Config,
}

impl<C: HttpClient> ApiClientImpl<C> {
    pub fn new(client: C, config: Config) -> Self {
        ApiClientImpl { client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::Other(format!("{} cannot be a base url", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self, referer_path: &str) -> Result<HeaderMap> {
        let referer = format!(
            "{}/{referer_path}",
            self.config.base_url.trim_end_matches('/')
        );
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(REFERER, header_value(&referer)?);
        headers.insert(USER_AGENT, header_value(&self.config.user_agent)?);
        headers.insert(X_TWITTER_ACTIVE_USER, HeaderValue::from_static("yes"));
        headers.insert(X_REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(ACCEPT_LANGUAGE, header_value(&self.config.accept_language)?);
        Ok(headers)
    }

    /// GET with the shared header set; a 404 is reported against `name`.
    async fn fetch(&self, url: &Url, referer_path: &str, name: &str) -> Result<String> {
        match self.client.get(url, self.headers(referer_path)?).await {
            Err(Error::NotFound(_)) => Err(Error::NotFound(name.to_string())),
            other => other,
        }
    }
}

impl<C: HttpClient> ApiClient for ApiClientImpl<C> {}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Other(format!("{value:?}: {e}")))
}

#[cfg(test)]
mod local_tests {
    use super::*;
    use crate::mock::MockClient;

    #[test]
    fn target_parsing() {
        assert_eq!(Target::parse("jack"), Target::User("jack".into()));
        assert_eq!(Target::parse(" #rust "), Target::Hashtag("rust".into()));
        assert_eq!(Target::from("#rust").to_string(), "#rust");
    }

    #[test]
    fn hashtag_is_percent_encoded_for_referer() {
        assert_eq!(Target::parse("#rust").referer_path(), "%23rust");
        assert_eq!(Target::parse("jack").referer_path(), "jack");
    }

    #[test]
    fn header_set() {
        let api = ApiClientImpl::new(MockClient::new(), Config::default());
        let headers = api.headers("jack").unwrap();
        assert_eq!(headers[REFERER], "https://twitter.com/jack");
        assert_eq!(headers[X_REQUESTED_WITH], "XMLHttpRequest");
        assert_eq!(headers[X_TWITTER_ACTIVE_USER], "yes");
        assert_eq!(headers[ACCEPT_LANGUAGE], "en-US");
        assert!(
            headers[USER_AGENT]
                .to_str()
                .unwrap()
                .contains("Version/10.1.2 Safari")
        );
    }

    #[test]
    fn endpoint_joins_segments() {
        let config = Config {
            base_url: "http://127.0.0.1:8080/".into(),
            ..Default::default()
        };
        let api = ApiClientImpl::new(MockClient::new(), config);
        assert_eq!(api.config().base_url, "http://127.0.0.1:8080/");
        let url = api.endpoint(["i", "profiles", "show", "jack"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/i/profiles/show/jack");
    }
}
