use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{ApiClientImpl, Target};
use crate::{
    client::HttpClient,
    error::{Error, Result},
    markup::{Document, Element},
    models::{Entries, Post, PostCounts, Video},
};

const STREAM_ITEM: &str = ".stream-item";
const ACTIONABLE: &str = ".js-profile-popup-actionable";
const ACTION_COUNT: &str = ".ProfileTweet-actionCount";
const URL_SELECTORS: [&str; 2] = [
    "a.twitter-timeline-link:not(.u-hidden)",
    "[class='js-tweet-text-container'] a[data-expanded-url]",
];

static GLUED_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S)http")
        .map_err(|e| log::error!("Regex init failed: {e}"))
        .unwrap()
});
static GLUED_PIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S)pic\.twitter")
        .map_err(|e| log::error!("Regex init failed: {e}"))
        .unwrap()
});

pub trait TimelineApi {
    /// Posts of `target`, newest first, fetched one page per request.
    ///
    /// At most `pages` requests are made, and only as the stream is polled
    /// past the posts already fetched. The stream ends early when a page
    /// has no markup or the feed reports it has no more items. The first
    /// error ends it.
    fn timeline(&self, target: Target, pages: u32) -> impl Stream<Item = Result<Post>> + '_;
}

#[derive(Debug, Deserialize)]
struct TimelineEnvelope {
    items_html: Option<String>,
    min_position: Option<String>,
    has_more_items: Option<bool>,
}

/// The posts of one timeline fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePage {
    pub posts: Vec<Post>,
    pub last_item_id: String,
}

struct TimelineState {
    target: Target,
    position: Option<String>,
    remaining: u32,
    exhausted: bool,
    buffered: VecDeque<Post>,
}

impl<C: HttpClient> TimelineApi for ApiClientImpl<C> {
    fn timeline(&self, target: Target, pages: u32) -> impl Stream<Item = Result<Post>> + '_ {
        let state = TimelineState {
            target,
            position: None,
            remaining: pages,
            exhausted: false,
            buffered: VecDeque::new(),
        };
        stream::try_unfold(state, move |state| self.next_post(state))
    }
}

impl<C: HttpClient> ApiClientImpl<C> {
    async fn next_post(&self, mut state: TimelineState) -> Result<Option<(Post, TimelineState)>> {
        loop {
            if let Some(post) = state.buffered.pop_front() {
                return Ok(Some((post, state)));
            }
            if state.exhausted || state.remaining == 0 {
                return Ok(None);
            }
            state.remaining -= 1;

            let envelope = self
                .timeline_envelope(&state.target, state.position.as_deref())
                .await?;
            let Some(page) = parse_envelope(&state.target, &envelope)? else {
                return Ok(None);
            };
            debug!(
                "got {} posts, last item {}, next position {:?}",
                page.posts.len(),
                page.last_item_id,
                envelope.min_position
            );
            state.exhausted =
                envelope.min_position.is_none() || envelope.has_more_items == Some(false);
            state.position = envelope.min_position;
            state.buffered.extend(page.posts);
        }
    }

    async fn timeline_envelope(
        &self,
        target: &Target,
        position: Option<&str>,
    ) -> Result<TimelineEnvelope> {
        info!("getting timeline of {target}, position: {position:?}");
        let url = self.timeline_url(target, position)?;
        let body = self
            .fetch(&url, &target.referer_path(), &target.to_string())
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn timeline_url(&self, target: &Target, position: Option<&str>) -> Result<Url> {
        let mut url = match target {
            Target::User(name) => {
                self.endpoint(["i", "profiles", "show", name.as_str(), "timeline", "tweets"])?
            }
            Target::Hashtag(_) => self.endpoint(["i", "search", "timeline"])?,
        };
        {
            let mut query = url.query_pairs_mut();
            if let Target::Hashtag(tag) = target {
                query
                    .append_pair("f", "tweets")
                    .append_pair("vertical", "default")
                    .append_pair("q", &format!("#{tag}"))
                    .append_pair("src", "tyah")
                    .append_pair("reset_error_state", "false");
            }
            query
                .append_pair("include_available_features", "1")
                .append_pair("include_entities", "1")
                .append_pair("include_new_items_bar", "true");
            if let Some(position) = position {
                query.append_pair("max_position", position);
            }
        }
        Ok(url)
    }
}

/// `None` means the fragment was empty: the feed has nothing more to give.
fn parse_envelope(target: &Target, envelope: &TimelineEnvelope) -> Result<Option<TimelinePage>> {
    let items_html = envelope
        .items_html
        .as_deref()
        .ok_or_else(|| Error::NotFound(target.to_string()))?;
    let doc = match Document::parse_fragment(items_html) {
        Ok(doc) => doc,
        Err(Error::MalformedMarkup(reason)) => {
            debug!("timeline of {target} ended: {reason}");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    extract_page(&doc).map(Some)
}

/// Extracts every post of a timeline fragment.
///
/// Stream items and actionable elements are paired by position. Items
/// without a text body or an id are skipped. A fragment without any
/// stream item is an error.
pub fn extract_page(doc: &Document) -> Result<TimelinePage> {
    let items = doc.query(STREAM_ITEM)?;
    let actionables = doc.query(ACTIONABLE)?;
    if items.len() != actionables.len() {
        warn!(
            "{} stream items but {} actionable elements, authors may be mismatched",
            items.len(),
            actionables.len()
        );
    }

    let mut posts = Vec::new();
    for (item, actor) in items.iter().zip(&actionables) {
        if let Some(post) = extract_post(item, actor)? {
            posts.push(post);
        }
    }

    let last = items
        .last()
        .ok_or_else(|| Error::MissingElement(STREAM_ITEM.to_string()))?;
    // the last item that carries an id; only a fragment without any is a fault
    let last_item_id = match items
        .iter()
        .rev()
        .find_map(|item| item.attribute("data-item-id"))
    {
        Some(id) => id.to_string(),
        None => last.require_attribute("data-item-id")?.to_string(),
    };

    for post in &mut posts {
        post.text = separate_links(&post.text);
    }
    Ok(TimelinePage {
        posts,
        last_item_id,
    })
}

fn extract_post(item: &Element<'_>, actor: &Element<'_>) -> Result<Option<Post>> {
    let Some(text) = item.first(".tweet-text")? else {
        debug!("skipping {item} without text");
        return Ok(None);
    };
    let Some(id) = item.attribute("data-item-id") else {
        debug!("skipping {item} without id");
        return Ok(None);
    };

    let counts = item
        .query(ACTION_COUNT)?
        .iter()
        .map(Element::text)
        .collect::<Vec<_>>();

    let mut urls = BTreeSet::new();
    for selector in URL_SELECTORS {
        for link in item.query(selector)? {
            urls.insert(link.require_attribute("data-expanded-url")?.to_string());
        }
    }

    let mut videos = Vec::new();
    for player in item.query(".PlayableMedia-player")? {
        videos.extend(videos_from_style(player.require_attribute("style")?));
    }

    Ok(Some(Post {
        id: id.to_string(),
        permalink: actor.require_attribute("data-permalink-path")?.to_string(),
        username: actor.require_attribute("data-screen-name")?.to_string(),
        user_id: actor.require_attribute("data-user-id")?.to_string(),
        is_retweet: item
            .require(".js-stream-tweet")?
            .attribute("data-retweet-id")
            .is_some_and(|id| !id.is_empty()),
        is_pinned: item.exists("div.pinned")?,
        time: parse_time(item.require("._timestamp")?.require_attribute("data-time-ms")?)?,
        text: text.full_text(),
        counts: PostCounts {
            replies: engagement(&counts, 0, &[3])?,
            retweets: engagement(&counts, 1, &[4, 5])?,
            likes: engagement(&counts, 2, &[6, 7])?,
        },
        entries: Entries {
            hashtags: item
                .query(".twitter-hashtag")?
                .iter()
                .map(Element::full_text)
                .collect(),
            urls,
            photos: item
                .query(".AdaptiveMedia-photoContainer")?
                .iter()
                .map(|photo| photo.require_attribute("data-image-url").map(String::from))
                .collect::<Result<_>>()?,
            videos,
        },
    }))
}

fn parse_time(millis: &str) -> Result<DateTime<Utc>> {
    millis
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| Error::InvalidTimestamp(millis.to_string()))
}

/// Reads the count at `primary`. The action bar repeats each counter, so
/// an empty entry falls back to the later copies in order, taken as-is.
fn engagement(counts: &[String], primary: usize, fallbacks: &[usize]) -> Result<u64> {
    let entry = |index: usize| {
        counts
            .get(index)
            .ok_or_else(|| Error::MissingElement(format!("{ACTION_COUNT} #{index}")))
    };

    let mut value = entry(primary)?
        .split(' ')
        .next()
        .unwrap_or_default()
        .replace([',', '.'], "");
    for &index in fallbacks {
        if !value.is_empty() {
            break;
        }
        value = entry(index)?.clone();
    }
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidCount(value.clone()))
}

/// Video ids are the thumbnail file names named by `background*`
/// declarations of an inline style.
fn videos_from_style(style: &str) -> Vec<Video> {
    style
        .split_whitespace()
        .filter(|declaration| declaration.starts_with("background"))
        .map(|declaration| {
            let file = declaration.rsplit('/').next().unwrap_or(declaration);
            let id = [".jpg", ".png"]
                .iter()
                .find_map(|ext| file.find(ext).map(|at| file[..at].to_string()));
            Video { id }
        })
        .collect()
}

/// Puts a space before the first link, and the first `pic.twitter` link,
/// glued onto the preceding word.
pub fn separate_links(text: &str) -> String {
    let text = GLUED_LINK.replacen(text, 1, "$1 http");
    GLUED_PIC.replacen(&text, 1, "$1 pic.twitter").into_owned()
}
