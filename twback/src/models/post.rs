use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "tweetId")]
    pub id: String,
    #[serde(rename = "tweetUrl")]
    pub permalink: String,
    pub username: String,
    pub user_id: String,
    pub is_retweet: bool,
    pub is_pinned: bool,
    pub time: DateTime<Utc>,
    pub text: String,
    #[serde(flatten)]
    pub counts: PostCounts,
    pub entries: Entries,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostCounts {
    pub replies: u64,
    pub retweets: u64,
    pub likes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Entries {
    /// In document order.
    pub hashtags: Vec<String>,
    /// Expanded link targets, each once.
    pub urls: BTreeSet<String>,
    pub photos: Vec<String>,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Video {
    /// `None` when the thumbnail is neither `.jpg` nor `.png`.
    pub id: Option<String>,
}
