use std::fmt;

use serde::{Deserialize, Serialize};

/// Profile summary scraped from a user's page.
///
/// Only `username` is guaranteed; every other field is whatever the page
/// carried when it was fetched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    pub name: String,
    pub username: String,
    pub birthday: Option<String>,
    pub biography: String,
    pub location: Option<String>,
    pub website: Option<String>,
    pub profile_photo: String,
    pub banner_photo: Option<String>,
    #[serde(flatten)]
    pub counts: ProfileCounts,
    pub is_verified: bool,
    pub is_private: bool,
    pub user_id: String,
}

/// Each count is independent: one missing counter leaves the others intact.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProfileCounts {
    #[serde(rename = "likes_count")]
    pub likes: Option<i64>,
    #[serde(rename = "tweets_count")]
    pub tweets: Option<i64>,
    #[serde(rename = "followers_count")]
    pub followers: Option<i64>,
    #[serde(rename = "following_count")]
    pub following: Option<i64>,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<profile {}@twitter>", self.username)
    }
}
