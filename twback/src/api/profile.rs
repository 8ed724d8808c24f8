#![allow(async_fn_in_trait)]
use log::{debug, info, warn};

use super::ApiClientImpl;
use crate::{
    client::HttpClient,
    error::{Error, Result},
    markup::{Document, Element},
    models::{Profile, ProfileCounts},
};

/// Present on every public, existing profile page.
const PROFILE_MARKER: &str = ".ProfileHeaderCard";

const PROTECTED_BADGE: &str = ".ProfileHeaderCard-badges .Icon--protected";
const VERIFIED_BADGE: &str = ".ProfileHeaderCard-badges .Icon--verified";

pub trait ProfileApi {
    async fn profile(&self, username: &str) -> Result<Profile>;
}

impl<C: HttpClient> ProfileApi for ApiClientImpl<C> {
    async fn profile(&self, username: &str) -> Result<Profile> {
        info!("getting profile of {username}");
        let url = self.endpoint([username])?;
        let page = self.fetch(&url, username, username).await?;
        extract_profile(username, &page)
    }
}

/// Builds a [`Profile`] from a profile page.
///
/// Photo, title, user id, biography and location must be present; any
/// other element may be missing and leaves its field empty.
pub fn extract_profile(username: &str, markup: &str) -> Result<Profile> {
    let doc = match Document::parse(markup) {
        Ok(doc) => doc,
        Err(Error::MalformedMarkup(reason)) => {
            warn!("ignoring unparsable profile page of {username}: {reason}");
            Document::empty()
        }
        Err(err) => return Err(err),
    };
    if !doc.exists(PROFILE_MARKER)? {
        return Err(Error::NotFound(username.to_string()));
    }

    let profile = Profile {
        name: name_from_title(&doc.require("title")?.text()),
        username: username.to_string(),
        birthday: try_extract(&doc, ".ProfileHeaderCard-birthdateText", |e| {
            non_empty(e.text()).map(strip_born)
        }),
        biography: doc.require(".ProfileHeaderCard-bio")?.text(),
        location: non_empty(doc.require(".ProfileHeaderCard-locationText")?.text()),
        website: try_extract(&doc, ".ProfileHeaderCard-urlText", |e| non_empty(e.text())),
        profile_photo: doc
            .require(".ProfileAvatar-image")?
            .require_attribute("src")?
            .to_string(),
        banner_photo: try_extract(&doc, ".ProfileCanopy-headerBg img", |e| {
            e.attribute("src").map(String::from)
        }),
        counts: ProfileCounts {
            likes: nav_count(&doc, "favorites"),
            tweets: nav_count(&doc, "tweets"),
            followers: nav_count(&doc, "followers"),
            following: nav_count(&doc, "following"),
        },
        is_verified: badge(&doc, VERIFIED_BADGE),
        is_private: badge(&doc, PROTECTED_BADGE),
        user_id: doc
            .require(".ProfileNav")?
            .require_attribute("data-user-id")?
            .to_string(),
    };
    debug!("extracted {profile}: {:?}", profile.counts);
    Ok(profile)
}

/// Runs `extract` on the first match of `selector`. A miss, or a selector
/// that fails to compile, gives `None`.
fn try_extract<'d, T>(
    doc: &'d Document,
    selector: &str,
    extract: impl FnOnce(Element<'d>) -> Option<T>,
) -> Option<T> {
    doc.first(selector).ok().flatten().and_then(extract)
}

fn badge(doc: &Document, selector: &str) -> bool {
    doc.exists(selector).unwrap_or(false)
}

fn nav_count(doc: &Document, kind: &str) -> Option<i64> {
    let selector = format!(r#"li[class*="--{kind}"] span[data-count]"#);
    try_extract(doc, &selector, |e| e.attribute("data-count")?.parse().ok())
}

/// Page titles read `Display Name (@handle) | Twitter`.
fn name_from_title(title: &str) -> String {
    match title.find('(') {
        Some(at) => title[..at].trim().to_string(),
        None => title.trim().to_string(),
    }
}

fn strip_born(birthday: String) -> String {
    match birthday.strip_prefix("Born ") {
        Some(date) => date.to_string(),
        None => birthday,
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
