//! Helpers for the playlist listing markup and YouTube link shapes.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

static ONCLICK_ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[onclick]").expect("valid anchor selector"));
static DOWNLOAD_FROM_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"downloadFromList\('([^']+)'\)").expect("valid onclick pattern"));
static SHORTS_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/shorts/([a-zA-Z0-9\-_]{11})").expect("valid shorts pattern"));
static WATCH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v=([a-zA-Z0-9\-_]{11})").expect("valid watch pattern"));
static SHORT_LINK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([a-zA-Z0-9\-_]{11})").expect("valid short link pattern"));

/// Video ids referenced by `downloadFromList('<id>')` anchors, in document order.
pub fn extract_video_ids(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&ONCLICK_ANCHORS)
        .filter_map(|anchor| anchor.value().attr("onclick"))
        .filter_map(|onclick| DOWNLOAD_FROM_LIST.captures(onclick))
        .filter_map(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
        .collect()
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

/// Extracts the 11 character video id from shorts, watch, and youtu.be links.
pub fn parse_video_id(link: &str) -> Option<String> {
    let pattern = if link.contains("youtube.com/shorts/") {
        &*SHORTS_ID
    } else if link.contains("youtube.com/") {
        &*WATCH_ID
    } else if link.contains("youtu.be/") {
        &*SHORT_LINK_ID
    } else {
        return None;
    };

    pattern
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
}

pub fn is_youtube(link: &str) -> bool {
    link.contains("youtu")
}
