//! Wire types for the conversion service responses plus the URL builders used
//! to address each endpoint.
//!
//! The service is loose about JSON types (flags arrive as `true` or `1`, ids as
//! strings or numbers), so the decoders here accept every shape observed in the
//! wild and normalise it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

pub(crate) const SUBMIT_PATH: &str = "/ajax/download.php";
pub(crate) const PROGRESS_PATH: &str = "/ajax/progress.php";
pub(crate) const PLAYLIST_PATH: &str = "/ajax/playlist.php";

/// Progress is reported in tenths of a percent.
pub const PROGRESS_SCALE: u32 = 1000;

/// Reply to a conversion submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: Option<String>,
}

impl SubmitResponse {
    /// Job id when the service accepted the submission.
    pub fn job_id(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        non_empty(self.id.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }
}

/// Reply to a progress query for a single job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressResponse {
    #[serde(default, deserialize_with = "flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "permille")]
    pub progress: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub download_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
}

impl ProgressResponse {
    /// Result URL once the job finished; `None` while it is still pending.
    pub fn result_url(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        non_empty(self.download_url.as_deref())
    }

    /// Whole percent completed, clamped to 100.
    pub fn percent(&self) -> u32 {
        self.progress.min(PROGRESS_SCALE) / 10
    }
}

/// Reply to a playlist listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaylistResponse {
    #[serde(default, deserialize_with = "flag")]
    pub is_playlist: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub html: Option<String>,
}

pub(crate) fn endpoint_url(
    base: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base.trim())?.join(path)?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(value)) => value,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => {
            matches!(text.trim().to_ascii_lowercase().as_str(), "1" | "true")
        }
        _ => false,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn permille<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(raw.clamp(0.0, f64::from(PROGRESS_SCALE)) as u32)
}
