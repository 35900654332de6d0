//! Interactive input collection and the validation performed before any
//! network activity starts.

use crate::service::markup::is_youtube;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

pub const URL_PROMPT: &str = "Enter the YouTube playlist URL: ";
pub const FOLDER_PROMPT: &str = "Enter the folder name to save the downloads: ";
pub const FORMAT_PROMPT: &str = "Enter format: ";

const CURRENT_DIR: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    MissingValue { field: &'static str },
    InvalidUrl { url: String, source: url::ParseError },
    NotYouTube { url: String },
    InvalidFormat { format: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingValue { field } => write!(f, "please insert a {field}"),
            InputError::InvalidUrl { url, source } => write!(f, "invalid URL {url:?}: {source}"),
            InputError::NotYouTube { url } => write!(f, "not a YouTube playlist URL: {url}"),
            InputError::InvalidFormat { format } => {
                write!(f, "format {format:?} cannot be used as a file extension")
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::InvalidUrl { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Raw answers collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInput {
    pub playlist_url: String,
    pub folder: String,
    pub format: String,
}

/// Input that passed validation and is safe to hand to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    playlist_url: String,
    folder: PathBuf,
    format: String,
}

impl ValidatedInput {
    pub fn playlist_url(&self) -> &str {
        &self.playlist_url
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl UserInput {
    pub fn new(
        playlist_url: impl Into<String>,
        folder: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            playlist_url: playlist_url.into(),
            folder: folder.into(),
            format: format.into(),
        }
    }

    /// Checks the answers in the order the user gave them. An empty folder name
    /// resolves to the current directory.
    pub fn validate(&self) -> Result<ValidatedInput, InputError> {
        let playlist_url = self.playlist_url.trim();
        let format = self.format.trim();
        let folder = self.folder.trim();

        if playlist_url.is_empty() {
            return Err(InputError::MissingValue {
                field: "download URL",
            });
        }
        if format.is_empty() {
            return Err(InputError::MissingValue { field: "format" });
        }

        if let Err(source) = Url::parse(playlist_url) {
            return Err(InputError::InvalidUrl {
                url: playlist_url.to_owned(),
                source,
            });
        }

        if !is_youtube(playlist_url) {
            return Err(InputError::NotYouTube {
                url: playlist_url.to_owned(),
            });
        }

        if !is_file_extension(format) {
            return Err(InputError::InvalidFormat {
                format: format.to_owned(),
            });
        }

        let folder = if folder.is_empty() {
            PathBuf::from(CURRENT_DIR)
        } else {
            PathBuf::from(folder)
        };

        Ok(ValidatedInput {
            playlist_url: playlist_url.to_owned(),
            folder,
            format: format.to_owned(),
        })
    }
}

/// The format ends up as the extension of every saved file, so it must stay a
/// single path component.
fn is_file_extension(format: &str) -> bool {
    format != "."
        && format != ".."
        && !format
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Asks for the playlist URL, folder name, and format, in that order.
pub async fn prompt<R, W>(reader: &mut R, writer: &mut W) -> Result<UserInput>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let playlist_url = ask(reader, writer, URL_PROMPT).await?;
    let folder = ask(reader, writer, FOLDER_PROMPT).await?;
    let format = ask(reader, writer, FORMAT_PROMPT).await?;

    Ok(UserInput {
        playlist_url,
        folder,
        format,
    })
}

pub(crate) async fn ask<R, W>(reader: &mut R, writer: &mut W, question: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(question.as_bytes())
        .await
        .context("failed to write prompt")?;
    writer.flush().await.context("failed to flush prompt")?;

    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .context("failed to read answer")?;
    if read == 0 {
        bail!("input closed before answering {:?}", question.trim());
    }

    Ok(line.trim().to_owned())
}
