//! Audio splitter: cuts one local audio file in two at a `min:sec` timestamp by
//! handing the work to `ffmpeg`.

use crate::runtime::input::ask;
use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::process::Command;

pub const FILE_PROMPT: &str = "Enter the path to the music file (e.g., song.mp3): ";
pub const TIMESTAMP_PROMPT: &str =
    "Enter the timestamp (in min:sec format) to split the audio at: ";

pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const PART_ONE: &str = "part1.mp3";
pub const PART_TWO: &str = "part2.mp3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    MissingFile { path: PathBuf },
    InvalidTimestamp { input: String },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::MissingFile { path } => {
                write!(f, "input file {} does not exist", path.display())
            }
            SplitError::InvalidTimestamp { input } => write!(
                f,
                "invalid timestamp {input:?}; use min:sec format (e.g., 3:21)"
            ),
        }
    }
}

impl std::error::Error for SplitError {}

/// Parses `min:sec` into whole seconds. Both parts must be non-negative integers;
/// seconds above 59 are accepted and simply carried over.
pub fn parse_timestamp(input: &str) -> Result<u64, SplitError> {
    let invalid = || SplitError::InvalidTimestamp {
        input: input.to_owned(),
    };

    let (minutes, seconds) = input.trim().split_once(':').ok_or_else(invalid)?;
    let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.trim().parse().map_err(|_| invalid())?;

    minutes
        .checked_mul(60)
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(invalid)
}

/// Raw answers collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitAnswers {
    pub input_path: String,
    pub timestamp: String,
}

/// A split that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    input: PathBuf,
    timestamp: String,
    at_seconds: u64,
}

impl SplitRequest {
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn at_seconds(&self) -> u64 {
        self.at_seconds
    }
}

impl SplitAnswers {
    pub fn new(input_path: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            timestamp: timestamp.into(),
        }
    }

    /// The file is checked first, then the timestamp.
    pub async fn validate(&self) -> Result<SplitRequest, SplitError> {
        let input = PathBuf::from(self.input_path.trim());
        ensure_input_exists(&input).await?;

        let timestamp = self.timestamp.trim().to_owned();
        let at_seconds = parse_timestamp(&timestamp)?;

        Ok(SplitRequest {
            input,
            timestamp,
            at_seconds,
        })
    }
}

pub async fn ensure_input_exists(path: &Path) -> Result<(), SplitError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Ok(()),
        _ => Err(SplitError::MissingFile {
            path: path.to_path_buf(),
        }),
    }
}

/// Asks for the input file, then for the split timestamp.
pub async fn prompt<R, W>(reader: &mut R, writer: &mut W) -> Result<SplitAnswers>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let input_path = ask(reader, writer, FILE_PROMPT).await?;
    let timestamp = ask(reader, writer, TIMESTAMP_PROMPT).await?;
    Ok(SplitAnswers {
        input_path,
        timestamp,
    })
}

/// Paths of the two halves written by a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    pub part_one: PathBuf,
    pub part_two: PathBuf,
}

/// Runs `ffmpeg` to write `part1.mp3` (start up to the timestamp) and
/// `part2.mp3` (timestamp to the end) into `output_dir`.
#[derive(Debug, Clone)]
pub struct Splitter {
    ffmpeg: OsString,
    output_dir: PathBuf,
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG, ".")
    }
}

impl Splitter {
    pub fn new(ffmpeg: impl Into<OsString>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output(&self) -> SplitOutput {
        SplitOutput {
            part_one: self.output_dir.join(PART_ONE),
            part_two: self.output_dir.join(PART_TWO),
        }
    }

    /// Arguments passed to `ffmpeg`. Both outputs copy the audio stream as is.
    pub fn arguments(&self, request: &SplitRequest) -> Vec<OsString> {
        let output = self.output();
        let at = request.at_seconds().to_string();

        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), request.input().into()];
        args.extend(["-to", at.as_str(), "-acodec", "copy"].map(OsString::from));
        args.push(output.part_one.into());
        args.extend(["-ss", at.as_str(), "-acodec", "copy"].map(OsString::from));
        args.push(output.part_two.into());
        args
    }

    pub async fn split(&self, request: &SplitRequest) -> Result<SplitOutput> {
        tracing::info!(
            input = %request.input().display(),
            at_seconds = request.at_seconds(),
            "splitting audio"
        );

        let output = Command::new(&self.ffmpeg)
            .args(self.arguments(request))
            .output()
            .await
            .with_context(|| format!("failed to launch {:?}", self.ffmpeg))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg exited with {}: {}", output.status, stderr.trim());
        }

        Ok(self.output())
    }
}
