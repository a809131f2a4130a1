use crate::cue::error::CueError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    CueError(#[from] CueError),

    #[error("Invalid track layout: {0}")]
    InvalidLayout(String),

    #[error("Unsupported file type {file_type} for '{filename}'")]
    UnsupportedFileType { filename: String, file_type: String },

    #[error("Failed to open {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image contains no tracks")]
    EmptyImage,

    #[error("Sector {0} is not part of any track")]
    NotFound(u32),

    #[error("Track {0} does not exist")]
    TrackNotFound(u8),

    #[error("Disc has no audio tracks")]
    NoAudioTrack,

    #[error("Reading {count} sectors from {sector} runs past the end of track {track}")]
    OutOfRange { sector: u32, count: u32, track: u8 },
}

impl ImageError {
    /// Malformed sheet or unusable layout, as opposed to I/O trouble.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImageError::CueError(_)
                | ImageError::InvalidLayout(_)
                | ImageError::UnsupportedFileType { .. }
        )
    }
}

pub type ImageResult<T> = Result<T, ImageError>;
