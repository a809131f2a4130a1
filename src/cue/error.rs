use crate::cd::msf::InvalidMsf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CueError {
    #[error("Unknown file type: {0}")]
    InvalidFileType(String),

    #[error("Unknown track type: {0}")]
    InvalidTrackType(String),

    #[error(transparent)]
    InvalidMSFFormat(#[from] InvalidMsf),

    #[error("Invalid quoted string: {0}")]
    InvalidQuotedString(String),

    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("Line {line}: {directive} is missing an argument")]
    MissingArgument { line: usize, directive: String },

    #[error("Line {line}: {directive} appears outside of a {context}")]
    OutsideOfContext {
        line: usize,
        directive: String,
        context: &'static str,
    },

    #[error("Invalid track number: {0}")]
    InvalidTrackNumber(String),

    #[error("Tracks out of order; track {found} after {previous}")]
    TrackOutOfOrder { previous: u8, found: u8 },

    #[error("Expected first track to be 01, was {0}")]
    InvalidFirstTrack(u8),

    #[error("Track {track}: {reason}")]
    InvalidIndexOrder { track: u8, reason: String },

    #[error("Track {0} has no INDEX 01")]
    MissingIndex01(u8),

    #[error("File '{0}' has no tracks")]
    FileWithoutTracks(String),

    #[error("CUE sheet contains non UTF-8 text")]
    InvalidEncoding,
}

pub type CueResult<T> = Result<T, CueError>;
