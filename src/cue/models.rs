use crate::cd::{Mode2Form, Msf, TrackMode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSheet {
    pub files: Vec<CueFile>,
}

impl CueSheet {
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.files.iter().flat_map(|file| file.tracks.iter())
    }

    pub fn track_count(&self) -> usize {
        self.files.iter().map(|file| file.tracks.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueFile {
    pub filename: String,
    pub file_type: FileType,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub number: u8,
    pub track_type: TrackType,
    /// Ascending by number and position; always contains INDEX 01.
    pub indices: Vec<Index>,
    pub pregap: Option<Msf>,
    pub postgap: Option<Msf>,
    pub flags: Vec<TrackFlag>,
}

impl Track {
    pub fn index(&self, number: u8) -> Option<Msf> {
        self.indices
            .iter()
            .find(|index| index.number == number)
            .map(|index| index.position)
    }

    pub fn has_flag(&self, flag: TrackFlag) -> bool {
        self.flags.contains(&flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub number: u8,
    pub position: Msf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Audio,
    CdG,
    Mode1_2048,
    Mode1_2352,
    Mode1_2448,
    Mode2_2048,
    Mode2_2324,
    Mode2_2336,
    Mode2_2352,
    Mode2_2448,
    CdI2336,
    CdI2352,
}

impl TrackType {
    pub fn mode(self) -> TrackMode {
        match self {
            TrackType::Audio => TrackMode::Audio { subcode: false },
            TrackType::CdG => TrackMode::Audio { subcode: true },
            TrackType::Mode1_2048 => TrackMode::Mode1Cooked,
            TrackType::Mode1_2352 => TrackMode::Mode1Raw { subcode: false },
            TrackType::Mode1_2448 => TrackMode::Mode1Raw { subcode: true },
            TrackType::Mode2_2048 => TrackMode::Mode2Cooked(Mode2Form::Form1),
            TrackType::Mode2_2324 => TrackMode::Mode2Cooked(Mode2Form::Form2),
            TrackType::Mode2_2336 | TrackType::CdI2336 => TrackMode::Mode2Xa(Mode2Form::Form1),
            TrackType::Mode2_2352 | TrackType::CdI2352 => TrackMode::Mode2Raw {
                form: Mode2Form::Form1,
                subcode: false,
            },
            TrackType::Mode2_2448 => TrackMode::Mode2Raw {
                form: Mode2Form::Form1,
                subcode: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFlag {
    Dcp,
    Pre,
    FourChannel,
    Scms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Binary,
    Motorola,
    Aiff,
    Wave,
    Mp3,
}

impl FileType {
    pub fn is_raw_sectors(self) -> bool {
        matches!(self, FileType::Binary | FileType::Motorola)
    }
}
