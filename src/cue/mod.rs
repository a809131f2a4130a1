use crate::cd::Msf;
use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{CueFile, CueSheet, FileType, Index, Track, TrackFlag, TrackType};
use log::debug;

pub mod error;
pub mod models;

const MAX_TRACK_NUMBER: u8 = 99;
const MAX_INDEX_NUMBER: u8 = 99;

#[derive(Debug, Default)]
pub struct CueParser {
    line: usize,
    current_file: Option<CueFile>,
    current_track: Option<Track>,
    last_track_number: Option<u8>,
}

impl CueParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_bytes(self, data: &[u8]) -> CueResult<CueSheet> {
        let text = std::str::from_utf8(data).map_err(|_| CueError::InvalidEncoding)?;
        self.parse(text)
    }

    pub fn parse(mut self, text: &str) -> CueResult<CueSheet> {
        let mut cue_sheet = CueSheet::default();

        for (number, line) in text.trim_start_matches('\u{feff}').lines().enumerate() {
            self.line = number + 1;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let directive = parts[0].to_ascii_uppercase();

            match directive.as_str() {
                "REM" => {}
                "FILE" => {
                    self.finish_file(&mut cue_sheet)?;

                    if parts.len() < 3 {
                        return Err(self.missing_argument("FILE"));
                    }
                    let filename = if line.contains('"') {
                        self.extract_quoted_string(line)?
                    } else {
                        parts[1..parts.len() - 1].join(" ")
                    };
                    let file_type = self.parse_file_type(parts[parts.len() - 1])?;

                    debug!("CUE file '{filename}' ({file_type:?})");
                    self.current_file = Some(CueFile {
                        filename,
                        file_type,
                        tracks: Vec::new(),
                    });
                }
                "TRACK" => {
                    if self.current_file.is_none() {
                        return Err(self.outside_of_context("TRACK", "FILE"));
                    }
                    if parts.len() < 3 {
                        return Err(self.missing_argument("TRACK"));
                    }

                    self.finish_track()?;

                    let number = self.parse_track_number(parts[1])?;
                    let track_type = self.parse_track_type(parts[2])?;

                    self.current_track = Some(Track {
                        number,
                        track_type,
                        indices: Vec::new(),
                        pregap: None,
                        postgap: None,
                        flags: Vec::new(),
                    });
                }
                "INDEX" => {
                    if parts.len() < 3 {
                        return Err(self.missing_argument("INDEX"));
                    }
                    let number = parts[1].parse::<u8>()?;
                    let position = self.parse_msf(parts[2])?;

                    let track = self
                        .current_track
                        .as_mut()
                        .ok_or_else(|| outside_of_context(self.line, "INDEX", "TRACK"))?;
                    push_index(track, Index { number, position })?;
                }
                "PREGAP" | "POSTGAP" => {
                    if parts.len() < 2 {
                        return Err(self.missing_argument(&directive));
                    }
                    let gap = self.parse_msf(parts[1])?;

                    let line = self.line;
                    let track = self
                        .current_track
                        .as_mut()
                        .ok_or_else(|| outside_of_context(line, &directive, "TRACK"))?;
                    if directive == "PREGAP" {
                        track.pregap = Some(gap);
                    } else {
                        track.postgap = Some(gap);
                    }
                }
                "FLAGS" => {
                    let line = self.line;
                    let track = self
                        .current_track
                        .as_mut()
                        .ok_or_else(|| outside_of_context(line, "FLAGS", "TRACK"))?;
                    for flag in &parts[1..] {
                        match parse_flag(flag) {
                            Some(flag) => track.flags.push(flag),
                            None => debug!("Ignoring unknown track flag {flag}"),
                        }
                    }
                }
                _ => debug!("Ignoring CUE directive {} on line {}", parts[0], self.line),
            }
        }

        self.finish_file(&mut cue_sheet)?;

        Ok(cue_sheet)
    }

    fn finish_track(&mut self) -> CueResult<()> {
        let Some(track) = self.current_track.take() else {
            return Ok(());
        };

        if track.index(1).is_none() {
            return Err(CueError::MissingIndex01(track.number));
        }

        if let Some(file) = self.current_file.as_mut() {
            file.tracks.push(track);
        }
        Ok(())
    }

    fn finish_file(&mut self, cue_sheet: &mut CueSheet) -> CueResult<()> {
        self.finish_track()?;

        if let Some(file) = self.current_file.take() {
            if file.tracks.is_empty() {
                return Err(CueError::FileWithoutTracks(file.filename));
            }
            cue_sheet.files.push(file);
        }
        Ok(())
    }

    fn parse_track_number(&mut self, number_str: &str) -> CueResult<u8> {
        let number = number_str
            .parse::<u8>()
            .ok()
            .filter(|number| (1..=MAX_TRACK_NUMBER).contains(number))
            .ok_or_else(|| CueError::InvalidTrackNumber(number_str.to_string()))?;

        match self.last_track_number {
            None if number != 1 => return Err(CueError::InvalidFirstTrack(number)),
            Some(previous) if number != previous + 1 => {
                return Err(CueError::TrackOutOfOrder {
                    previous,
                    found: number,
                });
            }
            _ => {}
        }

        self.last_track_number = Some(number);
        Ok(number)
    }

    fn extract_quoted_string(&self, line: &str) -> CueResult<String> {
        match (line.find('"'), line.rfind('"')) {
            (Some(start), Some(end)) if start < end => Ok(line[start + 1..end].to_string()),
            _ => Err(CueError::InvalidQuotedString(line.to_string())),
        }
    }

    fn parse_file_type(&self, type_str: &str) -> CueResult<FileType> {
        match type_str.to_ascii_uppercase().as_str() {
            "BINARY" => Ok(FileType::Binary),
            "MOTOROLA" => Ok(FileType::Motorola),
            "AIFF" => Ok(FileType::Aiff),
            "WAVE" => Ok(FileType::Wave),
            "MP3" => Ok(FileType::Mp3),
            _ => Err(CueError::InvalidFileType(type_str.to_string())),
        }
    }

    fn parse_track_type(&self, type_str: &str) -> CueResult<TrackType> {
        match type_str.to_ascii_uppercase().as_str() {
            "AUDIO" => Ok(TrackType::Audio),
            "CDG" => Ok(TrackType::CdG),
            "MODE1/2048" => Ok(TrackType::Mode1_2048),
            "MODE1/2352" => Ok(TrackType::Mode1_2352),
            "MODE1/2448" => Ok(TrackType::Mode1_2448),
            "MODE2/2048" => Ok(TrackType::Mode2_2048),
            "MODE2/2324" => Ok(TrackType::Mode2_2324),
            "MODE2/2336" => Ok(TrackType::Mode2_2336),
            "MODE2/2352" => Ok(TrackType::Mode2_2352),
            "MODE2/2448" => Ok(TrackType::Mode2_2448),
            "CDI/2336" => Ok(TrackType::CdI2336),
            "CDI/2352" => Ok(TrackType::CdI2352),
            _ => Err(CueError::InvalidTrackType(type_str.to_string())),
        }
    }

    fn parse_msf(&self, msf_str: &str) -> CueResult<Msf> {
        Ok(msf_str.parse::<Msf>()?)
    }

    fn missing_argument(&self, directive: &str) -> CueError {
        CueError::MissingArgument {
            line: self.line,
            directive: directive.to_string(),
        }
    }

    fn outside_of_context(&self, directive: &str, context: &'static str) -> CueError {
        outside_of_context(self.line, directive, context)
    }
}

fn outside_of_context(line: usize, directive: &str, context: &'static str) -> CueError {
    CueError::OutsideOfContext {
        line,
        directive: directive.to_string(),
        context,
    }
}

fn push_index(track: &mut Track, index: Index) -> CueResult<()> {
    let number = track.number;
    let invalid = |reason: String| CueError::InvalidIndexOrder {
        track: number,
        reason,
    };

    if index.number > MAX_INDEX_NUMBER {
        return Err(invalid(format!("index {} is above 99", index.number)));
    }

    match track.indices.last() {
        None if index.number > 1 => {
            return Err(invalid(format!(
                "first index is {:02}, expected 00 or 01",
                index.number
            )));
        }
        Some(last) if index.number != last.number + 1 => {
            return Err(invalid(format!(
                "INDEX {:02} follows INDEX {:02}",
                index.number, last.number
            )));
        }
        Some(last) if index.position < last.position => {
            return Err(invalid(format!(
                "INDEX {:02} at {} is before INDEX {:02} at {}",
                index.number, index.position, last.number, last.position
            )));
        }
        _ => {}
    }

    track.indices.push(index);
    Ok(())
}

fn parse_flag(flag: &str) -> Option<TrackFlag> {
    match flag.to_ascii_uppercase().as_str() {
        "DCP" => Some(TrackFlag::Dcp),
        "PRE" => Some(TrackFlag::Pre),
        "4CH" => Some(TrackFlag::FourChannel),
        "SCMS" => Some(TrackFlag::Scms),
        _ => None,
    }
}
