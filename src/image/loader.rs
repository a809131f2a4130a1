use crate::cd::sector::header_mode;
use crate::cd::{COOKED_SECTOR_SIZE, MAX_LEAD_OUT, Mode2Form, Msf, RAW_SECTOR_SIZE, TrackMode};
use crate::cue::CueParser;
use crate::cue::error::CueError;
use crate::cue::models::{CueFile, CueSheet, FileType, TrackFlag};
use crate::image::Image;
use crate::image::error::{ImageError, ImageResult};
use crate::image::models::{FileId, ImageOptions, Track, TrackFlags, TrackIndex};
use crate::storage::{BackingFile, StorageBackend};
use log::{debug, warn};
use std::path::Path;

pub struct ImageLoader<'a> {
    backend: &'a dyn StorageBackend,
    options: ImageOptions,
}

impl<'a> ImageLoader<'a> {
    pub fn new(backend: &'a dyn StorageBackend, options: ImageOptions) -> Self {
        Self { backend, options }
    }

    pub fn load(&self, path: impl AsRef<Path>) -> ImageResult<Image> {
        let path = path.as_ref();
        let is_cue = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("cue"));

        if is_cue {
            self.load_cue(path)
        } else {
            self.load_iso(path)
        }
    }

    pub fn load_iso(&self, path: impl AsRef<Path>) -> ImageResult<Image> {
        let path = path.as_ref();
        let mut file = self.open(path)?;

        let file_length = file.length();
        if file_length == 0 {
            return Err(ImageError::EmptyImage);
        }

        let raw_size = RAW_SECTOR_SIZE as u64;
        let mode = if file_length % raw_size == 0 && file_length % COOKED_SECTOR_SIZE as u64 != 0 {
            let header = file.read(0, RAW_SECTOR_SIZE)?;
            if header_mode(&header) == Some(2) {
                TrackMode::Mode2Raw {
                    form: Mode2Form::Form1,
                    subcode: false,
                }
            } else {
                TrackMode::Mode1Raw { subcode: false }
            }
        } else {
            TrackMode::Mode1Cooked
        };

        let sector_size = mode.stored_sector_size() as u64;
        if file_length % sector_size != 0 {
            warn!(
                "{} ends with a partial sector; it will be zero-padded",
                path.display()
            );
        }
        let length = file_length.div_ceil(sector_size);
        check_lead_out(1, length)?;

        let track = Track {
            number: 1,
            flags: TrackFlags {
                data: true,
                ..TrackFlags::default()
            },
            mode,
            start: 0,
            length: length as u32,
            skip: 0,
            file: FileId(0),
            indices: vec![TrackIndex {
                number: 1,
                offset: 0,
            }],
            byte_swapped_audio: false,
        };

        debug!(
            "Loaded ISO {}: {} ({} sectors)",
            path.display(),
            mode.cue_name(),
            track.length
        );

        Ok(Image::new(vec![file], vec![track]))
    }

    /// Loads a CUE sheet and every file it references. Files are resolved
    /// relative to the sheet's directory.
    pub fn load_cue(&self, path: impl AsRef<Path>) -> ImageResult<Image> {
        let path = path.as_ref();
        let mut sheet_file = self.open(path)?;
        let data = sheet_file.read(0, sheet_file.length() as usize)?;
        sheet_file.close();

        debug!("Parsing CUE file: {}", path.display());
        let cue_sheet = CueParser::new().parse_bytes(&data)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));

        // Dropping the arena on an early return closes whatever was opened.
        let mut files = Vec::with_capacity(cue_sheet.files.len());
        let tracks = self.layout_tracks(&cue_sheet, base_dir, &mut files)?;

        if tracks.is_empty() {
            return Err(ImageError::EmptyImage);
        }

        debug!(
            "Loaded CUE {}: {} tracks in {} files, lead-out at {}",
            path.display(),
            tracks.len(),
            files.len(),
            tracks.last().map_or(0, Track::end)
        );

        Ok(Image::new(files, tracks))
    }

    fn open(&self, path: &Path) -> ImageResult<BackingFile> {
        debug!("Opening {}", path.display());
        BackingFile::open(self.backend, path, self.options.seek_cache).map_err(|source| {
            ImageError::MissingFile {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn layout_tracks(
        &self,
        cue_sheet: &CueSheet,
        base_dir: &Path,
        files: &mut Vec<BackingFile>,
    ) -> ImageResult<Vec<Track>> {
        let mut tracks: Vec<Track> = Vec::with_capacity(cue_sheet.track_count());
        let mut postgap = 0u32;

        for cue_file in &cue_sheet.files {
            if !cue_file.file_type.is_raw_sectors() {
                return Err(ImageError::UnsupportedFileType {
                    filename: cue_file.filename.clone(),
                    file_type: format!("{:?}", cue_file.file_type).to_uppercase(),
                });
            }

            let file = self.open(&base_dir.join(&cue_file.filename))?;
            let file_length = file.length();
            let id = FileId(files.len());
            files.push(file);

            // Absolute sector of frame 0 of this file, before any gaps.
            let origin = tracks.last().map_or(0, Track::end) + postgap;
            layout_file(cue_file, id, origin, &mut postgap, &mut tracks)?;

            let Some(last) = tracks.last_mut() else {
                continue;
            };
            if last.skip >= file_length {
                return Err(ImageError::InvalidLayout(format!(
                    "track {} starts at byte {} but '{}' is only {} bytes",
                    last.number, last.skip, cue_file.filename, file_length
                )));
            }

            let remaining = file_length - last.skip;
            let sector_size = last.sector_size() as u64;
            if remaining % sector_size != 0 {
                warn!(
                    "'{}' ends with a partial sector; it will be zero-padded",
                    cue_file.filename
                );
            }
            let length = remaining.div_ceil(sector_size);
            check_lead_out(last.number, u64::from(last.start) + length)?;
            last.length = length as u32;
            debug!(
                "Track {:02}: {} start {} length {} skip {}",
                last.number,
                last.mode.cue_name(),
                last.start,
                last.length,
                last.skip
            );
        }

        Ok(tracks)
    }
}

fn check_lead_out(track: u8, lead_out: u64) -> ImageResult<()> {
    if lead_out > u64::from(MAX_LEAD_OUT) {
        return Err(ImageError::InvalidLayout(format!(
            "track {track} ends at sector {lead_out}, past the last addressable sector {}",
            MAX_LEAD_OUT - 1
        )));
    }
    Ok(())
}

/// Lays out the tracks of one file. Lengths are known once the next track's
/// INDEX 00 is seen; the last track of the file is sized by the caller.
fn layout_file(
    cue_file: &CueFile,
    file: FileId,
    origin: u32,
    postgap: &mut u32,
    tracks: &mut Vec<Track>,
) -> ImageResult<()> {
    let first_in_file = tracks.len();
    let mut gaps = 0u32;
    let mut previous_index01 = 0u32;

    for cue_track in &cue_file.tracks {
        let mode = cue_track.track_type.mode();
        let sector_size = mode.stored_sector_size() as u64;
        let index01 = cue_track
            .index(1)
            .ok_or(CueError::MissingIndex01(cue_track.number))?
            .to_lba();
        let index00 = cue_track.index(0).map_or(index01, Msf::to_lba);

        if tracks.len() > first_in_file {
            gaps += *postgap;
        }
        gaps += cue_track.pregap.map_or(0, Msf::to_lba);
        *postgap = cue_track.postgap.map_or(0, Msf::to_lba);

        let skip = match tracks[first_in_file..].last_mut() {
            Some(previous) => {
                if index00 <= previous_index01 {
                    return Err(ImageError::InvalidLayout(format!(
                        "track {} starts inside track {}",
                        cue_track.number, previous.number
                    )));
                }
                previous.length = index00 - previous_index01;
                debug!(
                    "Track {:02}: {} start {} length {} skip {}",
                    previous.number,
                    previous.mode.cue_name(),
                    previous.start,
                    previous.length,
                    previous.skip
                );

                previous.skip
                    + u64::from(previous.length) * previous.sector_size() as u64
                    + u64::from(index01 - index00) * sector_size
            }
            None => u64::from(index01) * sector_size,
        };

        let indices = cue_track
            .indices
            .iter()
            .filter(|index| index.number >= 1)
            .map(|index| TrackIndex {
                number: index.number,
                offset: index.position.to_lba() - index01,
            })
            .collect();

        tracks.push(Track {
            number: cue_track.number,
            flags: TrackFlags {
                data: !mode.is_audio(),
                copy_permitted: cue_track.has_flag(TrackFlag::Dcp),
                pre_emphasis: cue_track.has_flag(TrackFlag::Pre),
                four_channel: cue_track.has_flag(TrackFlag::FourChannel),
            },
            mode,
            start: origin + gaps + index01,
            length: 0,
            skip,
            file,
            indices,
            byte_swapped_audio: cue_file.file_type == FileType::Motorola && mode.is_audio(),
        });
        previous_index01 = index01;
    }

    Ok(())
}
