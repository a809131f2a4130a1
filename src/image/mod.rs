//! A CD-ROM image as seen by a disc controller: a track table over one or
//! more backing files, addressed by absolute sector.

use crate::image::error::ImageResult;
use crate::image::loader::ImageLoader;
use crate::image::models::{FileId, ImageOptions, Track};
use crate::storage::{BackingFile, HostFs};
use std::path::Path;

mod classifier;
pub mod error;
pub mod loader;
mod locator;
pub mod models;
mod reader;

pub use locator::{lba_to_msf, msf_to_lba};

#[derive(Debug)]
pub struct Image {
    files: Vec<BackingFile>,
    tracks: Vec<Track>,
}

impl Image {
    pub(crate) fn new(files: Vec<BackingFile>, tracks: Vec<Track>) -> Self {
        Self { files, tracks }
    }

    pub fn load_iso(path: impl AsRef<Path>) -> ImageResult<Self> {
        ImageLoader::new(&HostFs::default(), ImageOptions::default()).load_iso(path)
    }

    pub fn load_cue(path: impl AsRef<Path>) -> ImageResult<Self> {
        ImageLoader::new(&HostFs::default(), ImageOptions::default()).load_cue(path)
    }

    pub fn files(&self) -> &[BackingFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &BackingFile {
        &self.files[id.0]
    }

    /// Closes every backing file. Reads fail afterwards; calling it again is
    /// harmless.
    pub fn close(&mut self) {
        for file in &mut self.files {
            file.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cd::Msf;
    use crate::image::error::ImageError;
    use crate::storage::MemoryFs;
    use std::io::Write;

    fn data_sector(lba: u32) -> Vec<u8> {
        (0..2048u32).map(|i| ((lba * 7 + i) % 256) as u8).collect()
    }

    fn two_track_fs() -> MemoryFs {
        let mut fs = MemoryFs::new();
        let data: Vec<u8> = (0..100).flat_map(data_sector).collect();
        fs.insert("game/data.bin", data);
        fs.insert("game/audio.bin", vec![0x55; 2352 * 50]);
        fs.insert(
            "game/game.cue",
            b"FILE \"data.bin\" BINARY\n\
              TRACK 01 MODE1/2048\n INDEX 01 00:00:00\n\
              FILE \"audio.bin\" BINARY\n\
              TRACK 02 AUDIO\n INDEX 01 00:00:00\n"
                .to_vec(),
        );
        fs
    }

    #[test]
    fn two_track_disc() {
        let fs = two_track_fs();
        let mut image = ImageLoader::new(&fs, ImageOptions::default())
            .load("game/game.cue")
            .unwrap();

        assert_eq!(image.locate(99).unwrap().track_index, 0);
        assert_eq!(image.locate(99).unwrap().offset, 99);
        assert_eq!(image.locate(100).unwrap().track_index, 1);
        assert_eq!(image.locate(100).unwrap().offset, 0);

        let (start, attr) = image.audio_track_info(2).unwrap();
        assert_eq!(start, Msf::new(0, 1, 25).unwrap());
        assert_eq!(attr, 0x10);
        assert_eq!(image.audio_track_info_lba(1).unwrap(), (0, 0x14));

        let run = image.read_sectors(50, 10, false).unwrap();
        assert_eq!(run.len(), 10 * 2048);
        assert_eq!(&run[..2048], data_sector(50).as_slice());
        assert_eq!(&run[9 * 2048..], data_sector(59).as_slice());

        let err = image.read_sectors(95, 10, false).unwrap_err();
        assert!(matches!(
            err,
            ImageError::OutOfRange {
                sector: 95,
                count: 10,
                track: 1
            }
        ));

        assert!(image.has_data_track());
        assert!(image.has_audio_track());
        assert_eq!(image.lead_out(), 150);
    }

    #[test]
    fn every_sector_locates_to_its_track() {
        let fs = two_track_fs();
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("game/game.cue")
            .unwrap();

        for track in image.tracks() {
            for sector in track.start..track.end() {
                let location = image.locate(sector).unwrap();
                let found = &image.tracks()[location.track_index];
                assert_eq!(found.number, track.number);
                assert_eq!(found.start + location.offset, sector);
            }
        }
        assert!(image.locate(image.lead_out()).is_err());
    }

    #[test]
    fn close_releases_every_file_once() {
        let fs = two_track_fs();
        let mut image = ImageLoader::new(&fs, ImageOptions::default())
            .load("game/game.cue")
            .unwrap();
        assert_eq!(fs.open_handles(), 2);

        image.close();
        image.close();
        assert_eq!(fs.open_handles(), 0);
        assert!(image.files().iter().all(|file| !file.is_open()));
        assert!(matches!(
            image.read_sector(0, false),
            Err(ImageError::IoError(_))
        ));

        drop(image);
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn dropping_the_image_closes_its_files() {
        let fs = two_track_fs();
        {
            let _image = ImageLoader::new(&fs, ImageOptions::default())
                .load("game/game.cue")
                .unwrap();
            assert_eq!(fs.open_handles(), 2);
        }
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn storage_faults_surface_as_io_errors() {
        let fs = two_track_fs();
        let mut image = ImageLoader::new(&fs, ImageOptions::default())
            .load("game/game.cue")
            .unwrap();

        fs.set_fail_reads(true);
        assert!(matches!(
            image.read_sector(10, true),
            Err(ImageError::IoError(_))
        ));
        fs.set_fail_reads(false);
        assert_eq!(image.read_sector(10, false).unwrap(), data_sector(10));
    }

    #[test]
    fn loads_from_the_host_filesystem() {
        let dir = tempfile::tempdir().unwrap();

        let mut bin = std::fs::File::create(dir.path().join("track 1.bin")).unwrap();
        for lba in 0..20 {
            bin.write_all(&crate::cd::sector::encode_mode1(lba, &data_sector(lba)))
                .unwrap();
        }
        drop(bin);

        let cue_path = dir.path().join("disc.cue");
        std::fs::write(
            &cue_path,
            "FILE \"track 1.bin\" BINARY\r\n  TRACK 01 MODE1/2352\r\n    INDEX 01 00:00:00\r\n",
        )
        .unwrap();

        let mut image = Image::load_cue(&cue_path).unwrap();
        assert_eq!(image.tracks()[0].length, 20);
        assert_eq!(image.read_sector(7, false).unwrap(), data_sector(7));

        let iso_path = dir.path().join("plain.iso");
        std::fs::write(&iso_path, (0..4).flat_map(data_sector).collect::<Vec<u8>>()).unwrap();
        let mut iso = Image::load_iso(&iso_path).unwrap();
        assert_eq!(iso.lead_out(), 4);
        assert_eq!(iso.read_sector(3, false).unwrap(), data_sector(3));

        let err = Image::load_cue(dir.path().join("missing.cue")).unwrap_err();
        assert!(matches!(err, ImageError::MissingFile { .. }));
    }
}
