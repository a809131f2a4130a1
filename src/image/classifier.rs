use crate::cd::Msf;
use crate::image::Image;
use crate::image::error::{ImageError, ImageResult};
use crate::image::models::Track;

impl Image {
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, number: u8) -> ImageResult<&Track> {
        self.tracks
            .iter()
            .find(|track| track.number == number)
            .ok_or(ImageError::TrackNotFound(number))
    }

    pub fn has_data_track(&self) -> bool {
        self.tracks.iter().any(|track| track.flags.data)
    }

    pub fn has_audio_track(&self) -> bool {
        self.tracks.iter().any(|track| !track.flags.data)
    }

    pub fn audio_track_info(&self, number: u8) -> ImageResult<(Msf, u8)> {
        let (start, attr) = self.audio_track_info_lba(number)?;
        Ok((Msf::from_lba(start), attr))
    }

    pub fn audio_track_info_lba(&self, number: u8) -> ImageResult<(u32, u8)> {
        let track = self.track(number)?;
        Ok((track.start, track.flags.attr()))
    }
}

#[cfg(test)]
mod tests {
    use crate::image::error::ImageError;
    use crate::image::loader::ImageLoader;
    use crate::image::models::ImageOptions;
    use crate::storage::MemoryFs;

    #[test]
    fn classification_follows_track_attributes() {
        let mut fs = MemoryFs::new();
        fs.insert("cd.bin", vec![0; 2352 * 400]);
        fs.insert(
            "cd.cue",
            b"FILE cd.bin BINARY\n\
              TRACK 01 AUDIO\n FLAGS PRE 4CH\n INDEX 01 00:00:00\n\
              TRACK 02 AUDIO\n INDEX 01 00:02:00\n"
                .to_vec(),
        );
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("cd.cue")
            .unwrap();

        assert!(image.has_audio_track());
        assert!(!image.has_data_track());
        assert_eq!(image.audio_track_info_lba(1).unwrap(), (0, 0x19));
        assert_eq!(image.audio_track_info_lba(2).unwrap(), (150, 0x10));
        assert_eq!(image.audio_track_info(2).unwrap().0.to_string(), "00:02:00");
        assert!(matches!(
            image.audio_track_info(3),
            Err(ImageError::TrackNotFound(3))
        ));

        for track in image.tracks() {
            let data = track.flags.attr() == 0x14;
            assert_eq!(data, !track.is_audio());
        }
    }

    #[test]
    fn iso_is_a_single_data_track() {
        let mut fs = MemoryFs::new();
        fs.insert("disc.iso", vec![0; 2048 * 32]);
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("disc.iso")
            .unwrap();

        assert!(image.has_data_track());
        assert!(!image.has_audio_track());
        assert_eq!(image.track(1).unwrap().flags.attr(), 0x14);
        assert_eq!(image.tracks().len(), 1);
    }
}
