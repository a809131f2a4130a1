use crate::cd::Msf;
use crate::image::Image;
use crate::image::error::{ImageError, ImageResult};
use crate::image::models::{Location, TrackRange};

pub use crate::cd::msf::{lba_to_msf, msf_to_lba};

impl Image {
    /// Resolves an absolute sector to its track. Sectors in gaps between
    /// tracks and past the lead-out belong to no track.
    pub fn locate(&self, sector: u32) -> ImageResult<Location> {
        let following = self.tracks.partition_point(|track| track.start <= sector);
        let track_index = following.checked_sub(1).ok_or(ImageError::NotFound(sector))?;

        let track = &self.tracks[track_index];
        if !track.contains(sector) {
            return Err(ImageError::NotFound(sector));
        }

        Ok(Location {
            track_index,
            offset: sector - track.start,
        })
    }

    pub fn track_number_of(&self, sector: u32) -> ImageResult<u8> {
        let location = self.locate(sector)?;
        Ok(self.tracks[location.track_index].number)
    }

    pub fn lead_out(&self) -> u32 {
        self.tracks.last().map_or(0, |track| track.end())
    }

    pub fn track_range(&self) -> TrackRange<u32> {
        TrackRange {
            first: self.tracks.first().map_or(0, |track| track.number),
            last: self.tracks.last().map_or(0, |track| track.number),
            lead_out: self.lead_out(),
        }
    }

    pub fn audio_track_range_lba(&self) -> ImageResult<TrackRange<u32>> {
        let mut audio = self.tracks.iter().filter(|track| track.is_audio());
        let first = audio.next().ok_or(ImageError::NoAudioTrack)?;
        let last = audio.last().unwrap_or(first);

        Ok(TrackRange {
            first: first.number,
            last: last.number,
            lead_out: self.lead_out(),
        })
    }

    pub fn audio_track_range(&self) -> ImageResult<TrackRange<Msf>> {
        let range = self.audio_track_range_lba()?;
        Ok(TrackRange {
            first: range.first,
            last: range.last,
            lead_out: lba_to_msf(range.lead_out),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::image::error::ImageError;
    use crate::image::loader::ImageLoader;
    use crate::image::models::ImageOptions;
    use crate::storage::MemoryFs;

    fn mixed_fs() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.insert("mixed.bin", vec![0; 2352 * 1000]);
        fs.insert(
            "mixed.cue",
            b"FILE mixed.bin BINARY\n\
              TRACK 01 MODE1/2352\n INDEX 01 00:00:00\n\
              TRACK 02 AUDIO\n INDEX 00 00:04:00\n INDEX 01 00:06:00\n\
              TRACK 03 AUDIO\n INDEX 01 00:10:00\n"
                .to_vec(),
        );
        fs
    }

    #[test]
    fn gaps_and_lead_out_are_not_found() {
        let fs = mixed_fs();
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("mixed.cue")
            .unwrap();

        assert_eq!(image.track_number_of(0).unwrap(), 1);
        assert_eq!(image.track_number_of(299).unwrap(), 1);
        assert!(matches!(image.locate(300), Err(ImageError::NotFound(300))));
        assert!(matches!(image.locate(449), Err(ImageError::NotFound(449))));
        assert_eq!(image.track_number_of(450).unwrap(), 2);
        assert_eq!(image.track_number_of(750).unwrap(), 3);
        assert_eq!(image.lead_out(), 1000);
        assert!(image.locate(1000).is_err());
        assert!(image.locate(u32::MAX).is_err());
    }

    #[test]
    fn audio_range_covers_audio_tracks_only() {
        let fs = mixed_fs();
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("mixed.cue")
            .unwrap();

        let range = image.audio_track_range_lba().unwrap();
        assert_eq!((range.first, range.last, range.lead_out), (2, 3, 1000));
        let range = image.audio_track_range().unwrap();
        assert_eq!(range.lead_out.to_string(), "00:13:25");

        let all = image.track_range();
        assert_eq!((all.first, all.last, all.lead_out), (1, 3, 1000));
    }

    #[test]
    fn data_only_disc_has_no_audio_range() {
        let mut fs = MemoryFs::new();
        fs.insert("data.iso", vec![0; 2048 * 16]);
        let image = ImageLoader::new(&fs, ImageOptions::default())
            .load("data.iso")
            .unwrap();

        assert!(matches!(
            image.audio_track_range(),
            Err(ImageError::NoAudioTrack)
        ));
        assert_eq!(image.track_range().last, 1);
    }
}
