use crate::cd::sector::{append_cooked, append_raw};
use crate::cd::subchannel::SubchannelQ;
use crate::cd::{FRAME_SIZE, LEAD_IN_FRAMES, Mode2Form, Msf, RAW_SECTOR_SIZE, SectorEncoding};
use crate::image::Image;
use crate::image::error::{ImageError, ImageResult};
use crate::image::models::Location;
use log::{trace, warn};

impl Image {
    pub fn read_sector(&mut self, sector: u32, raw: bool) -> ImageResult<Vec<u8>> {
        self.read_sectors(sector, 1, raw)
    }

    /// Reads `count` consecutive sectors of one track with a single backing
    /// read. Nothing is returned unless the whole run lies inside the track.
    pub fn read_sectors(&mut self, sector: u32, count: u32, raw: bool) -> ImageResult<Vec<u8>> {
        let location = self.locate_for_read(sector, count)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let stored = self.read_stored(location, count)?;
        let track = &self.tracks[location.track_index];
        let sector_size = track.sector_size();
        let out_size = if raw {
            RAW_SECTOR_SIZE
        } else {
            track.mode.cooked_sector_size()
        };

        let mut out = Vec::with_capacity(out_size * count as usize);
        for (i, stored_sector) in stored.chunks_exact(sector_size).enumerate() {
            if raw {
                append_raw(track.mode, sector + i as u32, stored_sector, &mut out);
            } else {
                append_cooked(track.mode, stored_sector, &mut out);
            }
        }

        Ok(out)
    }

    pub fn read_sector_with_subchannel(&mut self, sector: u32) -> ImageResult<Vec<u8>> {
        let location = self.locate_for_read(sector, 1)?;
        let stored = self.read_stored(location, 1)?;
        let track = &self.tracks[location.track_index];

        let mut out = Vec::with_capacity(FRAME_SIZE);
        append_raw(track.mode, sector, &stored, &mut out);
        if track.mode.has_subcode() {
            out.extend_from_slice(&stored[RAW_SECTOR_SIZE..FRAME_SIZE]);
        } else {
            trace!("Synthesizing Q subchannel for sector {sector}");
            out.extend_from_slice(&self.subchannel_q(sector)?.to_interleaved());
        }

        Ok(out)
    }

    /// Q channel contents for `sector`, as a drive would report its current
    /// position.
    pub fn subchannel_q(&self, sector: u32) -> ImageResult<SubchannelQ> {
        let location = self.locate(sector)?;
        let track = &self.tracks[location.track_index];

        Ok(SubchannelQ {
            control: track.flags.control(),
            track: track.number,
            index: track.index_at(location.offset),
            relative: Msf::from_lba(location.offset),
            absolute: Msf::from_lba(sector + LEAD_IN_FRAMES),
        })
    }

    pub fn sector_encoding(&self, sector: u32) -> ImageResult<SectorEncoding> {
        let location = self.locate(sector)?;
        Ok(self.tracks[location.track_index].mode.into())
    }

    pub fn sector_size(&self, sector: u32) -> ImageResult<usize> {
        Ok(self.sector_encoding(sector)?.size)
    }

    pub fn is_mode2(&self, sector: u32) -> ImageResult<bool> {
        Ok(self.sector_encoding(sector)?.is_mode2)
    }

    pub fn mode2_form(&self, sector: u32) -> ImageResult<Option<Mode2Form>> {
        Ok(self.sector_encoding(sector)?.form)
    }

    fn locate_for_read(&self, sector: u32, count: u32) -> ImageResult<Location> {
        let lead_out = self.lead_out();
        if sector >= lead_out {
            return Err(ImageError::OutOfRange {
                sector,
                count,
                track: self.tracks.last().map_or(0, |track| track.number),
            });
        }

        let location = self.locate(sector)?;
        let track = &self.tracks[location.track_index];
        if u64::from(location.offset) + u64::from(count) > u64::from(track.length) {
            return Err(ImageError::OutOfRange {
                sector,
                count,
                track: track.number,
            });
        }

        Ok(location)
    }

    /// Stored bytes of `count` sectors, zero-padded where the track runs past
    /// the end of its file.
    fn read_stored(&mut self, location: Location, count: u32) -> ImageResult<Vec<u8>> {
        let track = &self.tracks[location.track_index];
        let file = &mut self.files[track.file.0];

        let sector_size = track.sector_size();
        let offset = track.byte_offset(location.offset);
        let wanted = sector_size * count as usize;
        let available = (file.length().saturating_sub(offset) as usize).min(wanted);

        trace!(
            "Reading {} sectors of track {} at byte {} of {}",
            count,
            track.number,
            offset,
            file.path().display()
        );

        let mut stored = vec![0u8; wanted];
        file.read_into(offset, &mut stored[..available])?;
        if available < wanted {
            warn!(
                "Zero-padding {} bytes past the end of {}",
                wanted - available,
                file.path().display()
            );
        }

        if track.byte_swapped_audio {
            for stored_sector in stored.chunks_exact_mut(sector_size) {
                for sample in stored_sector[..RAW_SECTOR_SIZE].chunks_exact_mut(2) {
                    sample.swap(0, 1);
                }
            }
        }

        Ok(stored)
    }
}
