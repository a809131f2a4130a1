use crate::cd::TrackMode;
use crate::cd::subchannel::{
    ADR_POSITION, CONTROL_COPY_PERMITTED, CONTROL_DATA, CONTROL_FOUR_CHANNEL, CONTROL_PRE_EMPHASIS,
};
use crate::storage::SeekCacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub(crate) usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFlags {
    pub data: bool,
    pub copy_permitted: bool,
    pub pre_emphasis: bool,
    pub four_channel: bool,
}

impl TrackFlags {
    pub fn control(self) -> u8 {
        let mut control = 0;
        if self.data {
            control |= CONTROL_DATA;
        }
        if self.copy_permitted {
            control |= CONTROL_COPY_PERMITTED;
        }
        if self.pre_emphasis {
            control |= CONTROL_PRE_EMPHASIS;
        }
        if self.four_channel {
            control |= CONTROL_FOUR_CHANNEL;
        }
        control
    }

    pub fn attr(self) -> u8 {
        (ADR_POSITION << 4) | self.control()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackIndex {
    pub number: u8,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub number: u8,
    pub flags: TrackFlags,
    pub mode: TrackMode,
    pub start: u32,
    pub length: u32,
    /// Byte offset of the first addressable sector in the backing file.
    pub skip: u64,
    pub file: FileId,
    /// INDEX 01 and up; INDEX 01 is always first, at offset 0.
    pub indices: Vec<TrackIndex>,
    /// 16-bit audio samples are stored big-endian.
    pub byte_swapped_audio: bool,
}

impl Track {
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn contains(&self, sector: u32) -> bool {
        sector >= self.start && sector < self.end()
    }

    pub fn is_audio(&self) -> bool {
        self.mode.is_audio()
    }

    pub fn sector_size(&self) -> usize {
        self.mode.stored_sector_size()
    }

    /// Byte position in the backing file of the sector `offset` sectors into
    /// the track.
    pub fn byte_offset(&self, offset: u32) -> u64 {
        self.skip + u64::from(offset) * self.sector_size() as u64
    }

    pub fn index_at(&self, offset: u32) -> u8 {
        self.indices
            .iter()
            .take_while(|index| index.offset <= offset)
            .last()
            .map_or(1, |index| index.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Position in the track table, not the track number.
    pub track_index: usize,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRange<T> {
    pub first: u8,
    pub last: u8,
    pub lead_out: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOptions {
    pub seek_cache: SeekCacheConfig,
}
