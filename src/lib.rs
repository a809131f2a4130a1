//! CD-ROM image backend: loads CUE sheets and ISO images into a track table
//! and serves sectors the way a disc controller expects them.

pub mod cd;
pub mod cue;
pub mod image;
pub mod storage;

pub use cd::{Msf, SectorEncoding, TrackMode};
pub use image::Image;
pub use image::error::{ImageError, ImageResult};
pub use image::loader::ImageLoader;
pub use image::models::{ImageOptions, Location, Track, TrackFlags, TrackRange};
pub use storage::{HostFs, MemoryFs, SeekCacheConfig, StorageBackend, StorageFile};
