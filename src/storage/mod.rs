//! Byte-range access to the files an image is built from.
//!
//! Storage is modelled as a chain of clusters, the way FAT-like filesystems
//! lay files out: reaching byte `n` means walking the allocation chain from
//! the first cluster. [`BackingFile`] hides that walk behind a plain
//! `read(offset, count)` and keeps a small cache of chain checkpoints so
//! sequential and track-local reads don't restart from the beginning.

pub mod host;
pub mod memory;
pub mod seek_cache;

pub use host::HostFs;
pub use memory::MemoryFs;
pub use seek_cache::{Checkpoint, SeekCache, SeekCacheConfig};

use log::trace;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub trait StorageFile: Send {
    fn length(&self) -> u64;

    fn cluster_size(&self) -> u64;

    fn first_cluster(&self) -> u64;

    fn next_cluster(&mut self, cluster: u64) -> io::Result<u64>;

    /// Reads `buf.len()` bytes starting `offset` bytes into `cluster`.
    /// The range never crosses the end of the cluster.
    fn read_cluster(&mut self, cluster: u64, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

pub trait StorageBackend {
    fn open(&self, path: &Path) -> io::Result<Box<dyn StorageFile>>;
}

/// An open file plus its private seek cache. Closing is idempotent and also
/// happens on drop.
pub struct BackingFile {
    path: PathBuf,
    file: Option<Box<dyn StorageFile>>,
    length: u64,
    cluster_size: u64,
    cache: SeekCache,
}

impl fmt::Debug for BackingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .field("length", &self.length)
            .field("cluster_size", &self.cluster_size)
            .field("cache", &self.cache)
            .finish()
    }
}

impl BackingFile {
    pub fn open(
        backend: &dyn StorageBackend,
        path: impl AsRef<Path>,
        cache: SeekCacheConfig,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let file = backend.open(path)?;
        Ok(Self::new(file, path, cache))
    }

    pub fn new(file: Box<dyn StorageFile>, path: impl AsRef<Path>, cache: SeekCacheConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            length: file.length(),
            cluster_size: file.cluster_size().max(1),
            file: Some(file),
            cache: SeekCache::new(cache),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn cache(&self) -> &SeekCache {
        &self.cache
    }

    pub fn read(&mut self, offset: u64, count: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Fills `buf` from `offset`. Fails with `UnexpectedEof` if the range
    /// runs past the end of the file.
    pub fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is closed", self.path.display()),
            )
        })?;

        if buf.is_empty() {
            return Ok(());
        }

        let end = offset.checked_add(buf.len() as u64);
        if end.is_none_or(|end| end > self.length) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at {} is past the end of {} ({} bytes)",
                    buf.len(),
                    offset,
                    self.path.display(),
                    self.length
                ),
            ));
        }

        let cluster_size = self.cluster_size;
        let mut position = Checkpoint {
            index: offset / cluster_size,
            cluster: 0,
        };
        position.cluster = resolve(file.as_mut(), &mut self.cache, position.index)?;

        let mut within = offset % cluster_size;
        let mut done = 0usize;
        loop {
            let chunk = ((cluster_size - within) as usize).min(buf.len() - done);
            file.read_cluster(position.cluster, within, &mut buf[done..done + chunk])?;
            done += chunk;
            if done == buf.len() {
                break;
            }

            position.cluster = file.next_cluster(position.cluster)?;
            position.index += 1;
            within = 0;
            if self.cache.is_boundary(position.index) {
                self.cache.record(position);
            }
        }

        self.cache.record(position);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.file.take().is_some() {
            trace!("Closed {}", self.path.display());
            self.cache.clear();
        }
    }
}

impl Drop for BackingFile {
    fn drop(&mut self) {
        self.close();
    }
}

/// Walks to logical cluster `target`, starting from the nearest cached
/// checkpoint or from the head of the chain.
fn resolve(file: &mut dyn StorageFile, cache: &mut SeekCache, target: u64) -> io::Result<u64> {
    let mut position = cache.nearest(target).unwrap_or(Checkpoint {
        index: 0,
        cluster: file.first_cluster(),
    });

    if position.index != target {
        trace!("Walking cluster chain {} -> {}", position.index, target);
    }

    while position.index < target {
        position.cluster = file.next_cluster(position.cluster)?;
        position.index += 1;
        if cache.is_boundary(position.index) {
            cache.record(position);
        }
    }

    Ok(position.cluster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn memory_fs(data: &[u8], cluster_size: u64) -> MemoryFs {
        let mut fs = MemoryFs::with_cluster_size(cluster_size);
        fs.insert("disc.bin", data.to_vec());
        fs
    }

    #[test]
    fn reads_ranges_spanning_clusters() {
        let data = sample_data(10_000);
        let fs = memory_fs(&data, 512);
        let mut file = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();

        assert_eq!(file.length(), 10_000);
        assert_eq!(file.read(0, 10).unwrap(), &data[..10]);
        assert_eq!(file.read(500, 1000).unwrap(), &data[500..1500]);
        assert_eq!(file.read(9_990, 10).unwrap(), &data[9_990..]);
        assert!(file.read(0, 0).unwrap().is_empty());
    }

    #[test]
    fn reading_past_the_end_fails() {
        let fs = memory_fs(&sample_data(1000), 256);
        let mut file = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();

        let err = file.read(990, 20).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = file.read(u64::MAX, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn cache_never_changes_results() {
        let data = sample_data(64 * 1024);
        let fs = memory_fs(&data, 512);
        let mut cached = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();
        let mut uncached =
            BackingFile::open(&fs, "disc.bin", SeekCacheConfig::disabled()).unwrap();

        let requests = [
            (0u64, 2048usize),
            (2048, 2048),
            (60_000, 3000),
            (100, 7),
            (30_000, 4096),
            (30_000, 4096),
            (4096, 60_000),
            (65_535, 1),
        ];
        for (offset, count) in requests {
            let a = cached.read(offset, count).unwrap();
            let b = uncached.read(offset, count).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, &data[offset as usize..offset as usize + count]);
        }
        assert!(uncached.cache().is_empty());
        assert!(!cached.cache().is_empty());
    }

    #[test]
    fn sequential_reads_do_not_rewalk_the_chain() {
        let data = sample_data(256 * 1024);
        let fs = memory_fs(&data, 512);

        let mut uncached =
            BackingFile::open(&fs, "disc.bin", SeekCacheConfig::disabled()).unwrap();
        fs.reset_walk_steps();
        for sector in 0..100u64 {
            uncached.read(sector * 2048, 2048).unwrap();
        }
        let uncached_steps = fs.walk_steps();

        let mut cached = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();
        fs.reset_walk_steps();
        for sector in 0..100u64 {
            cached.read(sector * 2048, 2048).unwrap();
        }
        let cached_steps = fs.walk_steps();

        // Each 2048-byte sector spans 4 clusters; 3 of the steps are unavoidable.
        assert!(cached_steps <= 100 * 4);
        assert!(uncached_steps > cached_steps * 10);
    }

    #[test]
    fn close_is_idempotent_and_blocks_reads() {
        let fs = memory_fs(&sample_data(100), 64);
        let mut file = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();
        assert_eq!(fs.open_handles(), 1);

        file.close();
        file.close();
        assert!(!file.is_open());
        assert_eq!(fs.open_handles(), 0);

        let err = file.read(0, 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        drop(file);
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn drop_closes_the_handle() {
        let fs = memory_fs(&sample_data(100), 64);
        {
            let _file = BackingFile::open(&fs, "disc.bin", SeekCacheConfig::default()).unwrap();
            assert_eq!(fs.open_handles(), 1);
        }
        assert_eq!(fs.open_handles(), 0);
    }
}
