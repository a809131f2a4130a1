use crate::storage::{StorageBackend, StorageFile};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

pub const DEFAULT_CLUSTER_SIZE: u64 = 64 * 1024;

/// The host filesystem. Files are presented as fixed-size clusters in
/// file order, so every chain step is free.
#[derive(Debug, Clone, Copy)]
pub struct HostFs {
    cluster_size: u64,
}

impl Default for HostFs {
    fn default() -> Self {
        Self {
            cluster_size: DEFAULT_CLUSTER_SIZE,
        }
    }
}

impl HostFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_size(cluster_size: u64) -> Self {
        Self {
            cluster_size: cluster_size.max(1),
        }
    }
}

impl StorageBackend for HostFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn StorageFile>> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Ok(Box::new(HostFile {
            reader: BufReader::with_capacity(self.cluster_size as usize, file),
            length,
            cluster_size: self.cluster_size,
            position: Some(0),
        }))
    }
}

#[derive(Debug)]
struct HostFile {
    reader: BufReader<File>,
    length: u64,
    cluster_size: u64,
    // None after a failed read, forcing a seek next time.
    position: Option<u64>,
}

impl StorageFile for HostFile {
    fn length(&self) -> u64 {
        self.length
    }

    fn cluster_size(&self) -> u64 {
        self.cluster_size
    }

    fn first_cluster(&self) -> u64 {
        0
    }

    fn next_cluster(&mut self, cluster: u64) -> io::Result<u64> {
        Ok(cluster + 1)
    }

    fn read_cluster(&mut self, cluster: u64, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let target = cluster * self.cluster_size + offset;

        // Only seek if the reader isn't already there; seeking drops the buffer.
        if self.position != Some(target) {
            self.reader.seek(SeekFrom::Start(target))?;
        }

        self.position = None;
        self.reader.read_exact(buf)?;
        self.position = Some(target + buf.len() as u64);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BackingFile, SeekCacheConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_back_file_contents() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 256) as u8).collect();
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&data).unwrap();
        temp.flush().unwrap();

        let fs = HostFs::with_cluster_size(1024);
        let mut file = BackingFile::open(&fs, temp.path(), SeekCacheConfig::default()).unwrap();

        assert_eq!(file.length(), 5000);
        assert_eq!(file.read(1000, 100).unwrap(), &data[1000..1100]);
        assert_eq!(file.read(1100, 3000).unwrap(), &data[1100..4100]);
        assert_eq!(file.read(0, 10).unwrap(), &data[..10]);
        assert_eq!(file.read(4990, 10).unwrap(), &data[4990..]);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostFs::new().open(&dir.path().join("nope.bin")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
