use crate::storage::{StorageBackend, StorageFile};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// In-memory storage whose clusters are chained back to front, so reaching
/// a cluster costs one step per preceding cluster, like a FAT chain.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    files: HashMap<PathBuf, Arc<Vec<u8>>>,
    cluster_size: u64,
    open_handles: Arc<AtomicUsize>,
    walk_steps: Arc<AtomicU64>,
    fail_reads: Arc<AtomicBool>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::with_cluster_size(4096)
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_size(cluster_size: u64) -> Self {
        Self {
            files: HashMap::new(),
            cluster_size: cluster_size.max(1),
            open_handles: Arc::new(AtomicUsize::new(0)),
            walk_steps: Arc::new(AtomicU64::new(0)),
            fail_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, data: Vec<u8>) {
        self.files.insert(path.as_ref().to_path_buf(), Arc::new(data));
    }

    /// Handles opened through this backend (or its clones) and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    pub fn walk_steps(&self) -> u64 {
        self.walk_steps.load(Ordering::SeqCst)
    }

    pub fn reset_walk_steps(&self) {
        self.walk_steps.store(0, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for MemoryFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn StorageFile>> {
        let data = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })?;

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        let clusters = (data.len() as u64).div_ceil(self.cluster_size);
        Ok(Box::new(MemoryFile {
            data,
            clusters,
            cluster_size: self.cluster_size,
            open_handles: Arc::clone(&self.open_handles),
            walk_steps: Arc::clone(&self.walk_steps),
            fail_reads: Arc::clone(&self.fail_reads),
        }))
    }
}

#[derive(Debug)]
struct MemoryFile {
    data: Arc<Vec<u8>>,
    clusters: u64,
    cluster_size: u64,
    open_handles: Arc<AtomicUsize>,
    walk_steps: Arc<AtomicU64>,
    fail_reads: Arc<AtomicBool>,
}

impl MemoryFile {
    // Logical cluster i lives in physical cluster (clusters - 1 - i).
    fn physical(&self, logical: u64) -> u64 {
        self.clusters.saturating_sub(1) - logical
    }

    fn logical(&self, physical: u64) -> io::Result<u64> {
        if physical >= self.clusters.max(1) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cluster {physical} is not part of this file"),
            ));
        }
        Ok(self.clusters.saturating_sub(1) - physical)
    }
}

impl StorageFile for MemoryFile {
    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn cluster_size(&self) -> u64 {
        self.cluster_size
    }

    fn first_cluster(&self) -> u64 {
        self.physical(0)
    }

    fn next_cluster(&mut self, cluster: u64) -> io::Result<u64> {
        self.walk_steps.fetch_add(1, Ordering::SeqCst);
        let next = self.logical(cluster)? + 1;
        if next >= self.clusters {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "end of cluster chain",
            ));
        }
        Ok(self.physical(next))
    }

    fn read_cluster(&mut self, cluster: u64, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::other("simulated storage fault"));
        }

        let start = (self.logical(cluster)? * self.cluster_size + offset) as usize;
        let end = start + buf.len();
        if offset + buf.len() as u64 > self.cluster_size || end > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read crosses the end of the cluster",
            ));
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_visits_every_cluster_once() {
        let mut fs = MemoryFs::with_cluster_size(4);
        fs.insert("a", (0..16).collect());
        let mut file = fs.open(Path::new("a")).unwrap();

        let mut cluster = file.first_cluster();
        let mut collected = Vec::new();
        for i in 0..4 {
            let mut buf = [0u8; 4];
            file.read_cluster(cluster, 0, &mut buf).unwrap();
            collected.extend_from_slice(&buf);
            if i < 3 {
                cluster = file.next_cluster(cluster).unwrap();
            }
        }

        assert_eq!(collected, (0..16).collect::<Vec<u8>>());
        assert_eq!(fs.walk_steps(), 3);
        assert!(file.next_cluster(cluster).is_err());
    }

    #[test]
    fn tracks_open_handles_across_clones() {
        let mut fs = MemoryFs::new();
        fs.insert("a", vec![0; 10]);
        let clone = fs.clone();

        let first = clone.open(Path::new("a")).unwrap();
        let second = fs.open(Path::new("a")).unwrap();
        assert_eq!(fs.open_handles(), 2);

        drop(first);
        drop(second);
        assert_eq!(fs.open_handles(), 0);
        assert_eq!(
            fs.open(Path::new("b")).err().unwrap().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn simulated_faults_fail_reads() {
        let mut fs = MemoryFs::new();
        fs.insert("a", vec![1; 10]);
        let mut file = fs.open(Path::new("a")).unwrap();

        let first = file.first_cluster();
        fs.set_fail_reads(true);
        let mut buf = [0u8; 2];
        assert!(file.read_cluster(first, 0, &mut buf).is_err());
        fs.set_fail_reads(false);
        file.read_cluster(first, 0, &mut buf).unwrap();
        assert_eq!(buf, [1, 1]);
    }
}
