use crate::commands::image::{InfoCommand, ReadCommand, VerifyCommand};
use cdrom_image::storage::host::DEFAULT_CLUSTER_SIZE;
use cdrom_image::storage::seek_cache::DEFAULT_SEEK_CACHE_CAPACITY;
use cdrom_image::{HostFs, ImageOptions, SeekCacheConfig};
use clap::{Parser, Subcommand};

pub mod image;

/// CLI for inspecting and verifying CD-ROM images (CUE/BIN and ISO).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Number of cluster checkpoints kept per backing file; 0 disables the seek cache
    #[arg(long, global = true, value_name = "ENTRIES", default_value_t = DEFAULT_SEEK_CACHE_CAPACITY)]
    pub seek_cache: usize,

    /// Cluster size used when walking backing files
    #[arg(long, global = true, value_name = "BYTES", default_value_t = DEFAULT_CLUSTER_SIZE)]
    pub cluster_size: u64,
}

impl Cli {
    pub fn backend(&self) -> HostFs {
        HostFs::with_cluster_size(self.cluster_size)
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            seek_cache: SeekCacheConfig {
                capacity: self.seek_cache,
                ..SeekCacheConfig::default()
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Info(InfoCommand),
    Read(ReadCommand),
    Verify(VerifyCommand),
}
