use clap::Parser;
use std::path::PathBuf;

/// Prints the track table of an image.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InfoCommand {
    /// Path to a .cue sheet or an .iso/.bin image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,
}

/// Dumps sectors as hex, or to a file.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ReadCommand {
    /// Path to a .cue sheet or an .iso/.bin image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// First sector to read
    #[arg(value_name = "LBA")]
    pub lba: u32,

    /// Number of sectors to read
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: u32,

    /// Read full 2352-byte sectors instead of user data
    #[arg(long, short = 'r', default_value_t = false)]
    pub raw: bool,

    /// Append 96 bytes of P-W subchannel to every raw sector
    #[arg(long, short = 's', default_value_t = false)]
    pub subchannel: bool,

    /// Write the sectors to this file instead of printing them
    #[arg(long, short = 'o', value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Reads every sector of an image and reports the ones that fail.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct VerifyCommand {
    /// Path to a .cue sheet or an .iso/.bin image
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Read raw sectors and check the EDC of Mode 1 data
    #[arg(long, short = 'r', default_value_t = false)]
    pub raw: bool,
}
