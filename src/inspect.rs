use crate::commands::image::{InfoCommand, ReadCommand, VerifyCommand};
use anyhow::{Result, bail};
use byteorder::{ByteOrder, LittleEndian};
use cdrom_image::cd::ecc::edc;
use cdrom_image::cd::sector::{MODE1_EDC_OFFSET, header_mode};
use cdrom_image::{HostFs, Image, ImageLoader, ImageOptions, Msf};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::Path;

fn open(path: &Path, backend: HostFs, options: ImageOptions) -> Result<Image> {
    let image = ImageLoader::new(&backend, options).load(path)?;
    debug!(
        "Opened {} with {} tracks",
        path.display(),
        image.tracks().len()
    );
    Ok(image)
}

pub fn info(cmd: &InfoCommand, backend: HostFs, options: ImageOptions) -> Result<()> {
    let image = open(&cmd.image, backend, options)?;

    println!("{}", cmd.image.display());
    println!("Track  Mode         Start     LBA       Length    Attr");
    for track in image.tracks() {
        println!(
            "{:>5}  {:<11}  {}  {:<8}  {:<8}  0x{:02X}",
            track.number,
            track.mode.cue_name(),
            Msf::from_lba(track.start),
            track.start,
            track.length,
            track.flags.attr()
        );
    }

    let range = image.track_range();
    println!(
        "Lead-out: {} (LBA {})",
        Msf::from_lba(range.lead_out),
        range.lead_out
    );
    println!(
        "Data track: {}, audio track: {}",
        yes_no(image.has_data_track()),
        yes_no(image.has_audio_track())
    );
    if let Ok(audio) = image.audio_track_range() {
        println!("Audio tracks: {:02}-{:02}", audio.first, audio.last);
    }

    Ok(())
}

pub fn read(cmd: &ReadCommand, backend: HostFs, options: ImageOptions) -> Result<()> {
    let mut image = open(&cmd.image, backend, options)?;

    let data = if cmd.subchannel {
        let mut data = Vec::new();
        for sector in cmd.lba..cmd.lba.saturating_add(cmd.count) {
            data.extend_from_slice(&image.read_sector_with_subchannel(sector)?);
        }
        data
    } else {
        image.read_sectors(cmd.lba, cmd.count, cmd.raw)?
    };

    match &cmd.output {
        Some(output) => {
            std::fs::write(output, &data)?;
            info!("Wrote {} bytes to {}", data.len(), output.display());
        }
        None => {
            for (row, chunk) in data.chunks(16).enumerate() {
                println!("{:08x}  {:<32}  {}", row * 16, hex::encode(chunk), printable(chunk));
            }
        }
    }

    Ok(())
}

pub fn verify(
    cmd: &VerifyCommand,
    backend: HostFs,
    options: ImageOptions,
    multi: &MultiProgress,
) -> Result<()> {
    let mut image = open(&cmd.image, backend, options)?;
    let tracks = image.tracks().to_vec();
    let total: u64 = tracks.iter().map(|track| u64::from(track.length)).sum();

    let pb = multi.add(ProgressBar::new(total));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:40.cyan/blue}] {pos}/{len} sectors ({eta})")?
            .progress_chars("=> "),
    );

    let mut failures = 0u64;
    for track in &tracks {
        pb.set_message(format!("track {:02}", track.number));
        for sector in track.start..track.end() {
            match image.read_sector(sector, cmd.raw) {
                Ok(data) if cmd.raw && !edc_matches(&data) => {
                    warn!("Sector {sector} (track {:02}): EDC mismatch", track.number);
                    failures += 1;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("Sector {sector} (track {:02}): {err}", track.number);
                    failures += 1;
                }
            }
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    for file in image.files() {
        let (hits, misses) = file.cache().stats();
        debug!(
            "{}: seek cache {} hits, {} misses",
            file.path().display(),
            hits,
            misses
        );
    }

    if failures > 0 {
        bail!("{failures} of {total} sectors failed verification");
    }

    info!("All {total} sectors of {} verified", cmd.image.display());
    Ok(())
}

/// Only Mode 1 sectors carry an EDC over a fixed range; anything else passes.
fn edc_matches(raw: &[u8]) -> bool {
    if header_mode(raw) != Some(1) {
        return true;
    }
    let stored = LittleEndian::read_u32(&raw[MODE1_EDC_OFFSET..MODE1_EDC_OFFSET + 4]);
    stored == edc(&raw[..MODE1_EDC_OFFSET])
}

fn printable(chunk: &[u8]) -> String {
    chunk
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
