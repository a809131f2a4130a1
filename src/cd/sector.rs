//! Conversion between the stored layout of a sector and the raw (2352) or
//! cooked (user data) form a controller asks for.

use crate::cd::ecc::{edc, write_ecc};
use crate::cd::{
    COOKED_SECTOR_SIZE, LEAD_IN_FRAMES, MODE2_FORM2_DATA_SIZE, MODE2_SECTOR_SIZE, Mode2Form, Msf,
    RAW_SECTOR_SIZE, SYNC_PATTERN, TrackMode,
};
use byteorder::{ByteOrder, LittleEndian};

pub const HEADER_OFFSET: usize = 12;
pub const MODE1_DATA_OFFSET: usize = 16;
pub const MODE2_SUBHEADER_OFFSET: usize = 16;
/// 12 (sync) + 4 (header) + 8 (subheader).
pub const MODE2_DATA_OFFSET: usize = 24;
const SUBHEADER_SIZE: usize = 8;

pub const MODE1_EDC_OFFSET: usize = MODE1_DATA_OFFSET + COOKED_SECTOR_SIZE;
const MODE2_FORM1_EDC_OFFSET: usize = MODE2_DATA_OFFSET + COOKED_SECTOR_SIZE;
const MODE2_FORM2_EDC_OFFSET: usize = MODE2_DATA_OFFSET + MODE2_FORM2_DATA_SIZE;

const SUBMODE_DATA: u8 = 0x08;
const SUBMODE_FORM2: u8 = 0x20;

/// Writes sync and the BCD address header for `lba`. The header carries the
/// physical address, which sits two seconds after LBA 0.
pub fn write_header(sector: &mut [u8], lba: u32, mode: u8) {
    sector[..HEADER_OFFSET].copy_from_slice(&SYNC_PATTERN);
    let address = Msf::from_lba(lba + LEAD_IN_FRAMES).to_bcd();
    sector[HEADER_OFFSET..HEADER_OFFSET + 3].copy_from_slice(&address);
    sector[HEADER_OFFSET + 3] = mode;
}

pub fn header_mode(raw: &[u8]) -> Option<u8> {
    if raw.len() < MODE1_DATA_OFFSET || raw[..HEADER_OFFSET] != SYNC_PATTERN {
        return None;
    }
    Some(raw[HEADER_OFFSET + 3])
}

pub fn header_lba(raw: &[u8]) -> Option<u32> {
    header_mode(raw)?;
    let msf = Msf::from_bcd([raw[12], raw[13], raw[14]])?;
    msf.to_lba().checked_sub(LEAD_IN_FRAMES)
}

fn write_subheader(sector: &mut [u8], form: Mode2Form) {
    let submode = match form {
        Mode2Form::Form1 => SUBMODE_DATA,
        Mode2Form::Form2 => SUBMODE_DATA | SUBMODE_FORM2,
    };
    // file, channel, submode, coding info; stored twice
    let subheader = [0, 0, submode, 0];
    sector[MODE2_SUBHEADER_OFFSET..MODE2_SUBHEADER_OFFSET + 4].copy_from_slice(&subheader);
    sector[MODE2_SUBHEADER_OFFSET + 4..MODE2_DATA_OFFSET].copy_from_slice(&subheader);
}

pub fn encode_mode1(lba: u32, data: &[u8]) -> [u8; RAW_SECTOR_SIZE] {
    let mut sector = [0u8; RAW_SECTOR_SIZE];
    write_header(&mut sector, lba, 1);
    sector[MODE1_DATA_OFFSET..MODE1_EDC_OFFSET].copy_from_slice(&data[..COOKED_SECTOR_SIZE]);

    let crc = edc(&sector[..MODE1_EDC_OFFSET]);
    LittleEndian::write_u32(&mut sector[MODE1_EDC_OFFSET..MODE1_EDC_OFFSET + 4], crc);
    write_ecc(&mut sector);
    sector
}

/// Prefixes a stored 2336-byte Mode 2 area (subheader first) with sync and
/// header. The area already carries its own EDC/ECC.
pub fn encode_mode2_area(lba: u32, area: &[u8]) -> [u8; RAW_SECTOR_SIZE] {
    let mut sector = [0u8; RAW_SECTOR_SIZE];
    write_header(&mut sector, lba, 2);
    sector[MODE2_SUBHEADER_OFFSET..].copy_from_slice(&area[..MODE2_SECTOR_SIZE]);
    sector
}

pub fn encode_mode2(lba: u32, form: Mode2Form, data: &[u8]) -> [u8; RAW_SECTOR_SIZE] {
    let mut sector = [0u8; RAW_SECTOR_SIZE];
    write_header(&mut sector, lba, 2);
    write_subheader(&mut sector, form);

    match form {
        Mode2Form::Form1 => {
            sector[MODE2_DATA_OFFSET..MODE2_FORM1_EDC_OFFSET]
                .copy_from_slice(&data[..COOKED_SECTOR_SIZE]);
            let crc = edc(&sector[MODE2_SUBHEADER_OFFSET..MODE2_FORM1_EDC_OFFSET]);
            LittleEndian::write_u32(
                &mut sector[MODE2_FORM1_EDC_OFFSET..MODE2_FORM1_EDC_OFFSET + 4],
                crc,
            );

            // The address is excluded from Mode 2 parity.
            let header: [u8; 4] = [sector[12], sector[13], sector[14], sector[15]];
            sector[HEADER_OFFSET..MODE1_DATA_OFFSET].fill(0);
            write_ecc(&mut sector);
            sector[HEADER_OFFSET..MODE1_DATA_OFFSET].copy_from_slice(&header);
        }
        Mode2Form::Form2 => {
            sector[MODE2_DATA_OFFSET..MODE2_FORM2_EDC_OFFSET]
                .copy_from_slice(&data[..MODE2_FORM2_DATA_SIZE]);
            let crc = edc(&sector[MODE2_SUBHEADER_OFFSET..MODE2_FORM2_EDC_OFFSET]);
            LittleEndian::write_u32(
                &mut sector[MODE2_FORM2_EDC_OFFSET..MODE2_FORM2_EDC_OFFSET + 4],
                crc,
            );
        }
    }

    sector
}

pub fn append_raw(mode: TrackMode, lba: u32, stored: &[u8], out: &mut Vec<u8>) {
    match mode {
        TrackMode::Audio { .. } | TrackMode::Mode1Raw { .. } | TrackMode::Mode2Raw { .. } => {
            out.extend_from_slice(&stored[..RAW_SECTOR_SIZE])
        }
        TrackMode::Mode1Cooked => out.extend_from_slice(&encode_mode1(lba, stored)),
        TrackMode::Mode2Cooked(form) => out.extend_from_slice(&encode_mode2(lba, form, stored)),
        TrackMode::Mode2Xa(_) => out.extend_from_slice(&encode_mode2_area(lba, stored)),
    }
}

pub fn append_cooked(mode: TrackMode, stored: &[u8], out: &mut Vec<u8>) {
    let payload = match mode {
        TrackMode::Audio { .. } => &stored[..RAW_SECTOR_SIZE],
        TrackMode::Mode1Cooked | TrackMode::Mode2Cooked(_) => stored,
        TrackMode::Mode1Raw { .. } => &stored[MODE1_DATA_OFFSET..MODE1_EDC_OFFSET],
        TrackMode::Mode2Xa(form) => &stored[SUBHEADER_SIZE..SUBHEADER_SIZE + form.payload_size()],
        TrackMode::Mode2Raw { form, .. } => {
            &stored[MODE2_DATA_OFFSET..MODE2_DATA_OFFSET + form.payload_size()]
        }
    };
    out.extend_from_slice(payload);
}

pub fn payload_offset(mode: TrackMode) -> usize {
    match mode {
        TrackMode::Audio { .. } => 0,
        TrackMode::Mode1Cooked | TrackMode::Mode1Raw { .. } => MODE1_DATA_OFFSET,
        TrackMode::Mode2Cooked(_) | TrackMode::Mode2Xa(_) | TrackMode::Mode2Raw { .. } => {
            MODE2_DATA_OFFSET
        }
    }
}
