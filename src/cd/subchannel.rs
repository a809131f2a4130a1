use crate::cd::msf::to_bcd;
use crate::cd::{Msf, SUBCODE_SIZE};
use byteorder::{BigEndian, ByteOrder};
use crc::{Crc, CRC_16_GSM};

pub const ADR_POSITION: u8 = 0x01;

/// Control nibble bits shared by the TOC and the Q channel.
pub const CONTROL_PRE_EMPHASIS: u8 = 0x01;
pub const CONTROL_COPY_PERMITTED: u8 = 0x02;
pub const CONTROL_DATA: u8 = 0x04;
pub const CONTROL_FOUR_CHANNEL: u8 = 0x08;

const Q_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_GSM);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubchannelQ {
    pub control: u8,
    pub track: u8,
    pub index: u8,
    pub relative: Msf,
    /// Physical position on the disc, lead-in offset included.
    pub absolute: Msf,
}

impl SubchannelQ {
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut q = [0u8; 12];
        q[0] = (self.control << 4) | ADR_POSITION;
        q[1] = to_bcd(self.track);
        q[2] = to_bcd(self.index);
        q[3..6].copy_from_slice(&self.relative.to_bcd());
        q[7..10].copy_from_slice(&self.absolute.to_bcd());
        let crc = Q_CRC.checksum(&q[..10]);
        BigEndian::write_u16(&mut q[10..12], crc);
        q
    }

    /// Interleaves the Q channel into 96 subchannel bytes (bit 6 of each
    /// byte). P and R-W are left clear.
    pub fn to_interleaved(&self) -> [u8; SUBCODE_SIZE] {
        interleave_q(&self.to_bytes())
    }
}

pub fn interleave_q(q: &[u8; 12]) -> [u8; SUBCODE_SIZE] {
    let mut out = [0u8; SUBCODE_SIZE];
    for (i, byte) in out.iter_mut().enumerate() {
        let bit = (q[i / 8] >> (7 - (i % 8))) & 1;
        *byte = bit << 6;
    }
    out
}

pub fn deinterleave_q(subcode: &[u8]) -> [u8; 12] {
    let mut q = [0u8; 12];
    for (i, byte) in subcode.iter().take(SUBCODE_SIZE).enumerate() {
        q[i / 8] |= ((byte >> 6) & 1) << (7 - (i % 8));
    }
    q
}

pub fn q_crc_valid(q: &[u8; 12]) -> bool {
    let stored = BigEndian::read_u16(&q[10..12]);
    Q_CRC.checksum(&q[..10]) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SubchannelQ {
        SubchannelQ {
            control: CONTROL_DATA,
            track: 12,
            index: 1,
            relative: Msf::new(0, 3, 20).unwrap(),
            absolute: Msf::new(45, 2, 74).unwrap(),
        }
    }

    #[test]
    fn q_bytes_are_bcd_with_crc() {
        let q = sample().to_bytes();
        assert_eq!(&q[..10], &[0x41, 0x12, 0x01, 0x00, 0x03, 0x20, 0x00, 0x45, 0x02, 0x74]);
        assert!(q_crc_valid(&q));

        let mut corrupted = q;
        corrupted[4] ^= 0x01;
        assert!(!q_crc_valid(&corrupted));
    }

    #[test]
    fn interleaving_only_uses_the_q_bit() {
        let sub = sample().to_interleaved();
        assert!(sub.iter().all(|&b| b & !0x40 == 0));
        assert_eq!(deinterleave_q(&sub), sample().to_bytes());
    }

    #[test]
    fn audio_control_sets_only_adr_nibble() {
        let q = SubchannelQ {
            control: 0,
            ..sample()
        }
        .to_bytes();
        assert_eq!(q[0], 0x01);
    }
}
