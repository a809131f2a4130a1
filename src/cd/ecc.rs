//! EDC and Reed-Solomon product code (ECC) for CD-ROM sectors, as laid out
//! by ECMA-130.

use crc::{Crc, CRC_32_CD_ROM_EDC};

const EDC: Crc<u32> = Crc::<u32>::new(&CRC_32_CD_ROM_EDC);

pub const ECC_P_OFFSET: usize = 0x81C;
pub const ECC_Q_OFFSET: usize = 0x8C8;

const ECC_P_SIZE: usize = 172;
const ECC_Q_SIZE: usize = 104;
/// ECC covers everything after the sync field.
const ECC_DATA_OFFSET: usize = 12;

const ECC_F_LUT: [u8; 256] = build_f_lut();
const ECC_B_LUT: [u8; 256] = build_b_lut();

// Multiplication by alpha in GF(2^8) with the polynomial x^8 + x^4 + x^3 + x^2 + 1.
const fn build_f_lut() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let shifted = (i << 1) ^ if i & 0x80 != 0 { 0x11D } else { 0 };
        table[i] = shifted as u8;
        i += 1;
    }
    table
}

const fn build_b_lut() -> [u8; 256] {
    let f = build_f_lut();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i ^ f[i] as usize] = i as u8;
        i += 1;
    }
    table
}

pub fn edc(data: &[u8]) -> u32 {
    EDC.checksum(data)
}

/// Computes one parity set over `data` (the sector minus its sync field)
/// into `dest`, which holds `2 * major_count` bytes.
fn compute_parity(
    data: &[u8],
    major_count: usize,
    minor_count: usize,
    major_mult: usize,
    minor_inc: usize,
    dest: &mut [u8],
) {
    let size = major_count * minor_count;
    for major in 0..major_count {
        let mut index = (major >> 1) * major_mult + (major & 1);
        let mut ecc_a = 0u8;
        let mut ecc_b = 0u8;
        for _ in 0..minor_count {
            let value = data[index];
            index += minor_inc;
            if index >= size {
                index -= size;
            }
            ecc_a ^= value;
            ecc_b ^= value;
            ecc_a = ECC_F_LUT[ecc_a as usize];
        }
        ecc_a = ECC_B_LUT[(ECC_F_LUT[ecc_a as usize] ^ ecc_b) as usize];
        dest[major] = ecc_a;
        dest[major + major_count] = ecc_a ^ ecc_b;
    }
}

/// Fills the P and Q parity of a full 2352-byte sector. Everything from
/// the header up to the parity area must already be in place.
pub fn write_ecc(sector: &mut [u8]) {
    let mut p = [0u8; ECC_P_SIZE];
    compute_parity(&sector[ECC_DATA_OFFSET..ECC_P_OFFSET], 86, 24, 2, 86, &mut p);
    sector[ECC_P_OFFSET..ECC_P_OFFSET + ECC_P_SIZE].copy_from_slice(&p);

    let mut q = [0u8; ECC_Q_SIZE];
    compute_parity(&sector[ECC_DATA_OFFSET..ECC_Q_OFFSET], 52, 43, 86, 88, &mut q);
    sector[ECC_Q_OFFSET..ECC_Q_OFFSET + ECC_Q_SIZE].copy_from_slice(&q);
}
