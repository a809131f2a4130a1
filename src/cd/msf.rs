use crate::cd::{CD_FPM, CD_FPS};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Msf {
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
}

impl Msf {
    pub const ZERO: Msf = Msf {
        minute: 0,
        second: 0,
        frame: 0,
    };

    pub fn new(minute: u8, second: u8, frame: u8) -> Option<Self> {
        if second < 60 && u32::from(frame) < CD_FPS {
            Some(Self {
                minute,
                second,
                frame,
            })
        } else {
            None
        }
    }

    pub fn to_lba(self) -> u32 {
        u32::from(self.minute) * CD_FPM + u32::from(self.second) * CD_FPS + u32::from(self.frame)
    }

    /// Minutes above 255 wrap. Loaded images stay below [`crate::cd::MAX_LEAD_OUT`].
    pub fn from_lba(lba: u32) -> Self {
        Self {
            minute: (lba / CD_FPM) as u8,
            second: ((lba / CD_FPS) % 60) as u8,
            frame: (lba % CD_FPS) as u8,
        }
    }

    pub fn to_bcd(self) -> [u8; 3] {
        [to_bcd(self.minute), to_bcd(self.second), to_bcd(self.frame)]
    }

    pub fn from_bcd(bytes: [u8; 3]) -> Option<Self> {
        Self::new(
            from_bcd(bytes[0])?,
            from_bcd(bytes[1])?,
            from_bcd(bytes[2])?,
        )
    }
}

impl fmt::Display for Msf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minute, self.second, self.frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid MSF format: {0}")]
pub struct InvalidMsf(pub String);

impl FromStr for Msf {
    type Err = InvalidMsf;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(InvalidMsf(s.to_string()));
        }

        let field = |part: &str| part.parse::<u8>().map_err(|_| InvalidMsf(s.to_string()));
        Msf::new(field(parts[0])?, field(parts[1])?, field(parts[2])?)
            .ok_or_else(|| InvalidMsf(s.to_string()))
    }
}

pub fn msf_to_lba(msf: Msf) -> u32 {
    msf.to_lba()
}

pub fn lba_to_msf(lba: u32) -> Msf {
    Msf::from_lba(lba)
}

pub fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

pub fn from_bcd(value: u8) -> Option<u8> {
    let (high, low) = (value >> 4, value & 0x0F);
    if high > 9 || low > 9 {
        return None;
    }
    Some(high * 10 + low)
}
