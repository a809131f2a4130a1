pub mod ecc;
pub mod msf;
pub mod sector;
pub mod subchannel;

pub use msf::Msf;

pub const RAW_SECTOR_SIZE: usize = 2352;
pub const COOKED_SECTOR_SIZE: usize = 2048;
pub const MODE2_SECTOR_SIZE: usize = 2336;
pub const MODE2_FORM2_DATA_SIZE: usize = 2324;
pub const SUBCODE_SIZE: usize = 96;
pub const FRAME_SIZE: usize = RAW_SECTOR_SIZE + SUBCODE_SIZE;

pub const CD_FPS: u32 = 75;
pub const CD_FPM: u32 = CD_FPS * 60;

/// Frames between the start of the program area and LBA 0.
pub const LEAD_IN_FRAMES: u32 = 150;

/// Highest lead-out whose last sector still has a physical address of at
/// most 99:59:74.
pub const MAX_LEAD_OUT: u32 = 100 * CD_FPM - LEAD_IN_FRAMES;

pub const SYNC_PATTERN: [u8; 12] = [
    0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode2Form {
    Form1,
    Form2,
}

impl Mode2Form {
    pub fn number(self) -> u8 {
        match self {
            Mode2Form::Form1 => 1,
            Mode2Form::Form2 => 2,
        }
    }

    pub fn payload_size(self) -> usize {
        match self {
            Mode2Form::Form1 => COOKED_SECTOR_SIZE,
            Mode2Form::Form2 => MODE2_FORM2_DATA_SIZE,
        }
    }
}

/// How a track's sectors are encoded and how they are laid out in the
/// backing file.
///
/// `subcode` marks layouts that store the 96 subchannel bytes after each
/// 2352-byte frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Audio { subcode: bool },
    Mode1Cooked,
    Mode1Raw { subcode: bool },
    Mode2Cooked(Mode2Form),
    /// Mode 2 area without sync and header (subheader first).
    Mode2Xa(Mode2Form),
    Mode2Raw { form: Mode2Form, subcode: bool },
}

impl TrackMode {
    pub fn stored_sector_size(self) -> usize {
        match self {
            TrackMode::Audio { subcode }
            | TrackMode::Mode1Raw { subcode }
            | TrackMode::Mode2Raw { subcode, .. } => {
                if subcode {
                    FRAME_SIZE
                } else {
                    RAW_SECTOR_SIZE
                }
            }
            TrackMode::Mode1Cooked => COOKED_SECTOR_SIZE,
            TrackMode::Mode2Cooked(form) => form.payload_size(),
            TrackMode::Mode2Xa(_) => MODE2_SECTOR_SIZE,
        }
    }

    pub fn cooked_sector_size(self) -> usize {
        match self {
            TrackMode::Audio { .. } => RAW_SECTOR_SIZE,
            TrackMode::Mode1Cooked | TrackMode::Mode1Raw { .. } => COOKED_SECTOR_SIZE,
            TrackMode::Mode2Cooked(form)
            | TrackMode::Mode2Xa(form)
            | TrackMode::Mode2Raw { form, .. } => form.payload_size(),
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, TrackMode::Audio { .. })
    }

    pub fn is_mode2(self) -> bool {
        self.form().is_some()
    }

    pub fn form(self) -> Option<Mode2Form> {
        match self {
            TrackMode::Mode2Cooked(form)
            | TrackMode::Mode2Xa(form)
            | TrackMode::Mode2Raw { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn is_raw(self) -> bool {
        matches!(
            self,
            TrackMode::Audio { .. } | TrackMode::Mode1Raw { .. } | TrackMode::Mode2Raw { .. }
        )
    }

    pub fn has_subcode(self) -> bool {
        matches!(
            self,
            TrackMode::Audio { subcode: true }
                | TrackMode::Mode1Raw { subcode: true }
                | TrackMode::Mode2Raw { subcode: true, .. }
        )
    }

    pub fn cue_name(self) -> &'static str {
        match self {
            TrackMode::Audio { subcode: false } => "AUDIO",
            TrackMode::Audio { subcode: true } => "CDG",
            TrackMode::Mode1Cooked => "MODE1/2048",
            TrackMode::Mode1Raw { subcode: false } => "MODE1/2352",
            TrackMode::Mode1Raw { subcode: true } => "MODE1/2448",
            TrackMode::Mode2Cooked(Mode2Form::Form1) => "MODE2/2048",
            TrackMode::Mode2Cooked(Mode2Form::Form2) => "MODE2/2324",
            TrackMode::Mode2Xa(_) => "MODE2/2336",
            TrackMode::Mode2Raw { subcode: false, .. } => "MODE2/2352",
            TrackMode::Mode2Raw { subcode: true, .. } => "MODE2/2448",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorEncoding {
    pub size: usize,
    pub is_mode2: bool,
    pub form: Option<Mode2Form>,
}

impl From<TrackMode> for SectorEncoding {
    fn from(mode: TrackMode) -> Self {
        Self {
            size: mode.stored_sector_size(),
            is_mode2: mode.is_mode2(),
            form: mode.form(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_sizes_match_cue_names() {
        let cases = [
            (TrackMode::Audio { subcode: false }, 2352),
            (TrackMode::Audio { subcode: true }, 2448),
            (TrackMode::Mode1Cooked, 2048),
            (TrackMode::Mode1Raw { subcode: false }, 2352),
            (TrackMode::Mode2Cooked(Mode2Form::Form1), 2048),
            (TrackMode::Mode2Cooked(Mode2Form::Form2), 2324),
            (TrackMode::Mode2Xa(Mode2Form::Form1), 2336),
            (
                TrackMode::Mode2Raw {
                    form: Mode2Form::Form1,
                    subcode: true,
                },
                2448,
            ),
        ];

        for (mode, size) in cases {
            assert_eq!(mode.stored_sector_size(), size, "{}", mode.cue_name());
            assert!(mode.cue_name().ends_with(&size.to_string()) || mode.is_audio());
        }
    }

    #[test]
    fn encoding_reports_form_only_for_mode2() {
        let mode1 = SectorEncoding::from(TrackMode::Mode1Cooked);
        assert!(!mode1.is_mode2);
        assert_eq!(mode1.form, None);

        let mode2 = SectorEncoding::from(TrackMode::Mode2Cooked(Mode2Form::Form2));
        assert!(mode2.is_mode2);
        assert_eq!(mode2.form, Some(Mode2Form::Form2));
        assert_eq!(mode2.size, 2324);
    }

    #[test]
    fn audio_cooked_size_is_the_full_frame() {
        assert_eq!(
            TrackMode::Audio { subcode: true }.cooked_sector_size(),
            RAW_SECTOR_SIZE
        );
        assert!(TrackMode::Audio { subcode: false }.is_raw());
        assert!(!TrackMode::Mode2Xa(Mode2Form::Form1).is_raw());
    }
}
