//! Mode specifications
//!
//! Timings from [here][1] and [here][2]. [Vis codes][3]
//!
//! [1]: https://github.com/windytan/slowrx/blob/master/modespec.c
//! [2]: http://www.barberdsp.com/downloads/Dayton%20Paper.pdf
//! [3]: https://web.archive.org/web/20050306193820/http://www.tima.com/~djones/vis.txt

use std::fmt;

use crate::modem::sstv::{
    HEADER_TIME,
    image::Channel,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct VisCode(u8);

impl VisCode {
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value & 0x80 == 0 {
            Some(Self(value))
        }
        else {
            None
        }
    }

    #[inline]
    pub fn get(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn get_bit(&self, bit: u8) -> bool {
        assert!(bit < 7);
        (self.0 >> bit) & 1 != 0
    }

    /// Even parity bit: set if the number of one bits in the code is odd.
    #[inline]
    pub fn parity(&self) -> bool {
        self.0.count_ones() & 1 != 0
    }
}

impl fmt::Display for VisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Colour component carried by a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Green,
    Blue,
    Red,
    Luma,
    /// R-Y on even lines, B-Y on odd lines.
    AlternatingChroma,
}

impl Component {
    #[inline]
    pub fn channel(self, y: usize) -> Channel {
        match self {
            Self::Green => Channel::Green,
            Self::Blue => Channel::Blue,
            Self::Red => Channel::Red,
            Self::Luma => Channel::Luma,
            Self::AlternatingChroma => {
                if y % 2 == 0 {
                    Channel::ChromaRed
                }
                else {
                    Channel::ChromaBlue
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelSpecification {
    pub component: Component,
    pub scan_time: f64,
}

impl ChannelSpecification {
    const fn new(component: Component, scan_time: f64) -> Self {
        Self {
            component,
            scan_time,
        }
    }
}

/// One segment of a scan line. Scans refer to an index into
/// [`ModeSpecification::channels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStep {
    Sync,
    Porch,
    Separator,
    SeparatorPorch,
    Scan { channel: usize },
}

/// Order of the segments that make up a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineLayout {
    /// Sync and porch, then each colour scan followed by a separator.
    Martin,
    /// Sync sits between the blue and the red scan. A single starting sync is
    /// sent after the header.
    Scottie,
    /// Luma scan, then a separator whose tone tells the chroma component
    /// apart, a short porch and the chroma scan.
    Robot { separator_porch_time: f64 },
}

impl LineLayout {
    pub fn steps(&self) -> &'static [LineStep] {
        match self {
            Self::Martin => {
                &[
                    LineStep::Sync,
                    LineStep::Porch,
                    LineStep::Scan { channel: 0 },
                    LineStep::Separator,
                    LineStep::Scan { channel: 1 },
                    LineStep::Separator,
                    LineStep::Scan { channel: 2 },
                    LineStep::Separator,
                ]
            }
            Self::Scottie => {
                &[
                    LineStep::Separator,
                    LineStep::Scan { channel: 0 },
                    LineStep::Separator,
                    LineStep::Scan { channel: 1 },
                    LineStep::Sync,
                    LineStep::Porch,
                    LineStep::Scan { channel: 2 },
                ]
            }
            Self::Robot { .. } => {
                &[
                    LineStep::Sync,
                    LineStep::Porch,
                    LineStep::Scan { channel: 0 },
                    LineStep::Separator,
                    LineStep::SeparatorPorch,
                    LineStep::Scan { channel: 1 },
                ]
            }
        }
    }

    #[inline]
    pub fn has_starting_sync(&self) -> bool {
        matches!(self, Self::Scottie)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ModeSpecification {
    pub name: &'static str,
    pub short_name: &'static str,
    pub sync_time: f64,
    pub porch_time: f64,
    pub sep_time: f64,
    pub pixels_per_line: usize,
    pub num_lines: usize,
    pub channels: &'static [ChannelSpecification],
    pub layout: LineLayout,
    pub vis_code: VisCode,
}

impl ModeSpecification {
    /// N7CXI, 2000
    pub const R36: Self = Self {
        name: "Robot 36",
        short_name: "R36",
        sync_time: 9e-3,
        porch_time: 3e-3,
        sep_time: 4.5e-3,
        pixels_per_line: 320,
        num_lines: 240,
        channels: &[
            ChannelSpecification::new(Component::Luma, 88e-3),
            ChannelSpecification::new(Component::AlternatingChroma, 44e-3),
        ],
        layout: LineLayout::Robot {
            separator_porch_time: 1.5e-3,
        },
        vis_code: VisCode(0x08),
    };

    /// N7CXI, 2000
    pub const S1: Self = Self {
        name: "Scottie 1",
        short_name: "S1",
        sync_time: 9e-3,
        porch_time: 1.5e-3,
        sep_time: 1.5e-3,
        pixels_per_line: 320,
        num_lines: 256,
        channels: &[
            ChannelSpecification::new(Component::Green, 138.24e-3),
            ChannelSpecification::new(Component::Blue, 138.24e-3),
            ChannelSpecification::new(Component::Red, 138.24e-3),
        ],
        layout: LineLayout::Scottie,
        vis_code: VisCode(0x3c),
    };

    /// N7CXI, 2000
    pub const M1: Self = Self {
        name: "Martin M1",
        short_name: "M1",
        sync_time: 4.862e-3,
        porch_time: 0.572e-3,
        sep_time: 0.572e-3,
        pixels_per_line: 320,
        num_lines: 256,
        channels: &[
            ChannelSpecification::new(Component::Green, 146.432e-3),
            ChannelSpecification::new(Component::Blue, 146.432e-3),
            ChannelSpecification::new(Component::Red, 146.432e-3),
        ],
        layout: LineLayout::Martin,
        vis_code: VisCode(0x2c),
    };

    /// N7CXI, 2000
    pub const M2: Self = Self {
        name: "Martin M2",
        short_name: "M2",
        sync_time: 4.862e-3,
        porch_time: 0.572e-3,
        sep_time: 0.572e-3,
        pixels_per_line: 320,
        num_lines: 256,
        channels: &[
            ChannelSpecification::new(Component::Green, 73.216e-3),
            ChannelSpecification::new(Component::Blue, 73.216e-3),
            ChannelSpecification::new(Component::Red, 73.216e-3),
        ],
        layout: LineLayout::Martin,
        vis_code: VisCode(0x28),
    };

    #[inline]
    pub fn pixel_time(&self, channel: usize) -> f64 {
        self.channels[channel].scan_time / self.pixels_per_line as f64
    }

    /// Duration of a single step of a line.
    pub fn step_time(&self, step: LineStep) -> f64 {
        match step {
            LineStep::Sync => self.sync_time,
            LineStep::Porch => self.porch_time,
            LineStep::Separator => self.sep_time,
            LineStep::SeparatorPorch => {
                match self.layout {
                    LineLayout::Robot {
                        separator_porch_time,
                    } => separator_porch_time,
                    _ => 0.0,
                }
            }
            LineStep::Scan { channel } => self.channels[channel].scan_time,
        }
    }

    pub fn line_time(&self) -> f64 {
        self.layout
            .steps()
            .iter()
            .map(|step| self.step_time(*step))
            .sum()
    }

    /// Total transmission time including the VIS header.
    pub fn frame_time(&self) -> f64 {
        let starting_sync = if self.layout.has_starting_sync() {
            self.sync_time
        }
        else {
            0.0
        };
        HEADER_TIME + starting_sync + self.num_lines as f64 * self.line_time()
    }
}

pub const BUILTIN_MODES: [&ModeSpecification; 4] = [
    &ModeSpecification::R36,
    &ModeSpecification::S1,
    &ModeSpecification::M1,
    &ModeSpecification::M2,
];

pub fn builtin_mode_specification(vis_code: VisCode) -> Option<&'static ModeSpecification> {
    BUILTIN_MODES
        .into_iter()
        .find(|mode| mode.vis_code == vis_code)
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("unknown SSTV mode: {name:?}")]
pub struct UnknownMode {
    pub name: String,
}

/// Looks up a mode by name.
///
/// Matching is case-insensitive and ignores spaces, `-` and `_`. Both the
/// full name (`"Scottie 1"`, `"Robot36"`) and the short name (`"S1"`,
/// `"r36"`) are accepted.
pub fn describe(name: &str) -> Result<&'static ModeSpecification, UnknownMode> {
    let key = normalize_mode_name(name);

    BUILTIN_MODES
        .into_iter()
        .find(|mode| {
            !key.is_empty()
                && (normalize_mode_name(mode.name) == key
                    || normalize_mode_name(mode.short_name) == key)
        })
        .ok_or_else(|| UnknownMode { name: name.to_owned() })
}

fn normalize_mode_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::modem::sstv::modes::{
        BUILTIN_MODES,
        ModeSpecification,
        VisCode,
        builtin_mode_specification,
        describe,
    };

    #[test]
    fn correct_vis_codes() {
        assert_eq!(ModeSpecification::R36.vis_code, VisCode(0x08));
        assert_eq!(ModeSpecification::M2.vis_code, VisCode(0x28));
        assert_eq!(ModeSpecification::M1.vis_code, VisCode(0x2c));
        assert_eq!(ModeSpecification::S1.vis_code, VisCode(0x3c));
    }

    #[test]
    fn vis_code_rejects_eighth_bit() {
        assert!(VisCode::new(0x80).is_none());
        assert_eq!(VisCode::new(0x2c), Some(VisCode(0x2c)));
    }

    #[test]
    fn parity_is_even_parity() {
        // 0x08 has one bit set, 0x3c has four.
        assert!(VisCode(0x08).parity());
        assert!(!VisCode(0x3c).parity());
        assert!(VisCode(0x2c).parity());
        assert!(!VisCode(0x28).parity());
    }

    #[test]
    fn published_line_times() {
        assert_abs_diff_eq!(ModeSpecification::R36.line_time(), 150e-3, epsilon = 1e-9);
        assert_abs_diff_eq!(ModeSpecification::S1.line_time(), 428.22e-3, epsilon = 1e-9);
        assert_abs_diff_eq!(ModeSpecification::M1.line_time(), 446.446e-3, epsilon = 1e-9);
        assert_abs_diff_eq!(ModeSpecification::M2.line_time(), 226.798e-3, epsilon = 1e-9);
    }

    #[test]
    fn published_frame_times() {
        assert_abs_diff_eq!(ModeSpecification::R36.frame_time(), 36.91, epsilon = 1e-6);
        assert_abs_diff_eq!(
            ModeSpecification::S1.frame_time(),
            0.91 + 9e-3 + 256.0 * 428.22e-3,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            ModeSpecification::M1.frame_time(),
            0.91 + 256.0 * 446.446e-3,
            epsilon = 1e-6
        );
    }

    #[test]
    fn describe_is_case_insensitive() {
        let upper = describe("Robot36").unwrap();
        let lower = describe("robot36").unwrap();
        assert_eq!(upper.vis_code, lower.vis_code);
        assert_eq!(upper.vis_code, ModeSpecification::R36.vis_code);

        assert_eq!(describe("Scottie 1").unwrap().vis_code, VisCode(0x3c));
        assert_eq!(describe("SCOTTIE_1").unwrap().vis_code, VisCode(0x3c));
        assert_eq!(describe("martin-m1").unwrap().vis_code, VisCode(0x2c));
        assert_eq!(describe("MartinM2").unwrap().vis_code, VisCode(0x28));
        assert_eq!(describe("m2").unwrap().vis_code, VisCode(0x28));
    }

    #[test]
    fn describe_rejects_unknown_modes() {
        let error = describe("Unknown").unwrap_err();
        assert_eq!(error.name, "Unknown");
        assert!(describe("").is_err());
        assert!(describe("Martin M3").is_err());
    }

    #[test]
    fn lookup_by_vis_code() {
        for mode in BUILTIN_MODES {
            let found = builtin_mode_specification(mode.vis_code).unwrap();
            assert_eq!(found.name, mode.name);
        }
        assert!(builtin_mode_specification(VisCode(0x00)).is_none());
    }
}
