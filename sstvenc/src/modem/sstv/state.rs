use crate::modem::sstv::modes::{
    LineStep,
    ModeSpecification,
};

/// Position within a transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Header { header_state: HeaderState },
    Line { y: usize, line_state: LineState },
}

impl Default for State {
    fn default() -> Self {
        State::Header {
            header_state: HeaderState::Leader1,
        }
    }
}

impl State {
    pub fn next(&self, mode: &ModeSpecification) -> Option<Self> {
        let mut state = *self;
        match &mut state {
            Self::Header { header_state } => {
                match header_state {
                    HeaderState::Leader1 => *header_state = HeaderState::LeaderBreak,
                    HeaderState::LeaderBreak => *header_state = HeaderState::Leader2,
                    HeaderState::Leader2 => *header_state = HeaderState::VisStart,
                    HeaderState::VisStart => {
                        *header_state = HeaderState::VisBit { bit: 0 };
                    }
                    HeaderState::VisBit { bit } => {
                        *bit += 1;
                        if *bit == 8 {
                            *header_state = HeaderState::VisStop;
                        }
                    }
                    HeaderState::VisStop if mode.layout.has_starting_sync() => {
                        *header_state = HeaderState::StartingSync;
                    }
                    HeaderState::VisStop | HeaderState::StartingSync => {
                        state = State::Line {
                            y: 0,
                            line_state: LineState::default(),
                        };
                    }
                }
            }
            Self::Line { y, line_state } => {
                let steps = mode.layout.steps();

                if let LineStep::Scan { .. } = steps[line_state.step] {
                    line_state.x += 1;
                    if line_state.x < mode.pixels_per_line {
                        return Some(state);
                    }
                }

                line_state.x = 0;
                line_state.step += 1;
                if line_state.step == steps.len() {
                    line_state.step = 0;
                    *y += 1;
                    if *y == mode.num_lines {
                        return None;
                    }
                }
            }
        }

        Some(state)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
    Leader1,
    LeaderBreak,
    Leader2,
    VisStart,
    /// Bits 0 to 6 carry the VIS code LSB first, bit 7 is the parity bit.
    VisBit { bit: u8 },
    VisStop,
    StartingSync,
}

/// Index into [`LineLayout::steps`](crate::modem::sstv::modes::LineLayout::steps)
/// and, while scanning, the pixel column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineState {
    pub step: usize,
    pub x: usize,
}
