use crate::{
    modem::sstv::{
        CHANNEL_HIGH_TONE,
        CHANNEL_LOW_TONE,
        LEADER_BREAK_TIME,
        LEADER_TIME,
        LEADER_TONE,
        PORCH_TONE,
        ROBOT_ODD_SEPARATOR_TONE,
        ROBOT_SEPARATOR_PORCH_TONE,
        SYNC_TONE,
        VIS_BIT_TIME,
        VIS_HIGH_TONE,
        VIS_LOW_TONE,
        image::FrameBuffer,
        modes::{
            LineLayout,
            LineStep,
            ModeSpecification,
        },
        state::{
            HeaderState,
            State,
        },
    },
    util::{
        lerp,
        unlerp,
    },
};

/// A constant frequency held for a duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    /// Hz
    pub frequency: f32,
    /// Seconds
    pub duration: f64,
}

impl Tone {
    #[inline]
    pub fn new(frequency: f32, duration: f64) -> Self {
        Self {
            frequency,
            duration,
        }
    }

    pub fn from_state<F>(state: &State, mode: &ModeSpecification, frame_buffer: &F) -> Self
    where
        F: FrameBuffer,
    {
        match state {
            State::Header { header_state } => {
                match header_state {
                    HeaderState::Leader1 | HeaderState::Leader2 => {
                        Tone::new(LEADER_TONE, LEADER_TIME)
                    }
                    HeaderState::LeaderBreak => Tone::new(SYNC_TONE, LEADER_BREAK_TIME),
                    HeaderState::VisStart | HeaderState::VisStop => {
                        Tone::new(SYNC_TONE, VIS_BIT_TIME)
                    }
                    HeaderState::VisBit { bit } => {
                        let bit = if *bit == 7 {
                            mode.vis_code.parity()
                        }
                        else {
                            mode.vis_code.get_bit(*bit)
                        };
                        Tone::new(if bit { VIS_HIGH_TONE } else { VIS_LOW_TONE }, VIS_BIT_TIME)
                    }
                    HeaderState::StartingSync => Tone::new(SYNC_TONE, mode.sync_time),
                }
            }
            State::Line { y, line_state } => {
                let step = mode.layout.steps()[line_state.step];
                let duration = mode.step_time(step);
                match step {
                    LineStep::Sync => Tone::new(SYNC_TONE, duration),
                    LineStep::Porch => Tone::new(PORCH_TONE, duration),
                    LineStep::Separator => {
                        let frequency = match mode.layout {
                            LineLayout::Robot { .. } if y % 2 == 1 => ROBOT_ODD_SEPARATOR_TONE,
                            _ => PORCH_TONE,
                        };
                        Tone::new(frequency, duration)
                    }
                    LineStep::SeparatorPorch => Tone::new(ROBOT_SEPARATOR_PORCH_TONE, duration),
                    LineStep::Scan { channel } => {
                        let component = mode.channels[channel].component;
                        let value = frame_buffer.channel(line_state.x, *y, component.channel(*y));
                        Tone::new(frequency_for_intensity(value), mode.pixel_time(channel))
                    }
                }
            }
        }
    }
}

/// Maps a channel intensity to the subcarrier frequency. Values outside
/// `0..=255` are clamped first.
#[inline]
pub fn frequency_for_intensity(value: f32) -> f32 {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 255.0) };
    lerp(value / 255.0, CHANNEL_LOW_TONE, CHANNEL_HIGH_TONE)
}

#[inline]
pub fn intensity_for_frequency(frequency: f32) -> f32 {
    255.0 * unlerp(frequency, CHANNEL_LOW_TONE, CHANNEL_HIGH_TONE)
}

#[derive(Clone, Copy, Debug, thiserror::Error)]
#[error("sstv encoder error")]
pub enum EncodeError {
    #[error("invalid frame geometry: got {width}x{height}, expected {expected_width}x{expected_height}")]
    InvalidGeometry {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
}

/// Produces the tones of one transmission in order.
#[derive(Clone, Debug)]
pub struct SstvEncoder<F> {
    frame_buffer: F,
    mode: ModeSpecification,
    state: Option<State>,
}

impl<F> SstvEncoder<F>
where
    F: FrameBuffer,
{
    pub fn new(frame_buffer: F, mode: ModeSpecification) -> Result<Self, EncodeError> {
        let width = frame_buffer.width();
        let height = frame_buffer.height();

        if width == 0
            || height == 0
            || width != mode.pixels_per_line
            || height != mode.num_lines
        {
            return Err(EncodeError::InvalidGeometry {
                width,
                height,
                expected_width: mode.pixels_per_line,
                expected_height: mode.num_lines,
            });
        }

        Ok(Self {
            frame_buffer,
            mode,
            state: Some(State::default()),
        })
    }

    #[inline]
    pub fn mode(&self) -> &ModeSpecification {
        &self.mode
    }
}

impl<F> Iterator for SstvEncoder<F>
where
    F: FrameBuffer,
{
    type Item = Tone;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state?;
        let tone = Tone::from_state(&state, &self.mode, &self.frame_buffer);
        self.state = state.next(&self.mode);
        Some(tone)
    }
}

/// Encodes a whole frame into its tone sequence.
pub fn encode<F>(frame_buffer: F, mode: &ModeSpecification) -> Result<Vec<Tone>, EncodeError>
where
    F: FrameBuffer,
{
    let encoder = SstvEncoder::new(frame_buffer, *mode)?;
    let tones = encoder.collect::<Vec<_>>();
    tracing::debug!(mode = mode.name, num_tones = tones.len(), "Encoded frame");
    Ok(tones)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::{
        Rgb,
        RgbImage,
    };

    use crate::modem::sstv::{
        CHANNEL_HIGH_TONE,
        CHANNEL_LOW_TONE,
        PORCH_TONE,
        ROBOT_ODD_SEPARATOR_TONE,
        SYNC_TONE,
        VIS_BIT_TIME,
        VIS_HIGH_TONE,
        VIS_LOW_TONE,
        encoder::{
            EncodeError,
            Tone,
            encode,
            frequency_for_intensity,
            intensity_for_frequency,
        },
        image::{
            Channel,
            FrameBuffer,
        },
        modes::{
            BUILTIN_MODES,
            ModeSpecification,
            VisCode,
            builtin_mode_specification,
        },
    };

    /// Returns the same value for every channel of every pixel.
    struct Constant {
        width: usize,
        height: usize,
        value: f32,
    }

    impl Constant {
        fn for_mode(mode: &ModeSpecification, value: f32) -> Self {
            Self {
                width: mode.pixels_per_line,
                height: mode.num_lines,
                value,
            }
        }
    }

    impl FrameBuffer for Constant {
        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }

        fn channel(&self, _x: usize, _y: usize, _channel: Channel) -> f32 {
            self.value
        }
    }

    fn decode_vis(tones: &[Tone]) -> (VisCode, bool) {
        // leader, break, leader, start bit
        assert_eq!(tones[3], Tone::new(SYNC_TONE, VIS_BIT_TIME));
        let bits = tones[4..12]
            .iter()
            .map(|tone| {
                assert_eq!(tone.duration, VIS_BIT_TIME);
                match tone.frequency {
                    f if f == VIS_HIGH_TONE => true,
                    f if f == VIS_LOW_TONE => false,
                    f => panic!("unexpected VIS bit frequency: {f}"),
                }
            })
            .collect::<Vec<_>>();
        assert_eq!(tones[12], Tone::new(SYNC_TONE, VIS_BIT_TIME));

        let code = bits[..7]
            .iter()
            .enumerate()
            .fold(0u8, |code, (i, bit)| code | ((*bit as u8) << i));
        (VisCode::new(code).unwrap(), bits[7])
    }

    #[test]
    fn vis_header_round_trips() {
        for mode in BUILTIN_MODES {
            let tones = encode(Constant::for_mode(mode, 0.0), mode).unwrap();
            let (vis_code, parity) = decode_vis(&tones);
            assert_eq!(vis_code, mode.vis_code);
            assert_eq!(vis_code.get().count_ones() % 2 == 1, parity);
            assert_eq!(builtin_mode_specification(vis_code).unwrap().name, mode.name);
        }
    }

    #[test]
    fn total_duration_matches_frame_time() {
        for mode in BUILTIN_MODES {
            let tones = encode(Constant::for_mode(mode, 128.0), mode).unwrap();
            let total: f64 = tones.iter().map(|tone| tone.duration).sum();
            for sample_rate in [22050.0, 44100.0, 48000.0] {
                assert_abs_diff_eq!(total, mode.frame_time(), epsilon = 1.0 / sample_rate);
            }
        }
    }

    #[test]
    fn out_of_range_intensities_are_clamped() {
        assert_eq!(frequency_for_intensity(-10.0), CHANNEL_LOW_TONE);
        assert_eq!(frequency_for_intensity(300.0), CHANNEL_HIGH_TONE);
        assert_eq!(frequency_for_intensity(0.0), CHANNEL_LOW_TONE);
        assert_eq!(frequency_for_intensity(255.0), CHANNEL_HIGH_TONE);

        let mode = ModeSpecification::M2;
        let pixel_time = mode.pixel_time(0);
        let low = encode(Constant::for_mode(&mode, -10.0), &mode).unwrap();
        assert!(low.contains(&Tone::new(CHANNEL_LOW_TONE, pixel_time)));
        assert!(!low.iter().any(|tone| tone.frequency < CHANNEL_LOW_TONE));

        let high = encode(Constant::for_mode(&mode, 300.0), &mode).unwrap();
        assert!(high.contains(&Tone::new(CHANNEL_HIGH_TONE, pixel_time)));
        assert!(!high.iter().any(|tone| tone.frequency > CHANNEL_HIGH_TONE));
    }

    #[test]
    fn intensity_maps_linearly() {
        assert_abs_diff_eq!(frequency_for_intensity(127.5), 1900.0, epsilon = 1e-3);
    }

    #[test]
    fn scan_tones_carry_pixel_values() {
        let mode = ModeSpecification::M2;
        let image = RgbImage::from_fn(mode.pixels_per_line as u32, mode.num_lines as u32, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 255 - (x % 256) as u8])
        });
        let tones = encode(&image, &mode).unwrap();

        let pixel_time = mode.pixel_time(0);
        let first_line = tones
            .iter()
            .filter(|tone| tone.duration == pixel_time)
            .take(3 * mode.pixels_per_line)
            .map(|tone| intensity_for_frequency(tone.frequency))
            .collect::<Vec<_>>();
        let (green, rest) = first_line.split_at(mode.pixels_per_line);
        let (blue, red) = rest.split_at(mode.pixels_per_line);

        for x in 0..mode.pixels_per_line {
            let value = (x % 256) as f32;
            assert_abs_diff_eq!(red[x], value, epsilon = 1e-2);
            assert_abs_diff_eq!(green[x], 0.0, epsilon = 1e-2);
            assert_abs_diff_eq!(blue[x], 255.0 - value, epsilon = 1e-2);
        }
    }

    #[test]
    fn rejects_bad_geometry() {
        let mode = ModeSpecification::R36;
        let empty = Constant {
            width: 0,
            height: 240,
            value: 0.0,
        };
        assert!(matches!(
            encode(empty, &mode),
            Err(EncodeError::InvalidGeometry { width: 0, .. })
        ));

        let flat = Constant {
            width: 320,
            height: 0,
            value: 0.0,
        };
        assert!(matches!(
            encode(flat, &mode),
            Err(EncodeError::InvalidGeometry { height: 0, .. })
        ));

        let wrong = RgbImage::new(320, 256);
        assert!(encode(&wrong, &mode).is_err());
    }

    #[test]
    fn martin_line_layout() {
        let mode = ModeSpecification::M1;
        let image = RgbImage::from_pixel(320, 256, Rgb([255, 0, 0]));
        let tones = encode(&image, &mode).unwrap();

        // header is 13 tones
        let line = &tones[13..13 + 3 * 320 + 5];
        assert_eq!(line[0], Tone::new(SYNC_TONE, mode.sync_time));
        assert_eq!(line[1], Tone::new(PORCH_TONE, mode.porch_time));
        // green, blue, red
        assert_eq!(line[2].frequency, CHANNEL_LOW_TONE);
        assert_eq!(line[2 + 320], Tone::new(PORCH_TONE, mode.sep_time));
        assert_eq!(line[3 + 320].frequency, CHANNEL_LOW_TONE);
        assert_eq!(line[3 + 2 * 320], Tone::new(PORCH_TONE, mode.sep_time));
        assert_eq!(line[4 + 2 * 320].frequency, CHANNEL_HIGH_TONE);
        assert_eq!(line[4 + 3 * 320], Tone::new(PORCH_TONE, mode.sep_time));
    }

    #[test]
    fn scottie_line_layout() {
        let mode = ModeSpecification::S1;
        let image = RgbImage::from_pixel(320, 256, Rgb([0, 0, 255]));
        let tones = encode(&image, &mode).unwrap();

        assert_eq!(tones[13], Tone::new(SYNC_TONE, mode.sync_time));
        let line = &tones[14..14 + 3 * 320 + 4];
        assert_eq!(line[0], Tone::new(PORCH_TONE, mode.sep_time));
        assert_eq!(line[1].frequency, CHANNEL_LOW_TONE);
        assert_eq!(line[1 + 320], Tone::new(PORCH_TONE, mode.sep_time));
        assert_eq!(line[2 + 320].frequency, CHANNEL_HIGH_TONE);
        assert_eq!(line[2 + 2 * 320], Tone::new(SYNC_TONE, mode.sync_time));
        assert_eq!(line[3 + 2 * 320], Tone::new(PORCH_TONE, mode.porch_time));
        assert_eq!(line[4 + 2 * 320].frequency, CHANNEL_LOW_TONE);
    }

    #[test]
    fn robot_alternates_chroma() {
        let mode = ModeSpecification::R36;
        let image = RgbImage::from_pixel(320, 240, Rgb([128, 128, 128]));
        let tones = encode(&image, &mode).unwrap();

        let per_line = 2 * 320 + 4;
        let even = &tones[13..13 + per_line];
        let odd = &tones[13 + per_line..13 + 2 * per_line];

        for (line, separator) in [(even, PORCH_TONE), (odd, ROBOT_ODD_SEPARATOR_TONE)] {
            assert_eq!(line[0], Tone::new(SYNC_TONE, 9e-3));
            assert_eq!(line[1], Tone::new(PORCH_TONE, 3e-3));
            assert_abs_diff_eq!(line[2].duration, 88e-3 / 320.0);
            assert_eq!(line[2 + 320], Tone::new(separator, 4.5e-3));
            assert_eq!(line[3 + 320], Tone::new(1900.0, 1.5e-3));
            assert_abs_diff_eq!(line[4 + 320].duration, 44e-3 / 320.0);
            // neutral chroma for gray
            assert_abs_diff_eq!(
                line[4 + 320].frequency,
                frequency_for_intensity(128.0),
                epsilon = 0.1
            );
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let mode = ModeSpecification::M2;
        let image = RgbImage::from_fn(320, 256, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        assert_eq!(encode(&image, &mode).unwrap(), encode(&image, &mode).unwrap());
    }
}
