//! # References
//!
//! - <http://lionel.cordesses.free.fr/gpages/sstv.html>
//! - <http://www.barberdsp.com/downloads/Dayton%20Paper.pdf>
//! - <https://web.archive.org/web/20120313215600/http://lionel.cordesses.free.fr/gpages/Cordesses.pdf>

mod encoder;
pub mod image;
pub mod modes;
pub mod prepare;
pub mod state;
mod watermark;

pub use encoder::{
    EncodeError,
    SstvEncoder,
    Tone,
    encode,
    frequency_for_intensity,
    intensity_for_frequency,
};
pub use modes::{
    ModeSpecification,
    UnknownMode,
    VisCode,
    describe,
};
pub use prepare::{
    EnhanceOptions,
    PrepareError,
    PrepareOptions,
    Watermark,
    load_image,
    load_image_from_bytes,
    prepare,
};

pub const LEADER_TONE: f32 = 1900.0;
pub const LEADER_TIME: f64 = 0.300;

pub const LEADER_BREAK_TIME: f64 = 0.010;

pub const VIS_BIT_TIME: f64 = 0.030;
pub const VIS_LOW_TONE: f32 = 1300.0;
pub const VIS_HIGH_TONE: f32 = 1100.0;

// sync, leader break, vis start/stop
pub const SYNC_TONE: f32 = 1200.0;

pub const PORCH_TONE: f32 = 1500.0;

pub const CHANNEL_LOW_TONE: f32 = 1500.0;
pub const CHANNEL_HIGH_TONE: f32 = 2300.0;

/// Robot 36 separator before a B-Y scan. R-Y lines use [`PORCH_TONE`].
pub const ROBOT_ODD_SEPARATOR_TONE: f32 = 2300.0;
pub const ROBOT_SEPARATOR_PORCH_TONE: f32 = 1900.0;

/// Two leaders, the break and 10 VIS bits.
pub const HEADER_TIME: f64 = 2.0 * LEADER_TIME + LEADER_BREAK_TIME + 10.0 * VIS_BIT_TIME;
