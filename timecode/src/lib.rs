/*!
    Shared timing types for the cutline crate ecosystem.

    This crate defines the timing vocabulary of the ecosystem, the types that
    cross crate boundaries. It depends on nothing heavier than
    `static_assertions`, so consumers can take the types without pulling in
    an engine.

    # Core Types

    - [`ClockTime`] - Positions and durations in nanoseconds
    - [`FrameNumber`] - Frame indices, with a `NONE` sentinel
    - [`Framerate`] - Rational frame rates (e.g. 30000/1001 for 29.97 fps)

    # Timecode

    - [`TimecodeConfig`] - Framerate plus labelling flags
    - [`TimecodeFlags`] - Drop-frame / interlaced labelling flags
    - [`Timecode`] - Wall-clock display form (`HH:MM:SS:FF`)

    # Conversions

    - [`frames_to_ns`] and [`frames_diff_to_ns`] - Frame counts to clock time
    - [`ns_to_frames`] and [`ns_to_frames_strict`] - Clock time to frame counts

    # Error Handling

    - [`Error`] and [`Result`] - Common error types
    - [`ParseError`] - Failure type for `FromStr` impls across the ecosystem
*/

mod clock_time;
mod error;
mod frame;
mod rate;
mod timecode;

pub use clock_time::{ClockTime, ClockTimeDiff};
pub use error::{Error, ParseError, Result};
pub use frame::FrameNumber;
pub use rate::Framerate;
pub use timecode::{
    Timecode, TimecodeConfig, TimecodeFlags, frames_diff_to_ns, frames_to_ns, ns_to_frames,
    ns_to_frames_strict,
};
