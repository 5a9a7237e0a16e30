/*!
    Timecode configuration and frame/time conversions.

    Conversions are exact: nanosecond positions are derived from frame
    counts with 128-bit integer math and floor semantics, and the reverse
    direction snaps *down* to the frame whose position is at or before the
    given time. Positions at or past 24 hours are rejected.
*/

use std::fmt;
use std::str::FromStr;

use crate::{ClockTime, ClockTimeDiff, Error, FrameNumber, Framerate, ParseError, Result};

/**
    Labelling flags for timecodes.

    Drop-frame and interlacing affect how frames are *labelled*, never where
    a frame sits on the clock. All conversions in this module ignore the
    flags; only [`Timecode`] display uses them.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimecodeFlags(pub u32);

impl TimecodeFlags {
    pub const NONE: Self = Self(0);
    pub const DROP_FRAME: Self = Self(1);
    pub const INTERLACED: Self = Self(2);

    /**
        True when all bits of `other` are set in `self`.
    */
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /**
        Union of two flag sets.
    */
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Display for TimecodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("none");
        }
        let mut first = true;
        let mut put = |f: &mut fmt::Formatter<'_>, s: &str| -> fmt::Result {
            if !first {
                f.write_str("+")?;
            }
            first = false;
            f.write_str(s)
        };
        if self.contains(Self::DROP_FRAME) {
            put(f, "drop-frame")?;
        }
        if self.contains(Self::INTERLACED) {
            put(f, "interlaced")?;
        }
        Ok(())
    }
}

impl FromStr for TimecodeFlags {
    type Err = ParseError;

    /**
        Parse `"none"` or a `+`-joined list of flag names.
    */
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::NONE);
        }
        let mut flags = Self::NONE;
        for part in trimmed.split('+') {
            let flag = match part.trim() {
                "drop-frame" => Self::DROP_FRAME,
                "interlaced" => Self::INTERLACED,
                _ => {
                    return Err(ParseError {
                        kind: "timecode flags",
                        value: s.to_owned(),
                    });
                }
            };
            flags = flags.union(flag);
        }
        Ok(flags)
    }
}

/**
    Timecode configuration: a framerate plus labelling flags.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimecodeConfig {
    pub rate: Framerate,
    pub flags: TimecodeFlags,
}

impl TimecodeConfig {
    pub const fn new(rate: Framerate, flags: TimecodeFlags) -> Self {
        Self { rate, flags }
    }
}

/**
    Convert a frame count to its nanosecond position.

    The position is `floor(frame * den * 1e9 / num)`, matching the grid
    the snap-down direction assumes.
*/
pub fn frames_to_ns(frame: FrameNumber, rate: Framerate) -> Result<ClockTime> {
    if !rate.is_valid() {
        return Err(Error::InvalidFramerate(rate));
    }
    if !frame.is_valid() {
        return Err(Error::InvalidFrame(frame));
    }

    let ns = frame.0 as u128 * rate.den as u128 * ClockTime::SECOND.0 as u128 / rate.num as u128;
    if ns >= ClockTime::DAILY_LIMIT.0 as u128 {
        return Err(Error::PastDailyLimit(ClockTime::DAILY_LIMIT));
    }
    Ok(ClockTime(ns as u64))
}

/**
    Convert a signed frame offset to a signed nanosecond offset.
*/
pub fn frames_diff_to_ns(diff: i64, rate: Framerate) -> Result<ClockTimeDiff> {
    let magnitude = frames_to_ns(FrameNumber(diff.abs()), rate)?;
    if diff < 0 {
        Ok(-(magnitude.0 as i64))
    } else {
        Ok(magnitude.0 as i64)
    }
}

/**
    Convert a nanosecond position to a frame number, snapping down to the
    frame whose position is at or before `time`.
*/
pub fn ns_to_frames(time: ClockTime, rate: Framerate) -> Result<FrameNumber> {
    if !rate.is_valid() {
        return Err(Error::InvalidFramerate(rate));
    }
    if time >= ClockTime::DAILY_LIMIT {
        return Err(Error::PastDailyLimit(time));
    }

    let mut frame = (time.0 as u128 * rate.num as u128
        / (rate.den as u128 * ClockTime::SECOND.0 as u128)) as i64;

    // Integer rounding can land one frame off in either direction; correct
    // until frame <= time < frame + 1 on the grid.
    while let Ok(next) = frames_to_ns(FrameNumber(frame + 1), rate)
        && next <= time
    {
        frame += 1;
    }
    while frame > 0
        && let Ok(prev) = frames_to_ns(FrameNumber(frame - 1), rate)
        && prev >= time
    {
        frame -= 1;
    }

    Ok(FrameNumber(frame))
}

/**
    Like [`ns_to_frames`], but errors when `time` is not exactly on a
    frame boundary.
*/
pub fn ns_to_frames_strict(time: ClockTime, rate: Framerate) -> Result<FrameNumber> {
    let frame = ns_to_frames(time, rate)?;
    if frames_to_ns(frame, rate)? != time {
        return Err(Error::NotOnFrameBoundary(time));
    }
    Ok(frame)
}

/**
    A timecode in wall-clock display form.

    Built from a frame count and a [`TimecodeConfig`]; drop-frame counting
    (for 29.97/59.94-style rates) affects labelling only.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
    pub drop_frame: bool,
}

impl Timecode {
    /**
        Label the given frame count under `config`.
    */
    pub fn from_frames(frame: FrameNumber, config: TimecodeConfig) -> Result<Self> {
        if !config.rate.is_valid() {
            return Err(Error::InvalidFramerate(config.rate));
        }
        if !frame.is_valid() {
            return Err(Error::InvalidFrame(frame));
        }
        // Ensure the frame is inside the 24-hour window.
        frames_to_ns(frame, config.rate)?;

        let nominal = nominal_fps(config.rate);
        let drop_frame =
            config.flags.contains(TimecodeFlags::DROP_FRAME) && config.rate.den != 1;

        let count = if drop_frame {
            with_dropped_labels(frame.0, nominal)
        } else {
            frame.0
        };

        let fps = nominal as i64;
        Ok(Self {
            hours: (count / (fps * 3600)) as u32,
            minutes: ((count / (fps * 60)) % 60) as u32,
            seconds: ((count / fps) % 60) as u32,
            frames: (count % fps) as u32,
            drop_frame,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, sep, self.frames
        )
    }
}

/// Nominal integer rate: 30000/1001 labels as 30 fps.
fn nominal_fps(rate: Framerate) -> i64 {
    ((rate.num as i64) + (rate.den as i64) - 1) / rate.den as i64
}

/**
    Map a real frame count to its drop-frame label count.

    SMPTE drop-frame skips the first `nominal / 15` frame labels of every
    minute that is not a multiple of ten.
*/
fn with_dropped_labels(frame: i64, nominal: i64) -> i64 {
    let dropped = nominal / 15;
    let per_min = nominal * 60 - dropped;
    let per_ten = per_min * 10 + dropped;

    let tens = frame / per_ten;
    let rem = frame % per_ten;
    let extra_minutes = if rem < nominal * 60 {
        0
    } else {
        (rem - dropped) / per_min
    };

    frame + dropped * (9 * tens + extra_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NTSC: Framerate = Framerate { num: 30000, den: 1001 };
    const R30: Framerate = Framerate { num: 30, den: 1 };

    #[test]
    fn frames_to_ns_ntsc() {
        assert_eq!(
            frames_to_ns(FrameNumber(25), NTSC).unwrap(),
            ClockTime(834_166_666)
        );
        assert_eq!(
            frames_to_ns(FrameNumber(29), NTSC).unwrap(),
            ClockTime(967_633_333)
        );
    }

    #[test]
    fn frames_to_ns_integral_rates() {
        assert_eq!(frames_to_ns(FrameNumber(1), R30).unwrap(), ClockTime(33_333_333));
        assert_eq!(
            frames_to_ns(FrameNumber(15), R30).unwrap(),
            ClockTime(500_000_000)
        );
        assert_eq!(
            frames_to_ns(FrameNumber(3), Framerate::new(100, 1)).unwrap(),
            ClockTime(30_000_000)
        );
        assert_eq!(
            frames_to_ns(FrameNumber(10), Framerate::new(25, 1)).unwrap(),
            ClockTime(400_000_000)
        );
        assert_eq!(
            frames_to_ns(FrameNumber(30), Framerate::new(60, 1)).unwrap(),
            ClockTime(500_000_000)
        );
    }

    #[test]
    fn frames_to_ns_rejects_invalid() {
        assert!(matches!(
            frames_to_ns(FrameNumber::NONE, R30),
            Err(Error::InvalidFrame(_))
        ));
        assert!(matches!(
            frames_to_ns(FrameNumber(-1), R30),
            Err(Error::InvalidFrame(_))
        ));
        assert!(matches!(
            frames_to_ns(FrameNumber(1), Framerate::new(0, 1)),
            Err(Error::InvalidFramerate(_))
        ));
    }

    #[test]
    fn frames_to_ns_daily_limit() {
        // 24h at 30 fps is 2_592_000 frames.
        assert!(frames_to_ns(FrameNumber(2_592_000 - 1), R30).is_ok());
        assert!(matches!(
            frames_to_ns(FrameNumber(2_592_000), R30),
            Err(Error::PastDailyLimit(_))
        ));
    }

    #[test]
    fn diff_to_ns_signed() {
        assert_eq!(frames_diff_to_ns(5, R30).unwrap(), 166_666_666);
        assert_eq!(frames_diff_to_ns(-5, R30).unwrap(), -166_666_666);
        assert_eq!(frames_diff_to_ns(0, R30).unwrap(), 0);
    }

    #[test]
    fn ns_to_frames_snaps_down() {
        // Exactly on the boundary.
        assert_eq!(
            ns_to_frames(ClockTime(834_166_666), NTSC).unwrap(),
            FrameNumber(25)
        );
        // Just past frame 25, still before frame 26.
        assert_eq!(
            ns_to_frames(ClockTime(834_166_667), NTSC).unwrap(),
            FrameNumber(25)
        );
        // One ns before the boundary belongs to the previous frame.
        assert_eq!(
            ns_to_frames(ClockTime(834_166_665), NTSC).unwrap(),
            FrameNumber(24)
        );
        assert_eq!(ns_to_frames(ClockTime::ZERO, R30).unwrap(), FrameNumber(0));
    }

    #[test]
    fn ns_to_frames_mid_interval() {
        // 33_333_333 ns is frame 1 at 30 fps; half a frame later is still 1.
        assert_eq!(
            ns_to_frames(ClockTime(50_000_000), R30).unwrap(),
            FrameNumber(1)
        );
        assert_eq!(
            ns_to_frames(ClockTime(33_333_332), R30).unwrap(),
            FrameNumber(0)
        );
    }

    #[test]
    fn ns_to_frames_rejects_daily_limit() {
        assert!(matches!(
            ns_to_frames(ClockTime::DAILY_LIMIT, R30),
            Err(Error::PastDailyLimit(_))
        ));
        assert!(ns_to_frames(ClockTime(ClockTime::DAILY_LIMIT.0 - 1), R30).is_ok());
    }

    #[test]
    fn strict_requires_boundary() {
        assert_eq!(
            ns_to_frames_strict(ClockTime(500_000_000), R30).unwrap(),
            FrameNumber(15)
        );
        assert!(matches!(
            ns_to_frames_strict(ClockTime(500_000_001), R30),
            Err(Error::NotOnFrameBoundary(_))
        ));
    }

    #[test]
    fn flags_do_not_affect_conversions() {
        // Same grid with and without drop-frame labelling.
        let plain = frames_to_ns(FrameNumber(29), NTSC).unwrap();
        assert_eq!(plain, ClockTime(967_633_333));
        // Conversions take no flags; labelling is display-only. Verify the
        // drop-frame label differs while positions agree.
        let df = Timecode::from_frames(
            FrameNumber(1800),
            TimecodeConfig::new(NTSC, TimecodeFlags::DROP_FRAME),
        )
        .unwrap();
        assert_eq!(df.to_string(), "00:01:00;02");
    }

    #[test]
    fn timecode_non_drop() {
        let tc = Timecode::from_frames(
            FrameNumber(30 * 3600 + 30 * 60 + 30 + 12),
            TimecodeConfig::new(R30, TimecodeFlags::NONE),
        )
        .unwrap();
        assert_eq!(tc.to_string(), "01:01:01:12");
    }

    #[test]
    fn timecode_drop_frame_labels() {
        let cfg = TimecodeConfig::new(NTSC, TimecodeFlags::DROP_FRAME);
        assert_eq!(
            Timecode::from_frames(FrameNumber(1799), cfg).unwrap().to_string(),
            "00:00:59;29"
        );
        assert_eq!(
            Timecode::from_frames(FrameNumber(1800), cfg).unwrap().to_string(),
            "00:01:00;02"
        );
        // Tenth minute keeps its first labels.
        assert_eq!(
            Timecode::from_frames(FrameNumber(17_982), cfg).unwrap().to_string(),
            "00:10:00;00"
        );
    }

    #[test]
    fn drop_frame_requires_fractional_rate() {
        // DROP_FRAME on an integral rate is labelled as non-drop.
        let tc = Timecode::from_frames(
            FrameNumber(30),
            TimecodeConfig::new(R30, TimecodeFlags::DROP_FRAME),
        )
        .unwrap();
        assert_eq!(tc.to_string(), "00:00:01:00");
    }

    #[test]
    fn flags_display() {
        assert_eq!(TimecodeFlags::NONE.to_string(), "none");
        assert_eq!(TimecodeFlags::DROP_FRAME.to_string(), "drop-frame");
        assert_eq!(
            TimecodeFlags::DROP_FRAME
                .union(TimecodeFlags::INTERLACED)
                .to_string(),
            "drop-frame+interlaced"
        );
    }

    #[test]
    fn flags_from_str() {
        assert_eq!("none".parse::<TimecodeFlags>().unwrap(), TimecodeFlags::NONE);
        assert_eq!(
            "drop-frame".parse::<TimecodeFlags>().unwrap(),
            TimecodeFlags::DROP_FRAME
        );
        assert_eq!(
            "drop-frame+interlaced".parse::<TimecodeFlags>().unwrap(),
            TimecodeFlags::DROP_FRAME.union(TimecodeFlags::INTERLACED)
        );
        assert!("progressive".parse::<TimecodeFlags>().is_err());
    }
}
