extern crate ffmpeg_next as ffmpeg;

use std::fmt;
use std::time::Duration;

use ffmpeg::Rational;

/// A position in a specific video stream, remembering enough about the stream to be
/// convertible to wall-clock time.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Timestamp {
    timebase_numerator: i32,
    timebase_denominator: i32,
    timestamp: i64,
    first_timestamp: i64,
}

impl Timestamp {
    pub(super) fn new(ts: i64, timebase: Rational, first_timestamp: i64) -> Self {
        Self {
            timestamp: ts,
            first_timestamp,
            timebase_numerator: timebase.numerator(),
            timebase_denominator: timebase.denominator(),
        }
    }

    pub fn from_duration(dur: Duration) -> Self {
        Self::new(
            dur.as_millis()
                .try_into()
                .expect("is probably not that big"),
            Rational::new(1, 1000),
            0,
        )
    }

    pub fn to_duration(&self) -> Duration {
        let seconds = (self.timestamp as f64 - self.first_timestamp as f64)
            * (self.timebase_numerator as f64 / self.timebase_denominator as f64);
        Duration::from_secs_f64(seconds.max(0.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut total: f64 = (self.timestamp as f64 - self.first_timestamp as f64)
            * (self.timebase_numerator as f64 / self.timebase_denominator as f64);

        let negative = if total < 0.0 {
            total = -total;
            "-"
        } else {
            ""
        };

        let subsec = (total.fract() * 1e3).trunc();
        total = total.trunc();

        let hours = (total / 3600.0).trunc();
        total %= 3600.0;

        let minutes = (total / 60.0).trunc();
        total %= 60.0;

        let seconds = total;

        write!(
            f,
            "{}{:02}:{:02}:{:02}.{:03}",
            negative, hours, minutes, seconds, subsec
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamp_display() {
        let ts = Timestamp::new(50, Rational::new(1, 1000), 0);
        assert_eq!("00:00:00.050", ts.to_string());

        let ts = Timestamp::new(1005, Rational::new(1, 1000), 0);
        assert_eq!("00:00:01.005", ts.to_string());
    }

    #[test]
    fn timestamp_duration_roundtrip() {
        let dur = Duration::from_millis(3500);
        assert_eq!(dur, Timestamp::from_duration(dur).to_duration());
    }
}
