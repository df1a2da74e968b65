//! Fixed-width UTC timestamp rendering
//!
//! Every encoded entry starts with a timestamp of exactly
//! [`TIMESTAMP_LEN`] bytes: `YYYY-MM-DDTHH:MM:SS.mmmmmmZ`. The digits are
//! written straight into a byte buffer instead of going through a strftime
//! style formatter.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Length of a rendered timestamp.
pub const TIMESTAMP_LEN: usize = 27;

/// Render `time` as `YYYY-MM-DDTHH:MM:SS.mmmmmmZ`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use scoped_log::core::timestamp::format_timestamp;
///
/// let t = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(format_timestamp(&t), "2025-01-08T10:30:45.000000Z");
/// ```
#[must_use]
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    let mut buf = [0u8; TIMESTAMP_LEN];
    write_timestamp(time, &mut buf);
    // every byte written above is ASCII
    buf.iter().map(|&b| b as char).collect()
}

/// Write the timestamp digits into a caller-provided buffer.
pub fn write_timestamp(time: &DateTime<Utc>, buf: &mut [u8; TIMESTAMP_LEN]) {
    let year = time.year().clamp(0, 9999) as u32;
    // leap seconds surface as nanos >= 1_000_000_000
    let micros = (time.nanosecond() % 1_000_000_000) / 1000;

    put_digits(&mut buf[0..4], year);
    buf[4] = b'-';
    put_digits(&mut buf[5..7], time.month());
    buf[7] = b'-';
    put_digits(&mut buf[8..10], time.day());
    buf[10] = b'T';
    put_digits(&mut buf[11..13], time.hour());
    buf[13] = b':';
    put_digits(&mut buf[14..16], time.minute());
    buf[16] = b':';
    put_digits(&mut buf[17..19], time.second());
    buf[19] = b'.';
    put_digits(&mut buf[20..26], micros);
    buf[26] = b'Z';
}

fn put_digits(out: &mut [u8], mut value: u32) {
    for slot in out.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}
