//! Encoder for sync responses.
//!
//! Responses are JSON text written into a fixed-capacity buffer supplied by
//! the caller. When the buffer runs out, output stops at the last complete
//! value and every open object and array is closed, so a truncated response
//! still parses.
//!
//! ```text
//! {"version":2,"profiles":[{"name":"...","height_cm":170,"dob":"1990-05-10",
//!  "measurements":[{"date":"2023-05-10T23:15:00","weight_kg":65.3,"bmi":22.10,
//!  "balance_percent":51.0}],"activities":[]}]}
//! ```

use core::fmt::{self, Write};

use chrono::{Datelike, NaiveDateTime, Timelike};
use tinyvec::ArrayVec;

use crate::model::{Activity, Measurement, Profile, SaveData};

/// Version tag of the response format.
pub const VERSION: u32 = 2;

/// Encode a decoded save, returning the number of bytes written.
pub fn encode_response(save: &SaveData, out: &mut [u8]) -> usize {
    let mut w = Writer::new(out);

    let _ = write_response(&mut w, save);

    w.finish()
}

/// Encode an error, returning the number of bytes written.
pub fn encode_error(code: i32, message: &str, out: &mut [u8]) -> usize {
    let mut w = Writer::new(out);

    let _ = write_error(&mut w, code, message);

    w.finish()
}

fn write_error(w: &mut Writer<'_>, code: i32, message: &str) -> Result<(), Overflow> {
    w.open(format_args!("{{\"version\":{VERSION}"), b'}')?;
    w.open(format_args!(",\"error\":{{\"code\":{code}"), b'}')?;
    w.write(format_args!(",\"message\":\"{}\"", Escaped(message)))
}

fn write_response(w: &mut Writer<'_>, save: &SaveData) -> Result<(), Overflow> {
    w.open(format_args!("{{\"version\":{VERSION}"), b'}')?;
    w.open(format_args!(",\"profiles\":["), b']')?;

    for (i, profile) in save.profiles.iter().enumerate() {
        write_profile(w, profile, separator(i))?;
    }

    Ok(())
}

fn write_profile(w: &mut Writer<'_>, p: &Profile, sep: &str) -> Result<(), Overflow> {
    w.open(
        format_args!(
            "{sep}{{\"name\":\"{}\",\"height_cm\":{},\"dob\":\"{:04}-{:02}-{:02}\"",
            Escaped(&p.name),
            p.height_cm,
            p.birth_year,
            p.birth_month,
            p.birth_day,
        ),
        b'}',
    )?;

    w.open(format_args!(",\"measurements\":["), b']')?;
    for (i, m) in p.measurements.iter().enumerate() {
        write_measurement(w, m, separator(i))?;
    }
    w.close();

    w.open(format_args!(",\"activities\":["), b']')?;
    for (i, a) in p.activities.iter().enumerate() {
        write_activity(w, a, separator(i))?;
    }
    w.close();

    w.close();
    Ok(())
}

fn write_measurement(w: &mut Writer<'_>, m: &Measurement, sep: &str) -> Result<(), Overflow> {
    let weight = sanitize(m.weight_kg, 0.0);
    let bmi = sanitize(m.bmi, 0.0);
    let balance = sanitize(m.balance_percent, 50.0);

    w.write(format_args!(
        "{sep}{{\"date\":\"{}\",\"weight_kg\":{weight:.1},\"bmi\":{bmi:.2},\"balance_percent\":{balance:.1}}}",
        IsoDateTime(&m.timestamp),
    ))
}

fn write_activity(w: &mut Writer<'_>, a: &Activity, sep: &str) -> Result<(), Overflow> {
    w.write(format_args!(
        "{sep}{{\"date\":\"{}\",\"type\":\"{}\",\"name\":\"{}\",\"duration_min\":{},\"calories\":{},\"score\":{}}}",
        IsoDateTime(&a.timestamp),
        a.kind.as_str(),
        Escaped(&a.name),
        a.duration_min,
        a.calories,
        a.score,
    ))
}

fn separator(i: usize) -> &'static str {
    if i == 0 { "" } else { "," }
}

/// Replace values JSON cannot carry, and negative readings, with a default.
fn sanitize(x: f32, default: f32) -> f32 {
    if x.is_finite() && x >= 0.0 { x } else { default }
}

/// A string with `\`, `"`, and the newline, carriage return and tab control
/// characters escaped. Everything else passes through untouched.
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;

        while let Some(i) = rest.find(['\\', '"', '\n', '\r', '\t']) {
            f.write_str(&rest[..i])?;
            f.write_str(match rest.as_bytes()[i] {
                b'\\' => "\\\\",
                b'"' => "\\\"",
                b'\n' => "\\n",
                b'\r' => "\\r",
                _ => "\\t",
            })?;
            rest = &rest[i + 1..];
        }

        f.write_str(rest)
    }
}

/// `YYYY-MM-DDTHH:MM:SS`, without a zone.
struct IsoDateTime<'a>(&'a NaiveDateTime);

impl fmt::Display for IsoDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute(),
            t.second(),
        )
    }
}

/// The buffer has no room for the next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Maximum nesting depth of a response.
const MAX_DEPTH: usize = 8;

/// A bounded JSON writer.
///
/// Every value is written whole or not at all. Room for the closing bracket of
/// each open object or array is held back, so [`Writer::finish`] can always
/// balance the output. After the first overflow, further writes are ignored.
pub struct Writer<'a> {
    out: &'a mut [u8],
    len: usize,
    closers: ArrayVec<[u8; MAX_DEPTH]>,
    truncated: bool,
}

impl<'a> Writer<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self {
            out,
            len: 0,
            closers: ArrayVec::new(),
            truncated: false,
        }
    }

    /// Whether any value was dropped for lack of room.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Write a complete value.
    pub fn write(&mut self, args: fmt::Arguments<'_>) -> Result<(), Overflow> {
        self.append(args, 0)
    }

    /// Write the opening of an object or array, to be ended by `closer`.
    pub fn open(&mut self, args: fmt::Arguments<'_>, closer: u8) -> Result<(), Overflow> {
        if self.closers.len() == MAX_DEPTH {
            self.truncated = true;
            return Err(Overflow);
        }

        self.append(args, 1)?;
        self.closers.push(closer);
        Ok(())
    }

    /// Close the innermost open object or array.
    pub fn close(&mut self) {
        if let Some(c) = self.closers.pop() {
            // Room for closers is always held back.
            self.out[self.len] = c;
            self.len += 1;
        }
    }

    /// Close everything still open, returning the number of bytes written.
    pub fn finish(mut self) -> usize {
        while !self.closers.is_empty() {
            self.close();
        }
        self.len
    }

    fn append(&mut self, args: fmt::Arguments<'_>, extra: usize) -> Result<(), Overflow> {
        if self.truncated {
            return Err(Overflow);
        }

        let reserved = self.closers.len() + extra;
        let limit = self.out.len().saturating_sub(reserved);

        let mut cursor = Cursor {
            out: &mut self.out[..limit],
            len: self.len,
        };

        if cursor.write_fmt(args).is_err() {
            self.truncated = true;
            return Err(Overflow);
        }

        self.len = cursor.len;
        Ok(())
    }
}

/// Formatting target that fails instead of writing past its slice.
struct Cursor<'a> {
    out: &'a mut [u8],
    len: usize,
}

impl Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len.checked_add(s.len()).ok_or(fmt::Error)?;
        let dst = self.out.get_mut(self.len..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
