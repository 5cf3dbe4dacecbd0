//! Escaping primitives and scalar quoting.
//!
//! An [`Escaper`] is the one capability the compiler borrows from a database
//! connection: turning raw text into the body of a string literal. Quoting,
//! numbers, booleans and `NULL` are handled here on top of it.

use crate::error::{QtplError, QtplResult};
use crate::value::SqlValue;

/// Escapes raw text for embedding between single quotes.
///
/// Implementations must follow the target engine's literal rules exactly;
/// every string value passes through here before it reaches the output.
/// Closures of type `Fn(&str) -> String` implement this trait, so a driver's
/// own escaping function can be plugged in directly.
pub trait Escaper {
    /// Escape `raw` so that `'<result>'` parses back to `raw`.
    fn escape_string(&self, raw: &str) -> String;
}

impl<F> Escaper for F
where
    F: Fn(&str) -> String,
{
    fn escape_string(&self, raw: &str) -> String {
        self(raw)
    }
}

/// MySQL / MariaDB escaping, as done by `mysql_real_escape_string`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MysqlEscaper {
    no_backslash_escapes: bool,
}

impl MysqlEscaper {
    /// Backslash escaping (server default SQL mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Escaping for servers running with `NO_BACKSLASH_ESCAPES`:
    /// quotes are doubled and backslashes are ordinary characters.
    pub fn no_backslash_escapes() -> Self {
        Self {
            no_backslash_escapes: true,
        }
    }
}

impl Escaper for MysqlEscaper {
    fn escape_string(&self, raw: &str) -> String {
        if self.no_backslash_escapes {
            return raw.replace('\'', "''");
        }

        let mut out = String::with_capacity(raw.len() + 8);
        for c in raw.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                _ => out.push(c),
            }
        }
        out
    }
}

/// ANSI SQL string literals (PostgreSQL with `standard_conforming_strings`,
/// SQLite): a quote is written as two quotes, nothing else is special.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardEscaper;

impl Escaper for StandardEscaper {
    fn escape_string(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }
}

/// Render a scalar as a SQL literal.
///
/// Containers and the skip sentinel are rejected; they never reach a
/// literal position.
pub fn quote_value<E: Escaper + ?Sized>(value: &SqlValue, escaper: &E) -> QtplResult<String> {
    match value {
        SqlValue::Null => Ok("NULL".to_string()),
        SqlValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        SqlValue::Int(n) => Ok(n.to_string()),
        SqlValue::Float(f) => format_float(*f),
        SqlValue::Text(s) => Ok(format!("'{}'", escaper.escape_string(s))),
        SqlValue::Sequence(_) | SqlValue::Mapping(_) | SqlValue::Skip => {
            Err(QtplError::InvalidValueType(value.kind()))
        }
    }
}

/// Shortest decimal text that reads back as the same `f64`.
///
/// Magnitudes of 1e16 and above, or below 1e-5, use exponent notation.
pub(crate) fn format_float(f: f64) -> QtplResult<String> {
    if !f.is_finite() {
        return Err(QtplError::InvalidValueType("non-finite float"));
    }
    let magnitude = f.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-5) {
        Ok(format!("{:e}", f))
    } else {
        Ok(f.to_string())
    }
}
