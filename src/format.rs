//! Type-directed value formatting.
//!
//! Turns one argument into the text that replaces its marker.

use crate::error::{QtplError, QtplResult};
use crate::escape::{format_float, quote_value, Escaper};
use crate::parser::Marker;
use crate::value::SqlValue;

/// Format `value` for a placeholder of type `marker`.
///
/// The skip sentinel and null both render as `NULL` whatever the marker;
/// elision of the surrounding block is decided by the caller.
pub fn format_value<E: Escaper + ?Sized>(
    value: &SqlValue,
    marker: Marker,
    escaper: &E,
) -> QtplResult<String> {
    if matches!(value, SqlValue::Skip | SqlValue::Null) {
        return Ok("NULL".to_string());
    }

    match marker {
        Marker::Str => match value {
            SqlValue::Sequence(_) | SqlValue::Mapping(_) => {
                Err(QtplError::shape(marker.as_str(), value.kind()))
            }
            _ => quote_value(value, escaper),
        },
        Marker::Int => to_int(value, marker).map(|n| n.to_string()),
        Marker::Float => to_float(value, marker).and_then(format_float),
        Marker::Array => format_array(value, escaper),
        Marker::Ident => format_identifiers(value),
    }
}

/// `?a`: a value list, or `` `key` = value `` pairs for a mapping.
fn format_array<E: Escaper + ?Sized>(value: &SqlValue, escaper: &E) -> QtplResult<String> {
    match value {
        SqlValue::Sequence(items) => {
            let parts = items
                .iter()
                .map(|v| quote_value(v, escaper))
                .collect::<QtplResult<Vec<_>>>()?;
            Ok(parts.join(", "))
        }
        // Keys are trusted identifiers and are not escaped.
        SqlValue::Mapping(pairs) => {
            let parts = pairs
                .iter()
                .map(|(k, v)| Ok(format!("`{}` = {}", k, quote_value(v, escaper)?)))
                .collect::<QtplResult<Vec<_>>>()?;
            Ok(parts.join(", "))
        }
        _ => Err(QtplError::shape(Marker::Array.as_str(), value.kind())),
    }
}

/// `?#`: one identifier or a list of them, backtick-quoted.
///
/// Identifiers are trusted: an embedded backtick is copied as is.
fn format_identifiers(value: &SqlValue) -> QtplResult<String> {
    match value {
        SqlValue::Text(name) => Ok(format!("`{}`", name)),
        SqlValue::Sequence(items) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    SqlValue::Text(name) => Ok(format!("`{}`", name)),
                    other => Err(QtplError::shape(Marker::Ident.as_str(), other.kind())),
                })
                .collect::<QtplResult<Vec<_>>>()?;
            Ok(parts.join(", "))
        }
        _ => Err(QtplError::shape(Marker::Ident.as_str(), value.kind())),
    }
}

/// Integer coercion: truncates toward zero, non-numeric text is `0`.
fn to_int(value: &SqlValue, marker: Marker) -> QtplResult<i64> {
    match value {
        SqlValue::Bool(b) => Ok(i64::from(*b)),
        SqlValue::Int(n) => Ok(*n),
        // `as` saturates at the i64 bounds and maps NaN to 0
        SqlValue::Float(f) => Ok(*f as i64),
        SqlValue::Text(s) => Ok(match numeric_prefix(s) {
            Some(Numeric::Int(n)) => n,
            Some(Numeric::Float(f)) => f as i64,
            None => 0,
        }),
        SqlValue::Null | SqlValue::Sequence(_) | SqlValue::Mapping(_) | SqlValue::Skip => {
            Err(QtplError::shape(marker.as_str(), value.kind()))
        }
    }
}

/// Float coercion: non-numeric text is `0`.
fn to_float(value: &SqlValue, marker: Marker) -> QtplResult<f64> {
    match value {
        SqlValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        SqlValue::Int(n) => Ok(*n as f64),
        SqlValue::Float(f) => Ok(*f),
        SqlValue::Text(s) => Ok(match numeric_prefix(s) {
            Some(Numeric::Int(n)) => n as f64,
            Some(Numeric::Float(f)) => f,
            None => 0.0,
        }),
        SqlValue::Null | SqlValue::Sequence(_) | SqlValue::Mapping(_) | SqlValue::Skip => {
            Err(QtplError::shape(marker.as_str(), value.kind()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

/// Leading number of a string, after optional whitespace: `"12abc"` is 12,
/// `" -3.5e2x"` is -350.0. Returns `None` when no digit leads the text.
fn numeric_prefix(s: &str) -> Option<Numeric> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    let mut integral = true;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
            integral = false;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
            integral = false;
        }
    }

    let text = &s[..end];
    if integral {
        match text.parse::<i64>() {
            Ok(n) => Some(Numeric::Int(n)),
            // Out of range: saturate like the float path does
            Err(_) => text.parse::<f64>().ok().map(|f| Numeric::Int(f as i64)),
        }
    } else {
        text.parse::<f64>().ok().map(Numeric::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::MysqlEscaper;
    use pretty_assertions::assert_eq;

    fn fmt(value: impl Into<SqlValue>, marker: Marker) -> QtplResult<String> {
        format_value(&value.into(), marker, &MysqlEscaper::new())
    }

    #[test]
    fn test_skip_renders_null_for_every_marker() {
        for marker in [Marker::Str, Marker::Int, Marker::Float, Marker::Array, Marker::Ident] {
            assert_eq!(fmt(SqlValue::Skip, marker).unwrap(), "NULL");
        }
    }

    #[test]
    fn test_null_renders_null_for_every_marker() {
        for marker in [Marker::Str, Marker::Int, Marker::Float, Marker::Array, Marker::Ident] {
            assert_eq!(fmt(SqlValue::Null, marker).unwrap(), "NULL");
        }
        assert_eq!(fmt(None::<i64>, Marker::Int).unwrap(), "NULL");
    }

    #[test]
    fn test_string_marker_escapes() {
        assert_eq!(fmt("O'Brien", Marker::Str).unwrap(), "'O\\'Brien'");
        assert_eq!(fmt(SqlValue::Null, Marker::Str).unwrap(), "NULL");
        assert_eq!(fmt(true, Marker::Str).unwrap(), "1");
        assert_eq!(fmt(12, Marker::Str).unwrap(), "12");
        assert!(matches!(
            fmt(vec![1, 2], Marker::Str),
            Err(QtplError::ShapeMismatch { code: "?s", found: "sequence" })
        ));
    }

    #[test]
    fn test_int_marker_always_integer_text() {
        assert_eq!(fmt(5, Marker::Int).unwrap(), "5");
        assert_eq!(fmt(3.99, Marker::Int).unwrap(), "3");
        assert_eq!(fmt(-3.99, Marker::Int).unwrap(), "-3");
        assert_eq!(fmt("42", Marker::Int).unwrap(), "42");
        assert_eq!(fmt("12abc", Marker::Int).unwrap(), "12");
        assert_eq!(fmt(" 7.9", Marker::Int).unwrap(), "7");
        assert_eq!(fmt("1e3", Marker::Int).unwrap(), "1000");
        assert_eq!(fmt("abc", Marker::Int).unwrap(), "0");
        assert_eq!(fmt("", Marker::Int).unwrap(), "0");
        assert_eq!(fmt(true, Marker::Int).unwrap(), "1");
        assert_eq!(fmt(f64::NAN, Marker::Int).unwrap(), "0");
        assert_eq!(fmt(1e30, Marker::Int).unwrap(), i64::MAX.to_string());
        assert_eq!(
            fmt("99999999999999999999", Marker::Int).unwrap(),
            i64::MAX.to_string()
        );
    }

    #[test]
    fn test_int_marker_rejects_containers() {
        let err = fmt(SqlValue::mapping([("a", 1)]), Marker::Int).unwrap_err();
        assert!(matches!(
            err,
            QtplError::ShapeMismatch { code: "?d", found: "mapping" }
        ));
    }

    #[test]
    fn test_float_marker() {
        assert_eq!(fmt(1.5, Marker::Float).unwrap(), "1.5");
        assert_eq!(fmt(0.1 + 0.2, Marker::Float).unwrap(), "0.30000000000000004");
        assert_eq!(fmt(2.0, Marker::Float).unwrap(), "2");
        assert_eq!(fmt(7, Marker::Float).unwrap(), "7");
        assert_eq!(fmt("3.25kg", Marker::Float).unwrap(), "3.25");
        assert_eq!(fmt(".5", Marker::Float).unwrap(), "0.5");
        assert_eq!(fmt("n/a", Marker::Float).unwrap(), "0");
        assert!(fmt(f64::INFINITY, Marker::Float).is_err());
    }

    #[test]
    fn test_array_sequence() {
        assert_eq!(
            fmt(SqlValue::sequence([SqlValue::from(1), "a".into(), SqlValue::Null]), Marker::Array)
                .unwrap(),
            "1, 'a', NULL"
        );
        assert_eq!(fmt(Vec::<i64>::new(), Marker::Array).unwrap(), "");
    }

    #[test]
    fn test_array_mapping_keeps_order() {
        let map = SqlValue::mapping([
            ("name", SqlValue::from("Jack")),
            ("email", SqlValue::Null),
            ("age", SqlValue::from(30)),
        ]);
        assert_eq!(
            fmt(map, Marker::Array).unwrap(),
            "`name` = 'Jack', `email` = NULL, `age` = 30"
        );
    }

    #[test]
    fn test_array_errors() {
        assert!(matches!(
            fmt(5, Marker::Array),
            Err(QtplError::ShapeMismatch { code: "?a", found: "integer" })
        ));
        assert!(matches!(
            fmt(SqlValue::sequence([vec![1]]), Marker::Array),
            Err(QtplError::InvalidValueType("sequence"))
        ));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(fmt("name", Marker::Ident).unwrap(), "`name`");
        assert_eq!(fmt(vec!["a", "b"], Marker::Ident).unwrap(), "`a`, `b`");
        assert!(matches!(
            fmt(vec![SqlValue::from("a"), SqlValue::from(1)], Marker::Ident),
            Err(QtplError::ShapeMismatch { code: "?#", found: "integer" })
        ));
        assert!(matches!(
            fmt(SqlValue::mapping([("a", 1)]), Marker::Ident),
            Err(QtplError::ShapeMismatch { code: "?#", found: "mapping" })
        ));
    }

    #[test]
    fn test_identifiers_are_not_escaped() {
        // Caller-trusted: backticks pass straight through.
        assert_eq!(fmt("a`b", Marker::Ident).unwrap(), "`a`b`");
        assert_eq!(
            fmt(SqlValue::mapping([("x` = 1, `y", 2)]), Marker::Array).unwrap(),
            "`x` = 1, `y` = 2"
        );
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(numeric_prefix("42"), Some(Numeric::Int(42)));
        assert_eq!(numeric_prefix("-17 apples"), Some(Numeric::Int(-17)));
        assert_eq!(numeric_prefix("5."), Some(Numeric::Float(5.0)));
        assert_eq!(numeric_prefix("2e"), Some(Numeric::Int(2)));
        assert_eq!(numeric_prefix("+.25"), Some(Numeric::Float(0.25)));
        assert_eq!(numeric_prefix("."), None);
        assert_eq!(numeric_prefix("-"), None);
        assert_eq!(numeric_prefix("x1"), None);
    }
}
