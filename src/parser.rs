//! Template tokenizer using nom.
//!
//! Splits a template into literal text, placeholder markers and flat
//! conditional blocks.
//!
//! # Syntax Overview
//!
//! ```text
//! SELECT ?# FROM users WHERE id = ?d {AND name = ?}
//!        ─┬                       ─┬ ─────────┬───
//!         │                        │          └── Block (elided when skipped)
//!         │                        └── Typed marker (?d ?f ?a ?# ?s)
//!         └── Identifier marker
//! ```
//!
//! A block is a `{`, then any text without braces, then `}`. Braces that do
//! not close such a span (nested or unbalanced) are plain text, so in
//! `{a {b} c}` only `{b}` is a block.

use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

use crate::error::{QtplError, QtplResult};

/// Type codes that may follow `?`.
pub const MARKER_CODES: &str = "dfa#s";

/// Placeholder type, selected by the code after `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `?` or `?s`: escaped scalar.
    Str,
    /// `?d`: integer.
    Int,
    /// `?f`: float.
    Float,
    /// `?a`: value list or `key` = value list.
    Array,
    /// `?#`: backtick-quoted identifier(s).
    Ident,
}

impl Marker {
    /// Resolve the optional code following `?`.
    pub fn from_code(code: Option<char>) -> QtplResult<Self> {
        match code {
            None | Some('s') => Ok(Marker::Str),
            Some('d') => Ok(Marker::Int),
            Some('f') => Ok(Marker::Float),
            Some('a') => Ok(Marker::Array),
            Some('#') => Ok(Marker::Ident),
            Some(other) => Err(QtplError::UnsupportedPlaceholderType(other)),
        }
    }

    /// Marker as written in a template.
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Str => "?s",
            Marker::Int => "?d",
            Marker::Float => "?f",
            Marker::Array => "?a",
            Marker::Ident => "?#",
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text or marker, the content of both the top level and blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece<'a> {
    Text(&'a str),
    Marker(Marker),
}

/// One top-level element of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Piece(Piece<'a>),
    /// A `{...}` span; the delimiters are not stored.
    Block(Vec<Piece<'a>>),
}

/// A tokenized template, reusable across compile calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<'a> {
    source: &'a str,
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Tokenize a template string.
    pub fn parse(source: &'a str) -> QtplResult<Self> {
        match parse_segments(source) {
            Ok(("", segments)) => Ok(Self { source, segments }),
            Ok((remaining, _)) => Err(QtplError::parse(
                source.len() - remaining.len(),
                format!("Unexpected trailing content: '{}'", remaining),
            )),
            Err(e) => Err(QtplError::parse(0, format!("Parse failed: {:?}", e))),
        }
    }

    /// The template text as given.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// All markers in template order, i.e. argument order.
    pub fn markers(&self) -> Vec<Marker> {
        self.markers_with_block().into_iter().map(|(m, _)| m).collect()
    }

    /// Markers in argument order, each flagged with whether it sits in a
    /// conditional block.
    pub fn markers_with_block(&self) -> Vec<(Marker, bool)> {
        let mut markers = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Piece(Piece::Marker(m)) => markers.push((*m, false)),
                Segment::Piece(Piece::Text(_)) => {}
                Segment::Block(pieces) => markers.extend(pieces.iter().filter_map(|p| match p {
                    Piece::Marker(m) => Some((*m, true)),
                    Piece::Text(_) => None,
                })),
            }
        }
        markers
    }

    /// Number of arguments the template consumes.
    pub fn placeholder_count(&self) -> usize {
        self.markers().len()
    }

    /// The conditional blocks, in template order.
    pub fn blocks(&self) -> impl Iterator<Item = &[Piece<'a>]> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Block(pieces) => Some(pieces.as_slice()),
            Segment::Piece(_) => None,
        })
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '?' | '{' | '}')
}

/// Parse all segments of a template.
fn parse_segments(input: &str) -> IResult<&str, Vec<Segment<'_>>> {
    many0(alt((
        map(parse_block, Segment::Block),
        map(parse_piece, Segment::Piece),
        // A brace that does not open or close a flat block.
        map(recognize(one_of("{}")), |s| Segment::Piece(Piece::Text(s))),
    )))(input)
}

/// Parse a `{...}` block with no braces inside.
fn parse_block(input: &str) -> IResult<&str, Vec<Piece<'_>>> {
    delimited(char('{'), many0(parse_piece), char('}'))(input)
}

/// Parse a marker or a run of plain text.
fn parse_piece(input: &str) -> IResult<&str, Piece<'_>> {
    alt((
        map(parse_marker, Piece::Marker),
        map(take_till1(is_special), Piece::Text),
    ))(input)
}

/// Parse `?` with its optional type code.
fn parse_marker(input: &str) -> IResult<&str, Marker> {
    preceded(char('?'), map_res(opt(one_of(MARKER_CODES)), Marker::from_code))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text() {
        let t = Template::parse("SELECT 1").unwrap();
        assert_eq!(t.segments(), &[Segment::Piece(Piece::Text("SELECT 1"))]);
        assert_eq!(t.placeholder_count(), 0);
    }

    #[test]
    fn test_empty_template() {
        let t = Template::parse("").unwrap();
        assert!(t.segments().is_empty());
    }

    #[test]
    fn test_markers_in_order() {
        let t = Template::parse("SELECT ?# FROM t WHERE a = ?d AND b = ?f AND c IN (?a) AND d = ? AND e = ?s")
            .unwrap();
        assert_eq!(
            t.markers(),
            vec![Marker::Ident, Marker::Int, Marker::Float, Marker::Array, Marker::Str, Marker::Str]
        );
    }

    #[test]
    fn test_markers_with_block() {
        let t = Template::parse("SELECT ?# FROM t {WHERE a = ?d} LIMIT ?d").unwrap();
        assert_eq!(
            t.markers_with_block(),
            vec![(Marker::Ident, false), (Marker::Int, true), (Marker::Int, false)]
        );
        assert_eq!(t.markers(), vec![Marker::Ident, Marker::Int, Marker::Int]);
    }

    #[test]
    fn test_unknown_code_is_text() {
        // `?x` is a bare marker followed by the text "x"
        let t = Template::parse("?x").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Piece(Piece::Marker(Marker::Str)),
                Segment::Piece(Piece::Text("x")),
            ]
        );
    }

    #[test]
    fn test_block() {
        let t = Template::parse("SELECT * FROM t {WHERE id = ?d}").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Piece(Piece::Text("SELECT * FROM t ")),
                Segment::Block(vec![Piece::Text("WHERE id = "), Piece::Marker(Marker::Int)]),
            ]
        );
        assert_eq!(t.blocks().count(), 1);
    }

    #[test]
    fn test_marker_closes_against_brace() {
        let t = Template::parse("{?}").unwrap();
        assert_eq!(t.segments(), &[Segment::Block(vec![Piece::Marker(Marker::Str)])]);
    }

    #[test]
    fn test_nested_braces_only_inner_is_block() {
        let t = Template::parse("{a {b} c}").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Piece(Piece::Text("{")),
                Segment::Piece(Piece::Text("a ")),
                Segment::Block(vec![Piece::Text("b")]),
                Segment::Piece(Piece::Text(" c")),
                Segment::Piece(Piece::Text("}")),
            ]
        );
    }

    #[test]
    fn test_unbalanced_braces_are_text() {
        let t = Template::parse("} ?d {").unwrap();
        assert_eq!(t.blocks().count(), 0);
        assert_eq!(t.markers(), vec![Marker::Int]);
    }

    #[test]
    fn test_marker_from_code_guard() {
        assert_eq!(Marker::from_code(None).unwrap(), Marker::Str);
        assert!(matches!(
            Marker::from_code(Some('x')),
            Err(QtplError::UnsupportedPlaceholderType('x'))
        ));
    }
}
