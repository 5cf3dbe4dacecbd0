//! Template compilation engine.
//!
//! Runs the two passes over a tokenized [`Template`]: markers are replaced
//! by formatted arguments, then each conditional block is kept (delimiters
//! stripped) or elided.

use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::error::{QtplError, QtplResult};
use crate::escape::{Escaper, MysqlEscaper};
use crate::format::format_value;
use crate::parser::{Piece, Segment, Template};
use crate::value::SqlValue;

static SKIP: SqlValue = SqlValue::Skip;

/// How the resolver decides that a block must be elided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElisionMode {
    /// Elide blocks in which a placeholder received the skip sentinel.
    #[default]
    Structural,
    /// Elide blocks whose rendered text contains `NULL`. This also drops
    /// blocks holding a null value or a string such as `'NULL'`.
    Textual,
}

impl ElisionMode {
    /// Name as written in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElisionMode::Structural => "structural",
            ElisionMode::Textual => "textual",
        }
    }
}

impl std::str::FromStr for ElisionMode {
    type Err = QtplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structural" => Ok(ElisionMode::Structural),
            "textual" => Ok(ElisionMode::Textual),
            other => Err(QtplError::Config(format!(
                "unknown elision mode '{}', expected structural or textual",
                other
            ))),
        }
    }
}

/// Per-compiler behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub elision: ElisionMode,
    /// Fail on missing or surplus arguments instead of skipping.
    pub strict_arguments: bool,
}

/// Hands out arguments in placeholder order.
///
/// Each argument is read at most once; the position only moves forward.
#[derive(Debug)]
pub struct ArgCursor<'a> {
    args: &'a [SqlValue],
    position: usize,
    strict: bool,
}

impl<'a> ArgCursor<'a> {
    pub fn new(args: &'a [SqlValue], strict: bool) -> Self {
        Self {
            args,
            position: 0,
            strict,
        }
    }

    /// Argument for the next placeholder.
    ///
    /// Past the end of the list this is the skip sentinel, or an error in
    /// strict mode.
    pub fn next_arg(&mut self) -> QtplResult<&'a SqlValue> {
        self.position += 1;
        match self.args.get(self.position - 1) {
            Some(value) => Ok(value),
            None if self.strict => Err(QtplError::MissingArgument {
                position: self.position,
            }),
            None => {
                warn!(
                    placeholder = self.position,
                    supplied = self.args.len(),
                    "argument list exhausted, skipping placeholder"
                );
                Ok(&SKIP)
            }
        }
    }

    /// Number of placeholders served so far.
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// In strict mode, reject arguments no placeholder asked for.
    pub fn finish(self) -> QtplResult<()> {
        if self.strict && self.position < self.args.len() {
            return Err(QtplError::TooManyArguments {
                expected: self.position,
                supplied: self.args.len(),
            });
        }
        Ok(())
    }
}

/// A segment after placeholder substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Block {
        body: String,
        /// A placeholder in the block received the skip sentinel.
        skipped: bool,
    },
}

/// Compiles query templates into literal SQL.
///
/// # Example
///
/// ```
/// use qtpl::prelude::*;
///
/// let compiler = QueryCompiler::new(MysqlEscaper::new());
/// let sql = compiler
///     .compile("SELECT * FROM t {WHERE id = ?d}", &[skip()])
///     .unwrap();
/// assert_eq!(sql, "SELECT * FROM t ");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler<E = MysqlEscaper> {
    escaper: E,
    options: CompileOptions,
}

impl<E: Escaper> QueryCompiler<E> {
    /// Compiler with default options: structural elision, lenient arguments.
    pub fn new(escaper: E) -> Self {
        Self::with_options(escaper, CompileOptions::default())
    }

    pub fn with_options(escaper: E, options: CompileOptions) -> Self {
        Self { escaper, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn escaper(&self) -> &E {
        &self.escaper
    }

    /// Compile `template` with positional `args`.
    pub fn compile(&self, template: &str, args: &[SqlValue]) -> QtplResult<String> {
        let template = Template::parse(template)?;
        self.compile_template(&template, args)
    }

    /// Compile an already tokenized template.
    pub fn compile_template(&self, template: &Template<'_>, args: &[SqlValue]) -> QtplResult<String> {
        debug!(
            template_len = template.source().len(),
            args = args.len(),
            "compiling query template"
        );

        let mut cursor = ArgCursor::new(args, self.options.strict_arguments);
        let rendered = self.substitute(template, &mut cursor)?;
        cursor.finish()?;

        Ok(resolve_blocks(&rendered, self.options.elision))
    }

    /// Pass 1: replace every marker, consuming arguments through `cursor`.
    pub fn substitute(
        &self,
        template: &Template<'_>,
        cursor: &mut ArgCursor<'_>,
    ) -> QtplResult<Vec<Rendered>> {
        let mut out = Vec::with_capacity(template.segments().len());

        for segment in template.segments() {
            match segment {
                Segment::Piece(piece) => {
                    let mut text = String::new();
                    self.render_piece(piece, cursor, &mut text)?;
                    out.push(Rendered::Text(text));
                }
                Segment::Block(pieces) => {
                    let mut body = String::new();
                    let mut skipped = false;
                    for piece in pieces {
                        skipped |= self.render_piece(piece, cursor, &mut body)?;
                    }
                    out.push(Rendered::Block { body, skipped });
                }
            }
        }

        debug!(placeholders = cursor.consumed(), "placeholders substituted");
        Ok(out)
    }

    /// Append one piece to `out`. Returns whether it consumed a skip.
    fn render_piece(
        &self,
        piece: &Piece<'_>,
        cursor: &mut ArgCursor<'_>,
        out: &mut String,
    ) -> QtplResult<bool> {
        match piece {
            Piece::Text(text) => {
                out.push_str(text);
                Ok(false)
            }
            Piece::Marker(marker) => {
                let value = cursor.next_arg()?;
                out.push_str(&format_value(value, *marker, &self.escaper)?);
                Ok(value.is_skip())
            }
        }
    }
}

/// Pass 2: join rendered segments, keeping or eliding each block.
pub fn resolve_blocks(rendered: &[Rendered], mode: ElisionMode) -> String {
    let mut sql = String::new();

    for segment in rendered {
        match segment {
            Rendered::Text(text) => sql.push_str(text),
            Rendered::Block { body, skipped } => {
                let elide = match mode {
                    ElisionMode::Structural => *skipped,
                    ElisionMode::Textual => body.contains("NULL"),
                };
                trace!(block = %body, elide, "conditional block");
                if !elide {
                    sql.push_str(body);
                }
            }
        }
    }

    sql
}
