//! # qtpl — typed SQL query templates
//!
//! Compile a query template and positional arguments into one literal SQL
//! statement, with every value escaped.
//!
//! ## Quick Example
//!
//! ```
//! use qtpl::prelude::*;
//!
//! let sql = qtpl::compile(
//!     "SELECT * FROM t WHERE id = ?d AND name = ?s",
//!     &[5.into(), "O'Brien".into()],
//! )?;
//! assert_eq!(sql, "SELECT * FROM t WHERE id = 5 AND name = 'O\\'Brien'");
//!
//! // Blocks vanish when one of their arguments is skipped
//! let sql = qtpl::compile("SELECT * FROM t {WHERE id = ?d}", &[skip()])?;
//! assert_eq!(sql, "SELECT * FROM t ");
//! # Ok::<(), QtplError>(())
//! ```
//!
//! ## Placeholders
//!
//! | Marker    | Argument                     | Output                      |
//! |-----------|------------------------------|-----------------------------|
//! | `?`, `?s` | scalar                       | escaped literal             |
//! | `?d`      | number or numeric string     | integer                     |
//! | `?f`      | number or numeric string     | float                       |
//! | `?a`      | sequence / mapping           | `1, 2` / `` `k` = 'v' ``    |
//! | `?#`      | identifier or list of them   | `` `col1`, `col2` ``        |
//! | `{...}`   | —                            | dropped if an arg is skipped|
//!
//! Identifiers (`?#` values and `?a` mapping keys) are wrapped in backticks
//! but never escaped. Only pass identifiers you control.

pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod format;
pub mod parser;
pub mod value;

pub mod prelude {
    pub use crate::config::{CompilerConfig, EscapingMode, QtplConfig};
    pub use crate::engine::{CompileOptions, ElisionMode, QueryCompiler};
    pub use crate::error::*;
    pub use crate::escape::{Escaper, MysqlEscaper, StandardEscaper};
    pub use crate::parser::{Marker, Template};
    pub use crate::value::{skip, SqlValue};
}

pub use value::skip;

/// Compile a template with MySQL escaping and default options.
///
/// # Example
///
/// ```
/// let sql = qtpl::compile("SELECT ?# FROM users", &[vec!["id", "email"].into()]).unwrap();
/// assert_eq!(sql, "SELECT `id`, `email` FROM users");
/// ```
pub fn compile(template: &str, args: &[value::SqlValue]) -> error::QtplResult<String> {
    engine::QueryCompiler::new(escape::MysqlEscaper::new()).compile(template, args)
}
