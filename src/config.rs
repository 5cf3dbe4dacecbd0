//! Compiler configuration.
//!
//! Read from `qtpl.toml` in the working directory, falling back to
//! `<config dir>/qtpl/config.toml`:
//!
//! ```toml
//! [compiler]
//! escaping = "mysql"          # mysql | mysql-no-backslash | standard
//! elision = "structural"      # structural | textual
//! strict_arguments = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::engine::{CompileOptions, ElisionMode, QueryCompiler};
use crate::error::{QtplError, QtplResult};
use crate::escape::{Escaper, MysqlEscaper, StandardEscaper};

/// Name of the project-local config file.
pub const CONFIG_FILE: &str = "qtpl.toml";

/// String escaping rules to compile against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscapingMode {
    /// MySQL backslash escaping.
    #[default]
    Mysql,
    /// MySQL with `NO_BACKSLASH_ESCAPES`.
    MysqlNoBackslash,
    /// ANSI quote doubling (PostgreSQL, SQLite).
    Standard,
}

impl EscapingMode {
    /// Name as written in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EscapingMode::Mysql => "mysql",
            EscapingMode::MysqlNoBackslash => "mysql-no-backslash",
            EscapingMode::Standard => "standard",
        }
    }
}

impl std::str::FromStr for EscapingMode {
    type Err = QtplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(EscapingMode::Mysql),
            "mysql-no-backslash" => Ok(EscapingMode::MysqlNoBackslash),
            "standard" => Ok(EscapingMode::Standard),
            other => Err(QtplError::Config(format!(
                "unknown escaping mode '{}', expected mysql, mysql-no-backslash or standard",
                other
            ))),
        }
    }
}

impl Escaper for EscapingMode {
    fn escape_string(&self, raw: &str) -> String {
        match self {
            EscapingMode::Mysql => MysqlEscaper::new().escape_string(raw),
            EscapingMode::MysqlNoBackslash => MysqlEscaper::no_backslash_escapes().escape_string(raw),
            EscapingMode::Standard => StandardEscaper.escape_string(raw),
        }
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QtplConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// The `[compiler]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub escaping: EscapingMode,
    pub elision: ElisionMode,
    pub strict_arguments: bool,
}

impl QtplConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(content: &str) -> QtplResult<Self> {
        toml::from_str(content).map_err(|e| QtplError::Config(e.to_string()))
    }

    /// Load from an explicit path; the file must exist.
    pub fn from_file(path: &Path) -> QtplResult<Self> {
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, else the first config found in the default
    /// locations, else defaults.
    pub fn load(path: Option<&Path>) -> QtplResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_locations().into_iter().find(|p| p.is_file()) {
            Some(found) => Self::from_file(&found),
            None => Ok(Self::default()),
        }
    }

    /// Lookup order for config files.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("qtpl").join("config.toml"));
        }
        paths
    }
}

impl CompilerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }

    pub fn options(&self) -> CompileOptions {
        CompileOptions {
            elision: self.elision,
            strict_arguments: self.strict_arguments,
        }
    }

    /// Build a compiler using the configured escaping rules.
    pub fn compiler(&self) -> QueryCompiler<EscapingMode> {
        QueryCompiler::with_options(self.escaping, self.options())
    }
}

/// Builder for CompilerConfig
#[derive(Debug, Default)]
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn escaping(mut self, mode: EscapingMode) -> Self {
        self.config.escaping = mode;
        self
    }

    pub fn elision(mut self, mode: ElisionMode) -> Self {
        self.config.elision = mode;
        self
    }

    pub fn strict_arguments(mut self, strict: bool) -> Self {
        self.config.strict_arguments = strict;
        self
    }

    pub fn build(self) -> CompilerConfig {
        self.config
    }
}
