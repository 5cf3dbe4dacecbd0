//! Argument values for template compilation.
//!
//! Every positional argument is a [`SqlValue`]. The formatter matches on the
//! variant, so the shape a placeholder receives is always explicit.

/// Dynamic value type for template arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Ordered list, rendered element by element.
    Sequence(Vec<SqlValue>),
    /// Ordered `key => value` pairs. Insertion order is rendering order.
    Mapping(Vec<(String, SqlValue)>),
    /// The skip sentinel: drop this argument and the block around it.
    Skip,
}

impl SqlValue {
    /// Build a mapping from key/value pairs, keeping their order.
    pub fn mapping<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        SqlValue::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence from anything convertible into values.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        SqlValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Whether this is the skip sentinel.
    pub fn is_skip(&self) -> bool {
        matches!(self, SqlValue::Skip)
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "string",
            SqlValue::Sequence(_) => "sequence",
            SqlValue::Mapping(_) => "mapping",
            SqlValue::Skip => "skip",
        }
    }
}

/// The skip sentinel.
///
/// Place it in the argument list to omit a value together with the
/// conditional block that contains its placeholder.
pub fn skip() -> SqlValue {
    SqlValue::Skip
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    SqlValue::Int(v as i64)
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        SqlValue::sequence(v)
    }
}

/// JSON objects become mappings (key order preserved), arrays become sequences.
impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                // u64 beyond i64::MAX, or a real float
                None => SqlValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => SqlValue::Text(s),
            Value::Array(items) => SqlValue::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => SqlValue::Mapping(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}
