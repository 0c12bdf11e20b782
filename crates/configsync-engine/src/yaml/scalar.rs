use std::fmt;

use serde::Serialize;

/// A scalar written into a YAML value position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl ScalarValue {
    /// Converts a parsed YAML scalar; sequences and mappings have no scalar
    /// form.
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        use serde_yaml::Value;
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// Renders the value for a position whose previous value used `quote`.
    ///
    /// Only strings are quoted. They keep the original quote style, and
    /// unquoted ones gain double quotes when they would not read back as the
    /// same string.
    pub fn render(&self, quote: Quote) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Str(s) => match quote {
                Quote::Single => single_quoted(s),
                Quote::Double => double_quoted(s),
                Quote::Plain if needs_quotes(s) => double_quoted(s),
                Quote::Plain => s.clone(),
            },
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Quote::Plain))
    }
}

/// Quote style of a scalar as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    #[default]
    Plain,
    Single,
    Double,
}

impl Quote {
    pub fn of(raw: &str) -> Self {
        match raw.trim_start().chars().next() {
            Some('"') => Self::Double,
            Some('\'') => Self::Single,
            _ => Self::Plain,
        }
    }
}

/// True when a plain scalar would change meaning or fail to parse.
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.contains([':', '#', '"', '\'', ' ']) || s.contains(char::is_control)
}

/// Double-quoted form; line breaks, tabs and other control characters become
/// escapes so the value stays on one line.
pub fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-quoted form. Single quotes cannot escape control characters, so
/// such strings fall back to double quotes.
pub fn single_quoted(s: &str) -> String {
    if s.contains(char::is_control) {
        return double_quoted(s);
    }
    format!("'{}'", s.replace('\'', "''"))
}

/// Splits a value position into `(value, comment)`.
///
/// The comment starts at the whitespace run before the first `#` that sits
/// outside quotes and follows whitespace, so `comment` keeps its original
/// spacing. `comment` is empty when there is none.
pub fn split_comment(rest: &str) -> (&str, &str) {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut prev_ws = true;

    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_double => escaped = true,
            '"' if !in_single => in_double = !in_double,
            '\'' if !in_double => in_single = !in_single,
            '#' if prev_ws && !in_single && !in_double => {
                let value = rest[..i].trim_end();
                return (value, &rest[value.len()..]);
            }
            _ => {}
        }
        prev_ws = c.is_whitespace();
    }
    (rest.trim_end(), "")
}
