use crate::record::LogRecord;
use chrono::SecondsFormat;
use std::fmt::Write as _;
use std::str::FromStr;

/// Output format of a [`ContextLayer`](crate::layer::ContextLayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `key=value` pairs, one record per line.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Error returned for a format name other than `text` or `json`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log format: {0}")]
pub struct ParseFormatError(pub String);

impl FromStr for Format {
    type Err = ParseFormatError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("text") {
            Ok(Format::Text)
        } else if name.eq_ignore_ascii_case("json") {
            Ok(Format::Json)
        } else {
            Err(ParseFormatError(name.to_string()))
        }
    }
}

impl Format {
    /// Render `record` as a single newline-terminated line.
    pub fn render(&self, record: &LogRecord) -> String {
        let mut line = match self {
            Format::Json => serde_json::to_string(record).unwrap_or_else(|e| {
                serde_json::json!({ "msg": format!("failed to serialize log record: {}", e) }).to_string()
            }),
            Format::Text => render_text(record),
        };
        line.push('\n');
        line
    }
}

fn render_text(record: &LogRecord) -> String {
    let mut out = String::with_capacity(128);
    let _ = write!(
        out,
        "time={} level={} target={}",
        record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        record.level,
        record.target
    );
    if let Some(message) = &record.message {
        out.push_str(" msg=");
        push_text_value(&mut out, message);
    }
    for (key, value) in &record.fields {
        let _ = write!(out, " {}=", key);
        match value {
            serde_json::Value::String(s) => push_text_value(&mut out, s),
            other => {
                let _ = write!(out, "{}", other);
            }
        }
    }
    out
}

fn push_text_value(out: &mut String, value: &str) {
    let needs_quotes = value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '=' || c == '"');
    if needs_quotes {
        let _ = write!(out, "{:?}", value);
    } else {
        out.push_str(value);
    }
}
