//! Correction reply parsing
//!
//! Completion services wrap their JSON in prose or code fences and are loose
//! about key spelling, so parsing is lenient:
//! - the first balanced `{...}` that parses as a JSON object with a column
//!   list is used
//! - keys match case-insensitively, ignoring `_` and `-`
//! - an empty or missing `correctedColumns` falls back to the first non-empty
//!   alternate list, in [`ALTERNATE_COLUMN_KEYS`] order

use serde_json::{Map, Value};

use super::CorrectionError;

/// Alternate column-list keys, highest precedence first (normalized form)
pub const ALTERNATE_COLUMN_KEYS: &[&str] = &[
    "correctheaders",
    "correctedheaders",
    "canonicalheaders",
    "columns",
    "headers",
];

const PRIMARY_COLUMN_KEY: &str = "correctedcolumns";

/// Fields recovered from a completion reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Proposed column names, positional
    pub columns: Vec<String>,
    /// Key the columns were read from (normalized)
    pub source_key: String,
    pub was_corrected: Option<bool>,
    pub changes_report: Option<String>,
}

/// Parse a raw completion into a [`ParsedReply`]
///
/// Objects are tried in order of appearance; the first one carrying a usable
/// column list wins, so an echoed format example ahead of the answer is skipped.
pub fn parse_reply(raw: &str) -> Result<ParsedReply, CorrectionError> {
    let mut saw_object = false;
    for object in json_objects(raw) {
        saw_object = true;
        if let Some(reply) = reply_from_object(object) {
            return Ok(reply);
        }
    }

    let reason = if saw_object {
        "reply carries no usable column list"
    } else {
        "no JSON object found in reply"
    };
    Err(CorrectionError::MalformedReply(reason.to_string()))
}

fn reply_from_object(object: Map<String, Value>) -> Option<ParsedReply> {
    let fields: Map<String, Value> = object
        .into_iter()
        .map(|(key, value)| (normalize_key(&key), value))
        .collect();

    let (source_key, columns) = std::iter::once(PRIMARY_COLUMN_KEY)
        .chain(ALTERNATE_COLUMN_KEYS.iter().copied())
        .find_map(|key| {
            fields
                .get(key)
                .and_then(string_list)
                .filter(|list| !list.is_empty())
                .map(|list| (key.to_string(), list))
        })?;

    if source_key != PRIMARY_COLUMN_KEY {
        tracing::debug!(key = %source_key, "Correction reply used an alternate column key");
    }

    let was_corrected = fields.get("wascorrected").and_then(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    });

    let changes_report = fields.get("changesreport").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => None,
    });

    Some(ParsedReply {
        columns,
        source_key,
        was_corrected,
        changes_report,
    })
}

/// Every balanced `{...}` in `raw` that parses as a JSON object, in order
///
/// Each `{` is tried in turn, nested ones included; braces inside string
/// literals are skipped.
pub fn json_objects(raw: &str) -> impl Iterator<Item = Map<String, Value>> + '_ {
    let bytes = raw.as_bytes();
    raw.match_indices('{').filter_map(move |(open, _)| {
        let close = balanced_end(bytes, open)?;
        match serde_json::from_str(&raw[open..=close]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

/// Index of the `}` closing the `{` at `open`
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Array entries as text; `null` becomes an empty string
fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
    )
}
