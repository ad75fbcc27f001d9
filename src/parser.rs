//! Defines the [`Document`] and [`Value`] types and [`parse_front_matter`],
//! which splits a post source file into its metadata block and Markdown body.
//!
//! A post file looks like this:
//!
//! ```md
//! ---
//! title: "Hello, world!"
//! date: 2024-04-16
//! tags: [greet, meta]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! The metadata block is deliberately not YAML: each line is a `key: value`
//! pair, values may be quoted, and only `tags` can hold a list. Parsing never
//! fails; a file without a well-formed block is all body.

use tracing::debug;

const FENCE_START: &str = "---\n";
const FENCE_END: &str = "\n---\n";

/// A metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    /// The value as text. Lists have no text form.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::List(_) => None,
        }
    }
}

/// A parsed post source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    /// Metadata entries in the order their keys first appeared.
    pub metadata: Vec<(String, Value)>,

    /// The Markdown body following the metadata block.
    pub body: String,
}

impl Document {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// The text value for `key`, if present and non-empty.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_text)
            .filter(|text| !text.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.text("date")
    }

    pub fn category(&self) -> Option<&str> {
        self.text("category")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.text("excerpt")
    }

    /// The post's tags. Always a list: a plain-text `tags` value is split on
    /// commas and a missing one is empty.
    pub fn tags(&self) -> Vec<String> {
        match self.get("tags") {
            Some(Value::List(tags)) => tags.clone(),
            Some(Value::Text(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect(),
            None => Vec::new(),
        }
    }

    fn insert(&mut self, key: String, value: Value) {
        match self.metadata.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.metadata.push((key, value)),
        }
    }
}

/// Splits `input` into metadata and body. The metadata block must open the
/// file with a `---` line and be closed by another `---` line; otherwise the
/// whole input is body.
pub fn parse_front_matter(input: &str) -> Document {
    let input = input.replace("\r\n", "\n");
    let (block, body) = match split_front_matter(&input) {
        Some(parts) => parts,
        None => {
            return Document {
                metadata: Vec::new(),
                body: input,
            }
        }
    };

    let mut document = Document {
        metadata: Vec::new(),
        body: body.to_owned(),
    };
    for line in block.split('\n') {
        let colon = match line.find(':') {
            Some(colon) if colon > 0 => colon,
            _ => continue,
        };
        let key = line[..colon].trim();
        let value = unquote(line[colon + 1..].trim());
        let value = match key == "tags" && value.starts_with('[') && value.ends_with(']') {
            true => Value::List(parse_tag_list(value)),
            false => Value::Text(value.to_owned()),
        };
        document.insert(key.to_owned(), value);
    }
    document
}

fn split_front_matter(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix(FENCE_START)?;
    let end = rest.find(FENCE_END)?;
    Some((&rest[..end], &rest[end + FENCE_END.len()..]))
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

// Strips one pair of matching quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.starts_with(quote) && value.ends_with(quote) {
            return match value.len() {
                1 => "",
                n => &value[1..n - 1],
            };
        }
    }
    value
}

// `value` is bracketed. Tries a JSON array of strings first, then falls back
// to splitting the bracketed text on commas.
fn parse_tag_list(value: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(value) {
        Ok(tags) => tags,
        Err(err) => {
            debug!(value, error = %err, "tags aren't a JSON array; splitting on commas");
            value[1..value.len() - 1]
                .split(',')
                .map(|tag| {
                    let tag = tag.trim();
                    let tag = tag.strip_prefix(is_quote).unwrap_or(tag);
                    tag.strip_suffix(is_quote).unwrap_or(tag).to_owned()
                })
                .collect()
        }
    }
}
