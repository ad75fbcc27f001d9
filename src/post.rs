//! Defines the [`PostRecord`] type, one entry of the blog's JSON post index,
//! and the [`PostStore`] which holds the records once the index is fetched.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The file extension for post source files.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// A single post as described by the post index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// The title of the post.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// A short excerpt shown in post listings.
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,

    /// The post's description. Listings fall back to this when `excerpt` is
    /// empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// The post's date, typically `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,

    /// The post's tags. Always present, possibly empty: a record without a
    /// `tags` field (or with `null`) gets an empty list.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// The post's category, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// The path of the post's source file relative to the pages directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub file: String,
}

impl PostRecord {
    /// The text shown under the title in listings: the excerpt, or the
    /// description when there is no excerpt.
    pub fn summary(&self) -> &str {
        match self.excerpt.is_empty() {
            true => &self.description,
            false => &self.excerpt,
        }
    }

    /// Whether the post carries `tag` (exact, case-sensitive match).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a post index document. The document must be a JSON array of post
/// records.
pub fn parse_index(input: &str) -> Result<Vec<PostRecord>> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    if !value.is_array() {
        return Err(Error::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}

/// Holds the list of posts most recently fetched from the index.
#[derive(Debug, Default)]
pub struct PostStore {
    posts: Vec<PostRecord>,
    loaded: bool,
}

impl PostStore {
    /// Creates an empty store which hasn't been loaded yet.
    pub fn new() -> PostStore {
        PostStore::default()
    }

    /// Replaces the held posts wholesale. Nothing is merged or deduplicated.
    pub fn set_posts(&mut self, posts: Vec<PostRecord>) {
        self.posts = posts;
        self.loaded = true;
    }

    /// The held posts in the order they were set.
    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// Whether [`PostStore::set_posts`] has been called. Distinguishes a
    /// store which hasn't been loaded from one loaded with an empty index.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// The result of parsing a post index.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed post index.
#[derive(Debug)]
pub enum Error {
    /// Returned when the index isn't valid JSON or a record has the wrong
    /// shape.
    Json(serde_json::Error),

    /// Returned when the index is valid JSON but not an array.
    NotAnArray,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "malformed post index: {}", err),
            Error::NotAnArray => write!(f, "post index must be a JSON array"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::NotAnArray => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for JSON deserialization.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
