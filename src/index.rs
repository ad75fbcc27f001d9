//! Builds the JSON post index from the post source files, so the index never
//! has to be maintained by hand.

use crate::markdown::to_plain_text;
use crate::parser::parse_front_matter;
use crate::post::{PostRecord, MARKDOWN_EXTENSION};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Marks the end of a post's excerpt in its body.
pub const FOLD_TAG: &str = "<!-- more -->";

/// Searches `pages_directory` recursively for post files (extension = `.md`)
/// and returns their records sorted by date (most recent first, ties by
/// file). Files without a `title` are skipped.
pub fn build_index(pages_directory: &Path) -> Result<Vec<PostRecord>> {
    let mut posts = Vec::new();
    for result in WalkDir::new(pages_directory).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        if !entry.file_type().is_file()
            || !entry.file_name().to_string_lossy().ends_with(MARKDOWN_EXTENSION)
        {
            continue;
        }
        // WalkDir yields paths under its root
        let relative = match entry.path().strip_prefix(pages_directory) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let file = relative_file(relative)?;
        let contents = std::fs::read_to_string(entry.path()).map_err(|err| Error::Read {
            path: entry.path().to_owned(),
            err,
        })?;
        match record(&file, &contents) {
            Some(post) => posts.push(post),
            None => warn!(file = %file, "skipping post without a title"),
        }
    }

    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.file.cmp(&b.file)));
    info!(directory = %pages_directory.display(), posts = posts.len(), "indexed posts");
    Ok(posts)
}

/// Writes `posts` to `path` as a pretty-printed JSON array.
pub fn write_index(posts: &[PostRecord], path: &Path) -> Result<()> {
    let io_err = |err| Error::Write {
        path: path.to_owned(),
        err,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    serde_json::to_writer_pretty(file, posts)?;
    Ok(())
}

/// Builds the index record for the post file `file` with source `contents`.
/// Returns `None` when the front matter has no title.
pub fn record(file: &str, contents: &str) -> Option<PostRecord> {
    let document = parse_front_matter(contents);
    let title = document.title()?.to_owned();
    let excerpt = match document.excerpt() {
        Some(excerpt) => excerpt.to_owned(),
        None => match document.body.find(FOLD_TAG) {
            Some(i) => to_plain_text(&document.body[..i]),
            None => String::new(),
        },
    };
    Some(PostRecord {
        title,
        excerpt,
        description: document.description().unwrap_or_default().to_owned(),
        date: document.date().unwrap_or_default().to_owned(),
        tags: document.tags(),
        category: document.category().map(str::to_owned),
        file: file.to_owned(),
    })
}

// Index paths always use `/`, whatever the platform.
fn relative_file(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .ok_or_else(|| Error::InvalidFileName(relative.to_owned()))
        })
        .collect::<Result<Vec<&str>>>()?;
    Ok(parts.join("/"))
}

/// The result of building an index.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem building or writing the index.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors walking the pages directory.
    WalkDir(walkdir::Error),

    /// Returned when a post file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a post file's path isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when the index file can't be written.
    Write { path: PathBuf, err: std::io::Error },

    /// Returned when the index can't be serialized.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WalkDir(err) => err.fmt(f),
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::Write { path, err } => {
                write!(f, "Writing index '{}': {}", path.display(), err)
            }
            Error::Json(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalkDir(err) => Some(err),
            Error::Read { path: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Write { path: _, err } => Some(err),
            Error::Json(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the pages directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for JSON serialization.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::parse_index;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_build_index() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "older.md",
            "---\ntitle: Older\ndate: 2023-05-01\ntags: [a]\n---\nFirst *words*.\n\n<!-- more -->\nRest\n",
        );
        write(
            dir.path(),
            "notes/newer.md",
            "---\ntitle: Newer\ndate: 2024-05-01\nexcerpt: Given\ndescription: Described\ncategory: notes\n---\nBody\n",
        );
        write(dir.path(), "draft.md", "---\ndate: 2024-06-01\n---\nno title\n");
        write(dir.path(), "image.png", "not a post");

        let posts = build_index(dir.path())?;
        assert_eq!(2, posts.len());

        assert_eq!("Newer", posts[0].title);
        assert_eq!("notes/newer.md", posts[0].file);
        assert_eq!("Given", posts[0].excerpt);
        assert_eq!("Described", posts[0].description);
        assert_eq!(Some("notes".to_owned()), posts[0].category);
        assert!(posts[0].tags.is_empty());

        assert_eq!("older.md", posts[1].file);
        assert_eq!("First words.", posts[1].excerpt);
        assert_eq!(vec!["a"], posts[1].tags);
        Ok(())
    }

    #[test]
    fn test_write_index_round_trips() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let post = record("a.md", "---\ntitle: A\ntags: x, y\n---\n").unwrap();
        let path = dir.path().join("out").join("posts.json");
        write_index(&[post.clone()], &path)?;

        let read = parse_index(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(vec![post], read);
        Ok(())
    }
}
