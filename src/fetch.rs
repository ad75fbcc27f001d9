//! The [`Fetcher`] trait is the seam where the post index and post files are
//! retrieved. [`DirFetcher`] serves them from a site directory on disk, the
//! way a static file server would.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Retrieves site files by their site-relative path (e.g. `posts.json` or
/// `pages/hello.md`).
pub trait Fetcher {
    fn fetch(&self, path: &str) -> Result<String>;
}

/// Joins the site-relative `directory` and `file` with a single `/`. An
/// empty `directory` (or just `/`) is the site root.
pub fn join_path(directory: &str, file: &str) -> String {
    let directory = directory.trim_matches('/');
    let file = file.trim_start_matches('/');
    match directory.is_empty() {
        true => file.to_owned(),
        false => format!("{}/{}", directory, file),
    }
}

/// A [`Fetcher`] which reads files under a root directory.
#[derive(Clone, Debug)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    /// Serves the files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> DirFetcher {
        DirFetcher { root: root.into() }
    }

    /// The directory files are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // Joins `path` onto the root, refusing anything which could escape it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        match contained && !path.is_empty() {
            true => Some(self.root.join(relative)),
            false => None,
        }
    }
}

impl Fetcher for DirFetcher {
    fn fetch(&self, path: &str) -> Result<String> {
        let full_path = self.resolve(path).ok_or_else(|| Error::Status {
            path: path.to_owned(),
            status: 400,
        })?;
        debug!(path = %full_path.display(), "fetching");
        std::fs::read_to_string(&full_path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::Status {
                path: path.to_owned(),
                status: 404,
            },
            _ => Error::Io {
                path: path.to_owned(),
                err,
            },
        })
    }
}

/// The result of a fetch.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed fetch.
#[derive(Debug)]
pub enum Error {
    /// Returned when the file couldn't be served, with an HTTP-style status
    /// (404 for a missing file, 400 for a path outside the site).
    Status { path: String, status: u16 },

    /// Returned for other I/O errors.
    Io { path: String, err: io::Error },
}

impl Error {
    /// The path which failed to fetch.
    pub fn path(&self) -> &str {
        match self {
            Error::Status { path, .. } => path,
            Error::Io { path, .. } => path,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Status { path, status } => {
                write!(f, "could not fetch `{}` (HTTP {})", path, status)
            }
            Error::Io { path, err } => write!(f, "could not fetch `{}`: {}", path, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Status { .. } => None,
            Error::Io { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fetch_from_directory() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pages")).unwrap();
        std::fs::write(dir.path().join("pages").join("a.md"), "hello").unwrap();

        let fetcher = DirFetcher::new(dir.path());
        assert_eq!("hello", fetcher.fetch("pages/a.md")?);
        assert_eq!("hello", fetcher.fetch("./pages/a.md")?);
        Ok(())
    }

    #[test]
    fn test_join_path() {
        assert_eq!("pages/a.md", join_path("pages", "a.md"));
        assert_eq!("pages/a.md", join_path("/pages/", "/a.md"));
        assert_eq!("a.md", join_path("", "a.md"));
        assert_eq!("a.md", join_path("/", "a.md"));
    }

    #[test]
    fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirFetcher::new(dir.path());
        match fetcher.fetch("posts.json") {
            Err(Error::Status { status: 404, path }) => assert_eq!("posts.json", path),
            other => panic!("expected 404, got {:?}", other),
        }
    }

    #[test]
    fn test_paths_outside_root_are_refused() {
        let fetcher = DirFetcher::new("/tmp/site");
        for path in ["../etc/passwd", "/etc/passwd", "pages/../../x", ""] {
            assert!(
                matches!(fetcher.fetch(path), Err(Error::Status { status: 400, .. })),
                "{}",
                path,
            );
        }
    }
}
