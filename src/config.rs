//! Loads the site's `blog.yaml`. The file is looked up in the site directory
//! and each of its parents; paths inside it are relative to the directory
//! holding it.

use crate::fetch::join_path;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "blog.yaml";

#[derive(Deserialize)]
struct DebounceMillis(u64);
impl Default for DebounceMillis {
    fn default() -> Self {
        DebounceMillis(300)
    }
}

#[derive(Deserialize)]
struct IndexFile(String);
impl Default for IndexFile {
    fn default() -> Self {
        IndexFile(String::from("posts.json"))
    }
}

#[derive(Deserialize)]
struct PagesDirectory(String);
impl Default for PagesDirectory {
    fn default() -> Self {
        PagesDirectory(String::from("pages"))
    }
}

#[derive(Deserialize)]
struct DateFormat(String);
impl Default for DateFormat {
    fn default() -> Self {
        DateFormat(String::from("%B %-d, %Y"))
    }
}

#[derive(Deserialize)]
struct StateFile(PathBuf);
impl Default for StateFile {
    fn default() -> Self {
        StateFile(PathBuf::from(".blogfront/preferences.yaml"))
    }
}

#[derive(Deserialize)]
struct Project {
    title: String,
    site_url: Url,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    index_file: IndexFile,

    #[serde(default)]
    pages_directory: PagesDirectory,

    #[serde(default)]
    date_format: DateFormat,

    #[serde(default)]
    search_debounce_ms: DebounceMillis,

    #[serde(default)]
    theme_state_file: StateFile,

    #[serde(default)]
    templates: Option<PathBuf>,

    #[serde(default)]
    comments: Option<Comments>,
}

/// The author credited in the feed.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Settings for the embedded comment widget. Each page gets one widget
/// script keyed by the repository which stores the discussions.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Comments {
    /// The widget's client script.
    #[serde(default = "Comments::default_script")]
    pub script: String,

    /// The `owner/name` of the repository holding the discussions.
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,

    /// How pages map to discussions, e.g. `pathname`.
    #[serde(default = "Comments::default_mapping")]
    pub mapping: String,

    #[serde(default = "Comments::default_theme")]
    pub theme: String,

    #[serde(default = "Comments::default_lang")]
    pub lang: String,
}

impl Comments {
    fn default_script() -> String {
        String::from("https://giscus.app/client.js")
    }

    fn default_mapping() -> String {
        String::from("pathname")
    }

    fn default_theme() -> String {
        String::from("preferred_color_scheme")
    }

    fn default_lang() -> String {
        String::from("en")
    }
}

/// The resolved site configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site's title, used by pages and the feed.
    pub title: String,

    /// The URL of the site root, with a trailing slash.
    pub site_url: Url,

    pub author: Option<Author>,

    /// The directory served as the site root.
    pub site_directory: PathBuf,

    /// The post index, relative to the site root.
    pub index_file: String,

    /// The directory holding post sources, relative to the site root.
    pub pages_directory: String,

    /// A `chrono` format string for post dates.
    pub date_format: String,

    /// The quiet period before a typed search is committed.
    pub search_debounce: Duration,

    /// Where the theme preference is persisted.
    pub theme_state_file: PathBuf,

    /// A directory of template overrides, if any.
    pub templates_directory: Option<PathBuf>,

    pub comments: Option<Comments>,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the project file at `path`. Relative paths in it resolve
    /// against its directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Config::from_project(project, root))
    }

    fn from_project(project: Project, root: &Path) -> Config {
        let mut site_url = project.site_url;
        if !site_url.path().ends_with('/') {
            let path = format!("{}/", site_url.path());
            site_url.set_path(&path);
        }
        Config {
            title: project.title,
            site_url,
            author: project.author,
            site_directory: root.to_owned(),
            index_file: project.index_file.0,
            pages_directory: project.pages_directory.0.trim_matches('/').to_owned(),
            date_format: project.date_format.0,
            search_debounce: Duration::from_millis(project.search_debounce_ms.0),
            theme_state_file: root.join(project.theme_state_file.0),
            templates_directory: project.templates.map(|dir| root.join(dir)),
            comments: project.comments,
        }
    }

    /// The on-disk directory holding post sources.
    pub fn pages_path(&self) -> PathBuf {
        self.site_directory.join(&self.pages_directory)
    }

    /// The on-disk location of the post index.
    pub fn index_path(&self) -> PathBuf {
        self.site_directory.join(&self.index_file)
    }

    /// The site-relative path of a post source file.
    pub fn page_path(&self, file: &str) -> String {
        join_path(&self.pages_directory, file)
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its parents.
    NotFound,

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    Parse { path: PathBuf, err: serde_yaml::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "title: My Blog\nsite_url: https://example.org/blog\n",
        )
        .unwrap();
        let nested = dir.path().join("pages").join("drafts");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested)?;
        assert_eq!("My Blog", config.title);
        assert_eq!("https://example.org/blog/", config.site_url.as_str());
        assert_eq!(dir.path(), config.site_directory);
        assert_eq!("posts.json", config.index_file);
        assert_eq!("pages", config.pages_directory);
        assert_eq!(Duration::from_millis(300), config.search_debounce);
        assert_eq!(
            dir.path().join(".blogfront").join("preferences.yaml"),
            config.theme_state_file,
        );
        assert_eq!(None, config.comments);
        assert_eq!("pages/hello.md", config.page_path("hello.md"));
        Ok(())
    }

    #[test]
    fn test_full_project() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(
            &path,
            "title: Notes\n\
             site_url: https://notes.example/\n\
             author: {name: Jo, email: jo@notes.example}\n\
             index_file: data/index.json\n\
             pages_directory: /content/\n\
             date_format: \"%Y-%m-%d\"\n\
             search_debounce_ms: 150\n\
             templates: theme\n\
             comments:\n  repo: jo/notes\n  repo_id: R1\n  category: General\n  category_id: C1\n",
        )
        .unwrap();

        let config = Config::from_project_file(&path)?;
        let email = config.author.as_ref().and_then(|author| author.email.clone());
        assert_eq!(Some("jo@notes.example".to_owned()), email);
        assert_eq!(dir.path().join("data/index.json"), config.index_path());
        assert_eq!(dir.path().join("content"), config.pages_path());
        assert_eq!("%Y-%m-%d", config.date_format);
        assert_eq!(Duration::from_millis(150), config.search_debounce);
        assert_eq!(Some(dir.path().join("theme")), config.templates_directory);
        let comments = config.comments.unwrap();
        assert_eq!("jo/notes", comments.repo);
        assert_eq!("pathname", comments.mapping);
        assert_eq!("https://giscus.app/client.js", comments.script);
        Ok(())
    }

    #[test]
    fn test_pages_at_site_root() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(&path, "title: Root\nsite_url: https://example.org/\npages_directory: /\n")
            .unwrap();

        let config = Config::from_project_file(&path)?;
        assert_eq!("", config.pages_directory);
        assert_eq!("hello.md", config.page_path("hello.md"));
        assert_eq!(dir.path(), config.pages_path());
        Ok(())
    }

    #[test]
    fn test_invalid_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(&path, "title: [unterminated\n").unwrap();
        assert!(matches!(
            Config::from_project_file(&path),
            Err(Error::Parse { .. })
        ));
    }
}
