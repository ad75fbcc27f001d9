//! Exports [`Site`], which stitches the pieces together for one site
//! directory: configuration, the [`DirFetcher`] serving the directory, and the
//! [`View`]. Page rendering degrades the way the browser front-end does: a
//! failed load becomes an inline error message, not an error.

use crate::blog::{load_post, Blog};
use crate::config::{Config, Error as ConfigError};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::fetch::DirFetcher;
use crate::index::{build_index, write_index, Error as IndexError};
use crate::link::Converter as LinkConverter;
use crate::markdown;
use crate::theme::{Error as ThemeError, FileStore, Theme, ThemeController};
use crate::view::{Error as ViewError, View};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A site directory and everything needed to render it.
pub struct Site {
    pub config: Config,
    fetcher: DirFetcher,
    view: View,
}

impl Site {
    /// Loads the configuration governing `dir` (see
    /// [`Config::from_directory`]).
    pub fn open(dir: &Path) -> Result<Site> {
        Site::from_config(Config::from_directory(dir)?)
    }

    /// Builds the site for already-loaded configuration.
    pub fn from_config(config: Config) -> Result<Site> {
        let view = View::from_config(&config)?;
        Ok(Site {
            fetcher: DirFetcher::new(&config.site_directory),
            view,
            config,
        })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// A controller with the post index loaded, or the load's failure.
    pub fn load_blog(&self) -> Result<Blog> {
        let mut blog = Blog::with_search_cooldown(self.config.search_debounce);
        blog.load_index(&self.fetcher, &self.config.index_file)?;
        Ok(blog)
    }

    /// The listing page with `tag` and `query` applied. A failed index load
    /// renders the error page.
    pub fn index_page(&self, tag: Option<&str>, query: &str, theme: Theme) -> Result<String> {
        let mut blog = Blog::with_search_cooldown(self.config.search_debounce);
        if let Err(err) = blog.load_index(&self.fetcher, &self.config.index_file) {
            return Ok(self.view.error_page(&err.to_string(), theme)?);
        }
        blog.set_active_tag(tag);
        blog.set_search_query(query);
        Ok(self.view.index_page(
            &blog.tags(),
            blog.filter_state().active_tag(),
            &blog.filtered(),
            theme,
        )?)
    }

    /// The page for the post file `file` (relative to the pages directory).
    /// A missing or unreadable post renders the error page.
    pub fn post_page(&self, file: Option<&str>, theme: Theme) -> Result<String> {
        let document = match load_post(&self.fetcher, &self.config.pages_directory, file) {
            Ok(document) => document,
            Err(err) => return Ok(self.view.error_page(&err.to_string(), theme)?),
        };
        // load_post succeeded, so `file` is present
        let file = file.unwrap_or_default();

        let mut content = String::new();
        let converted = LinkConverter::new(&self.config.site_url, &self.config.pages_directory, file)
            .map_err(markdown::Error::from)
            .and_then(|links| markdown::to_html(&mut content, Some(&links), &document.body));
        if let Err(err) = converted {
            warn!(file, error = %err, "failed to render post");
            return Ok(self.view.error_page("An error occurred while loading the post.", theme)?);
        }
        Ok(self.view.post_page(&document, &content, theme)?)
    }

    /// Rebuilds the post index from the pages directory. Returns the number
    /// of posts indexed.
    pub fn build_index(&self) -> Result<usize> {
        let posts = build_index(&self.config.pages_path())?;
        write_index(&posts, &self.config.index_path())?;
        Ok(posts.len())
    }

    /// Writes the Atom feed for the post index to `path`.
    pub fn write_feed(&self, path: &Path) -> Result<()> {
        let blog = self.load_blog()?;
        let file = File::create(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        write_feed(
            &FeedConfig {
                title: self.config.title.clone(),
                author: self.config.author.clone(),
                site_url: self.config.site_url.clone(),
            },
            blog.posts(),
            file,
        )?;
        Ok(())
    }

    /// The theme controller over the site's persisted preference.
    pub fn theme(&self, os_prefers_dark: Option<bool>) -> Result<ThemeController<FileStore>> {
        let store = FileStore::open(&self.config.theme_state_file)?;
        Ok(ThemeController::new(store, os_prefers_dark))
    }
}

/// The result of a site operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for site operations. Each variant wraps the error of the
/// step which failed.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading configuration.
    Config(ConfigError),

    /// Returned for errors loading or applying templates.
    View(ViewError),

    /// Returned when the post index can't be loaded.
    Load(crate::blog::Error),

    /// Returned for errors building the post index.
    Index(IndexError),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for errors accessing persisted preferences.
    Theme(ThemeError),

    /// Returned for other I/O errors.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::View(err) => err.fmt(f),
            Error::Load(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Theme(err) => err.fmt(f),
            Error::Io { path, err } => write!(f, "'{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::View(err) => Some(err),
            Error::Load(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Theme(err) => Some(err),
            Error::Io { path: _, err } => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<ViewError> for Error {
    /// Converts [`ViewError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ViewError) -> Error {
        Error::View(err)
    }
}

impl From<crate::blog::Error> for Error {
    /// Converts load errors into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: crate::blog::Error) -> Error {
        Error::Load(err)
    }
}

impl From<IndexError> for Error {
    /// Converts [`IndexError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<ThemeError> for Error {
    /// Converts [`ThemeError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ThemeError) -> Error {
        Error::Theme(err)
    }
}
