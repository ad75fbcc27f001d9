//! Defines [`Blog`], the controller which owns the front-end's state: the
//! [`PostStore`], the [`FilterState`], the debounced [`SearchInput`] and the
//! [`EventBus`]. Every change to the filters publishes a fresh
//! [`PostsFiltered`] event; renderers subscribe instead of being called.
//!
//! Also defines the two loading operations, [`Blog::load_index`] and
//! [`load_post`]. Neither retries: a failure is reported once and the
//! affected view shows an inline message.

use crate::event::{EventBus, PostsFiltered, SubscriptionId};
use crate::fetch::{join_path, Error as FetchError, Fetcher};
use crate::filter::FilterState;
use crate::parser::{parse_front_matter, Document};
use crate::post::{parse_index, Error as IndexError, PostRecord, PostStore};
use crate::search::SearchInput;
use crate::tag::{aggregate_tags, TagCount};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Where the post index is in its (single) load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    /// The load failed; carries the message shown in place of the list.
    Failed(String),
}

/// The front-end controller. See the module documentation.
#[derive(Debug)]
pub struct Blog {
    store: PostStore,
    filter: FilterState,
    search: SearchInput,
    bus: EventBus,
    state: LoadState,
}

impl Default for Blog {
    fn default() -> Self {
        Blog::new(SearchInput::default())
    }
}

impl Blog {
    /// An empty controller using `search` for the search box.
    pub fn new(search: SearchInput) -> Blog {
        Blog {
            store: PostStore::new(),
            filter: FilterState::new(),
            search,
            bus: EventBus::new(),
            state: LoadState::NotLoaded,
        }
    }

    /// Creates a controller whose search box commits after `cooldown`.
    pub fn with_search_cooldown(cooldown: Duration) -> Blog {
        Blog::new(SearchInput::new(cooldown))
    }

    /// Fetches and parses the post index at `path`, replacing the store's
    /// posts and publishing the filtered result. On failure the store is left
    /// untouched and the state records the message.
    pub fn load_index<F: Fetcher>(&mut self, fetcher: &F, path: &str) -> Result<()> {
        let result = fetcher
            .fetch(path)
            .map_err(Error::Index)
            .and_then(|body| parse_index(&body).map_err(Error::MalformedIndex));
        match result {
            Ok(posts) => {
                info!(path, posts = posts.len(), "loaded post index");
                self.set_posts(posts);
                Ok(())
            }
            Err(err) => {
                warn!(path, error = %err, "failed to load post index");
                self.state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Replaces the posts wholesale and publishes the filtered result.
    pub fn set_posts(&mut self, posts: Vec<PostRecord>) {
        self.store.set_posts(posts);
        self.state = LoadState::Loaded;
        self.publish();
    }

    pub fn posts(&self) -> &[PostRecord] {
        self.store.posts()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    /// The posts passing the current filters, in store order.
    pub fn filtered(&self) -> Vec<&PostRecord> {
        self.filter.apply(self.store.posts())
    }

    /// Post counts per tag over all posts, for the tag bar.
    pub fn tags(&self) -> Vec<TagCount> {
        aggregate_tags(self.store.posts())
    }

    /// Selects a tag (`None` or `""` for all posts) and publishes.
    pub fn set_active_tag(&mut self, tag: Option<&str>) {
        self.filter.set_active_tag(tag);
        self.publish();
    }

    /// Commits a search query and publishes.
    pub fn set_search_query(&mut self, query: &str) {
        self.filter.set_search_query(query);
        self.publish();
    }

    /// A keystroke in the search box; the query is committed once the box has
    /// been quiet for the cooldown (see [`Blog::tick`]).
    pub fn search_input(&mut self, value: &str, now: Duration) {
        self.search.input(value, now);
    }

    /// "Enter" in the search box: commits `value` immediately and cancels any
    /// pending commit.
    pub fn search_confirm(&mut self, value: &str) {
        let query = self.search.confirm(value);
        self.set_search_query(&query);
    }

    /// Advances the clock to `now`, committing a due search. Returns whether
    /// a commit happened.
    pub fn tick(&mut self, now: Duration) -> bool {
        match self.search.poll(now) {
            Some(query) => {
                self.set_search_query(&query);
                true
            }
            None => false,
        }
    }

    /// When the pending search commit falls due, if there is one.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.search.deadline()
    }

    /// Registers a renderer for [`PostsFiltered`] events.
    pub fn subscribe<H>(&mut self, handler: H) -> SubscriptionId
    where
        H: FnMut(&PostsFiltered) + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Removes a renderer registered with [`Blog::subscribe`].
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn publish(&mut self) {
        let event = PostsFiltered {
            posts: self.filtered().into_iter().cloned().collect(),
        };
        self.bus.publish(&event);
    }
}

/// Fetches and parses the post file `file`, relative to `pages_directory`.
/// A missing `file` (e.g. no `file` query parameter) is an error too.
pub fn load_post<F: Fetcher>(
    fetcher: &F,
    pages_directory: &str,
    file: Option<&str>,
) -> Result<Document> {
    let file = file.filter(|f| !f.is_empty()).ok_or(Error::MissingPost)?;
    let path = join_path(pages_directory, file);
    match fetcher.fetch(&path) {
        Ok(body) => Ok(parse_front_matter(&body)),
        Err(err) => {
            warn!(path = %path, error = %err, "failed to load post");
            Err(Error::Post(err))
        }
    }
}

/// The result of a load.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed load. All variants are terminal for the view that
/// asked for the load.
#[derive(Debug)]
pub enum Error {
    /// Returned when the post index can't be fetched.
    Index(FetchError),

    /// Returned when the post index isn't a JSON array of posts.
    MalformedIndex(IndexError),

    /// Returned when no post was requested.
    MissingPost,

    /// Returned when a post file can't be fetched.
    Post(FetchError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as the message shown to readers.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Index(err) => write!(f, "Could not load posts: {}", err),
            Error::MalformedIndex(err) => write!(f, "Could not load posts: {}", err),
            Error::MissingPost => write!(f, "Post not found."),
            Error::Post(_) => write!(f, "An error occurred while loading the post."),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index(err) => Some(err),
            Error::MalformedIndex(err) => Some(err),
            Error::MissingPost => None,
            Error::Post(err) => Some(err),
        }
    }
}
