//! Support for creating Atom feeds from the post index.

use crate::config::Author;
use crate::link::post_url;
use crate::post::PostRecord;
use atom_syndication::{Category, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use tracing::warn;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub author: Option<Author>,
    pub site_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`PostRecord`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[PostRecord], w: W) -> Result<()> {
    feed(config, posts)?.write_to(w)?;
    Ok(())
}

/// Builds the feed. Posts whose date can't be parsed are left out.
pub fn feed(config: &FeedConfig, posts: &[PostRecord]) -> Result<Feed> {
    let entries = feed_entries(config, posts)?;
    let updated = entries
        .iter()
        .map(|entry| *entry.updated())
        .max()
        .unwrap_or_else(|| Utc::now().into());

    let mut feed = Feed::default();
    feed.set_title(config.title.as_str());
    feed.set_id(config.site_url.as_str());
    feed.set_updated(updated);
    feed.set_authors(author_to_people(&config.author));
    feed.set_links(vec![link(config.site_url.as_str())]);
    feed.set_entries(entries);
    Ok(feed)
}

fn feed_entries(config: &FeedConfig, posts: &[PostRecord]) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::with_capacity(posts.len());

    for post in posts {
        let date = match parse_date(&post.date) {
            Some(date) => date,
            None => {
                warn!(file = %post.file, date = %post.date, "leaving post with unparseable date out of the feed");
                continue;
            }
        };
        let url = post_url(&config.site_url, &post.file)?;

        let mut entry = Entry::default();
        entry.set_id(url.as_str());
        entry.set_title(post.title.as_str());
        entry.set_updated(date);
        entry.set_published(Some(date));
        entry.set_authors(author_to_people(&config.author));
        entry.set_links(vec![link(url.as_str())]);
        if !post.summary().is_empty() {
            entry.set_summary(Some(Text::from(post.summary())));
        }
        entry.set_categories(
            post.tags
                .iter()
                .map(|tag| {
                    let mut category = Category::default();
                    category.set_term(tag.as_str());
                    category
                })
                .collect::<Vec<_>>(),
        );
        entries.push(entry);
    }
    Ok(entries)
}

// Post dates are days; entries are stamped at midnight UTC.
fn parse_date(date: &str) -> Option<DateTime<FixedOffset>> {
    let day = date.split(|c| c == 'T' || c == ' ').next()?;
    let naive = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&naive.and_hms_opt(0, 0, 0)?).into())
}

fn link(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(author: &Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name.as_str());
            person.set_email(author.email.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

/// The result of creating a feed.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude Atom and URL
/// issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an Atom-related error, including I/O.
    Atom(AtomError),

    /// Returned when a post's URL can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Atom(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Atom(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator when building post URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(title: &str, date: &str, tags: &[&str]) -> PostRecord {
        PostRecord {
            title: title.to_owned(),
            excerpt: format!("about {}", title),
            date: date.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            file: format!("{}.md", title),
            ..PostRecord::default()
        }
    }

    fn config() -> FeedConfig {
        FeedConfig {
            title: String::from("Blog"),
            author: Some(Author {
                name: String::from("Jo"),
                email: None,
            }),
            site_url: Url::parse("https://example.org/").unwrap(),
        }
    }

    #[test]
    fn test_feed_entries() -> Result<()> {
        let posts = vec![
            post("newer", "2024-02-01", &["rust"]),
            post("undated", "someday", &[]),
            post("older", "2024-01-01T08:00:00Z", &[]),
        ];
        let feed = feed(&config(), &posts)?;

        assert_eq!(2, feed.entries().len());
        let newer = &feed.entries()[0];
        assert_eq!("https://example.org/post.html?file=newer.md", newer.id());
        assert_eq!("newer", newer.title().value);
        assert_eq!("rust", newer.categories()[0].term());
        assert_eq!("2024-02-01T00:00:00+00:00", newer.updated().to_rfc3339());
        assert_eq!(newer.updated(), feed.updated());
        assert_eq!("Jo", feed.authors()[0].name());
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let mut out = Vec::new();
        write_feed(&config(), &[post("hello", "2024-02-01", &[])], &mut out)?;
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains(">hello</title>"), "{}", xml);
        assert!(xml.contains("about hello"), "{}", xml);
        Ok(())
    }
}
