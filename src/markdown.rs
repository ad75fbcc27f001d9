use crate::link::Converter as LinkConverter;
use pulldown_cmark::*;
use std::fmt;
use url::ParseError as UrlParseError;

/// The GitHub-flavoured extensions enabled for post bodies.
fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown to HTML, appending the result to `out`.
///
/// * `links` rewrites link and image targets; see [`LinkConverter`]. When
///   `None`, targets are emitted as written.
/// * `markdown` is the post body.
///
/// Single line breaks inside a paragraph are kept as `<br />`.
pub fn to_html(
    out: &mut String,
    links: Option<&LinkConverter>,
    markdown: &str,
) -> Result<(), Error> {
    let event_converter = EventConverter { links };
    let events = Parser::new_ext(markdown, options())
        .map(|ev| event_converter.convert(ev))
        .collect::<Result<Vec<_>, _>>()?;
    html::push_html(out, events.into_iter());
    Ok(())
}

/// Collects the plain text of `markdown`, with block boundaries collapsed to
/// single spaces. Used to derive excerpts.
pub fn to_plain_text(markdown: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for ev in Parser::new_ext(markdown, options()) {
        match ev {
            Event::Text(text) | Event::Code(text) => words.push(text.into_string()),
            Event::SoftBreak | Event::HardBreak => words.push(String::from(" ")),
            Event::End(tag) if is_block(&tag) => words.push(String::from(" ")),
            _ => {}
        }
    }
    words
        .concat()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_block(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading(_)
            | Tag::BlockQuote
            | Tag::CodeBlock(_)
            | Tag::Item
            | Tag::FootnoteDefinition(_)
            | Tag::TableCell
    )
}

struct EventConverter<'a, 'c> {
    links: Option<&'a LinkConverter<'c>>,
}

impl<'a, 'c> EventConverter<'a, 'c> {
    fn convert_target<'b>(&self, target: CowStr<'b>) -> Result<CowStr<'b>, UrlParseError> {
        match self.links {
            Some(links) => Ok(CowStr::Boxed(links.convert(&target)?.into_boxed_str())),
            None => Ok(target),
        }
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, UrlParseError> {
        Ok(match tag {
            // Links between posts need to point at the post page rather than
            // the raw Markdown file. Email autolinks are left alone.
            Tag::Link(link, url, title) if link != LinkType::Email => {
                Tag::Link(link, self.convert_target(url)?, title)
            }
            Tag::Image(link, url, title) => {
                Tag::Image(link, self.convert_target(url)?, title)
            }
            _ => tag,
        })
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Result<Event<'b>, UrlParseError> {
        Ok(match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            Event::SoftBreak => Event::HardBreak,
            _ => ev,
        })
    }
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned when a link target can't be parsed as a URL.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UrlParse(err) => write!(f, "invalid link target: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}
