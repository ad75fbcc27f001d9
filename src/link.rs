//! Link handling for post pages. Posts are served through a single page,
//! `post.html`, which takes the post's source path in its `file` query
//! parameter. [`Converter`] rewrites links between posts accordingly.

use crate::post::MARKDOWN_EXTENSION;
use url::{ParseError, Url};

/// The page which displays a single post.
pub const POST_PAGE: &str = "post.html";

/// The URL of the post page for `file` (a path relative to the pages
/// directory), e.g. `https://example.org/post.html?file=notes%2Fhello.md`.
pub fn post_url(site_url: &Url, file: &str) -> Result<Url> {
    let mut url = site_url.join(POST_PAGE)?;
    url.query_pairs_mut().append_pair("file", file);
    Ok(url)
}

/// The site-relative form of [`post_url`], e.g. `post.html?file=hello.md`.
pub fn post_href(file: &str) -> String {
    let query: String = url::form_urlencoded::byte_serialize(file.as_bytes()).collect();
    format!("{}?file={}", POST_PAGE, query)
}

/// Converts link targets found in one post's Markdown.
pub struct Converter<'a> {
    site_url: &'a Url,
    pages_url: Url,
    base: Url,
}

impl<'a> Converter<'a> {
    /// Constructs a new `Converter`
    ///
    /// # Arguments
    ///
    /// * `site_url` - the URL of the site root. This should end in a
    ///   trailing slash.
    /// * `pages_directory` - the pages directory relative to the site root,
    ///   e.g. `pages`.
    /// * `source` - the post's path relative to the pages directory. Relative
    ///   links are resolved from here.
    pub fn new(
        site_url: &'a Url,
        pages_directory: &str,
        source: &str,
    ) -> Result<Converter<'a>> {
        let pages_url =
            site_url.join(&format!("{}/", pages_directory.trim_matches('/')))?;
        let base = pages_url.join(source)?;
        Ok(Converter {
            site_url,
            pages_url,
            base,
        })
    }

    /// Links to Markdown files inside the pages directory become post-page
    /// links; anything else comes back as a normalized absolute URL.
    /// Fragment-only links are left alone.
    pub fn convert(&self, target: &str) -> Result<String> {
        if target.starts_with('#') {
            return Ok(target.to_owned());
        }

        let absolute = match Url::parse(target) {
            Ok(absolute) => absolute,
            Err(ParseError::RelativeUrlWithoutBase) => self.base.join(target)?,
            Err(e) => return Err(e),
        };

        match self.page_file(&absolute) {
            Some(file) => {
                let mut url = post_url(self.site_url, &file)?;
                url.set_fragment(absolute.fragment());
                Ok(url.to_string())
            }
            None => Ok(absolute.to_string()),
        }
    }

    // The path of `absolute` relative to the pages directory, if it names a
    // Markdown file inside it.
    fn page_file(&self, absolute: &Url) -> Option<String> {
        let mut bare = absolute.clone();
        bare.set_query(None);
        bare.set_fragment(None);
        let relative = self.pages_url.make_relative(&bare)?;
        match !relative.starts_with("../") && relative.ends_with(MARKDOWN_EXTENSION) {
            true => Some(relative),
            false => None,
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_post_href_encodes_file() {
        assert_eq!("post.html?file=hello.md", post_href("hello.md"));
        assert_eq!(
            "post.html?file=notes%2Fhello+world.md",
            post_href("notes/hello world.md"),
        );
    }

    #[test]
    fn test_convert_relative_post() -> Result<()> {
        fixture_basic("https://example.org/post.html?file=relative.md", "relative.md")
    }

    #[test]
    fn test_convert_relative_post_leading_dotslash() -> Result<()> {
        fixture_basic("https://example.org/post.html?file=relative.md", "./relative.md")
    }

    #[test]
    fn test_convert_relative_post_redundancies() -> Result<()> {
        fixture_basic(
            "https://example.org/post.html?file=relative.md",
            "../pages/relative.md",
        )
    }

    #[test]
    fn test_convert_post_keeps_fragment() -> Result<()> {
        fixture_basic(
            "https://example.org/post.html?file=relative.md#usage",
            "relative.md#usage",
        )
    }

    #[test]
    fn test_convert_from_subdirectory() -> Result<()> {
        fixture(
            "notes/current.md",
            "https://example.org/post.html?file=notes%2Fsibling.md",
            "sibling.md",
        )?;
        fixture(
            "notes/current.md",
            "https://example.org/post.html?file=top.md",
            "../top.md",
        )
    }

    #[test]
    fn test_convert_relative_asset() -> Result<()> {
        fixture_basic("https://example.org/pages/relative.jpg", "./relative.jpg")
    }

    #[test]
    fn test_convert_markdown_outside_pages() -> Result<()> {
        fixture_basic("https://example.org/README.md", "../README.md")
    }

    #[test]
    fn test_convert_absolute_post() -> Result<()> {
        fixture_basic(
            "https://example.org/post.html?file=absolute.md",
            "https://example.org/pages/absolute.md",
        )
    }

    #[test]
    fn test_convert_remote_markdown_redundancies() -> Result<()> {
        fixture_basic(
            "https://remote.org/posts/absolute.md",
            "https://remote.org/posts/../posts/absolute.md",
        )
    }

    #[test]
    fn test_convert_fragment_only() -> Result<()> {
        fixture_basic("#section", "#section")
    }

    fn fixture_basic(wanted: &str, target: &str) -> Result<()> {
        fixture("current.md", wanted, target)
    }

    fn fixture(base: &str, wanted: &str, target: &str) -> Result<()> {
        assert_eq!(
            wanted,
            Converter::new(&Url::parse("https://example.org/")?, "pages", base)?
                .convert(target)?,
        );
        Ok(())
    }
}
