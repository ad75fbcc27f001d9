//! Turns posts, tags and parsed post files into HTML fragments. Each fragment
//! has a `gtmpl` template with a built-in default which a site can override
//! by placing a file of the same name in its templates directory.
//!
//! Template values are HTML-escaped before they reach a template; only
//! fragments this module produced itself (rendered Markdown, nested
//! fragments, the comment widget) are passed through raw.

use crate::config::{Comments, Config};
use crate::link::post_href;
use crate::parser::Document;
use crate::post::PostRecord;
use crate::tag::TagCount;
use crate::theme::Theme;
use chrono::NaiveDate;
use gtmpl::Template;
use gtmpl_value::Value;
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

const LAYOUT_TEMPLATE: &str = "layout.html";
const TAG_BAR_TEMPLATE: &str = "tags.html";
const POST_LIST_TEMPLATE: &str = "list.html";
const POST_TEMPLATE: &str = "post.html";

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en" data-theme="{{.theme}}">
<head>
<meta charset="utf-8">
<title>{{.title}}</title>
{{if .description}}<meta name="description" content="{{.description}}">
{{end}}</head>
<body>
<header><a href="index.html">{{.site_title}}</a> <button id="theme-toggle">{{.theme}}</button></header>
<main>
{{.body}}
</main>
</body>
</html>
"#;

const DEFAULT_TAG_BAR: &str = r#"{{if .tags}}<div id="tags-container">
<button class="tag-btn{{if .all_active}} active{{end}}" data-tag="">All</button>
{{range .tags}}<button class="tag-btn{{if .active}} active{{end}}" data-tag="{{.tag}}">{{.label}}</button>
{{end}}</div>
{{end}}"#;

const DEFAULT_POST_LIST: &str = r#"{{if .posts}}<ul id="posts-list">
{{range .posts}}<li class="post-item">
<a href="{{.href}}" class="post-item-link">
<h2 class="post-item-title">{{.title}}</h2>
<p class="post-item-excerpt">{{.summary}}</p>
<div class="post-item-meta"><time>{{.date}}</time>{{if .category}} <span>{{.category}}</span>{{end}}</div>
{{if .tags}}<div class="post-item-tags">{{range .tags}}<span class="post-item-tag">{{.}}</span>{{end}}</div>
{{end}}</a>
</li>
{{end}}</ul>
{{else}}<p id="no-posts">No posts found.</p>
{{end}}"#;

const DEFAULT_POST: &str = r#"<article class="post">
<h1 id="post-title">{{.title}}</h1>
<div class="post-meta">{{if .date}}<time id="post-date">{{.date}}</time>{{end}}{{if .category}} <span id="post-category">{{.category}}</span>{{end}}</div>
{{if .tags}}<div id="post-tags">{{range .tags}}<span class="post-tag">{{.}}</span>{{end}}</div>
{{end}}<div id="post-content">
{{.content}}</div>
{{if .comments}}<div id="comments">{{.comments}}</div>
{{end}}</article>
"#;

/// The title shown for a post whose metadata has none.
pub const UNTITLED: &str = "Untitled";

/// Renders HTML fragments and pages for one site.
pub struct View {
    layout: Template,
    tag_bar: Template,
    post_list: Template,
    post: Template,
    site_title: String,
    date_format: String,
    comments: Option<Comments>,
}

impl View {
    /// Builds a view with the built-in templates.
    pub fn new(site_title: &str, date_format: &str) -> Result<View> {
        View::with_overrides(site_title, date_format, None)
    }

    /// Builds a view for `config`, picking up template overrides from its
    /// templates directory.
    pub fn from_config(config: &Config) -> Result<View> {
        let mut view = View::with_overrides(
            &config.title,
            &config.date_format,
            config.templates_directory.as_deref(),
        )?;
        view.comments = config.comments.clone();
        Ok(view)
    }

    fn with_overrides(
        site_title: &str,
        date_format: &str,
        templates: Option<&Path>,
    ) -> Result<View> {
        Ok(View {
            layout: load_template(templates, LAYOUT_TEMPLATE, DEFAULT_LAYOUT)?,
            tag_bar: load_template(templates, TAG_BAR_TEMPLATE, DEFAULT_TAG_BAR)?,
            post_list: load_template(templates, POST_LIST_TEMPLATE, DEFAULT_POST_LIST)?,
            post: load_template(templates, POST_TEMPLATE, DEFAULT_POST)?,
            site_title: site_title.to_owned(),
            date_format: date_format.to_owned(),
            comments: None,
        })
    }

    /// Attaches a comment widget to every post page.
    pub fn with_comments(mut self, comments: Comments) -> View {
        self.comments = Some(comments);
        self
    }

    /// The post list. An empty list renders the "no posts" message.
    pub fn post_list(&self, posts: &[&PostRecord]) -> Result<String> {
        let posts = posts.iter().map(|p| self.post_item(p)).collect();
        render(&self.post_list, object(vec![("posts", Value::Array(posts))]))
    }

    /// The tag bar: an "All" button followed by one button per tag, in the
    /// given order. Empty when there are no tags.
    pub fn tag_bar(&self, tags: &[TagCount], active: Option<&str>) -> Result<String> {
        let buttons = tags
            .iter()
            .map(|t| {
                object(vec![
                    ("tag", text(&t.tag)),
                    ("label", text(&format!("{} ({})", t.tag, t.count))),
                    ("active", Value::Bool(active == Some(t.tag.as_str()))),
                ])
            })
            .collect();
        render(
            &self.tag_bar,
            object(vec![
                ("tags", Value::Array(buttons)),
                ("all_active", Value::Bool(active.is_none())),
            ]),
        )
    }

    /// The full listing page: tag bar and post list inside the layout.
    pub fn index_page(
        &self,
        tags: &[TagCount],
        active: Option<&str>,
        posts: &[&PostRecord],
        theme: Theme,
    ) -> Result<String> {
        let mut body = self.tag_bar(tags, active)?;
        body.push_str(&self.post_list(posts)?);
        self.page(&self.site_title, None, &body, theme)
    }

    /// A single post page. `content` is the post body already rendered to
    /// HTML.
    pub fn post_page(&self, document: &Document, content: &str, theme: Theme) -> Result<String> {
        let title = document.title().unwrap_or(UNTITLED);
        let comments = match &self.comments {
            Some(comments) => comment_widget(comments),
            None => String::new(),
        };
        let body = render(
            &self.post,
            object(vec![
                ("title", text(title)),
                ("date", text(&document.date().map(|d| self.format_date(d)).unwrap_or_default())),
                ("category", text(document.category().unwrap_or_default())),
                ("tags", Value::Array(document.tags().iter().map(|t| text(t)).collect())),
                ("content", Value::String(content.to_owned())),
                ("comments", Value::String(comments)),
            ]),
        )?;
        self.page(
            &format!("{} - {}", title, self.site_title),
            document.description(),
            &body,
            theme,
        )
    }

    /// The page shown in place of a post or listing which failed to load.
    pub fn error_page(&self, message: &str, theme: Theme) -> Result<String> {
        self.page(
            &format!("Error - {}", self.site_title),
            None,
            &error_message(message),
            theme,
        )
    }

    /// Formats a post date (`YYYY-MM-DD`, optionally followed by a time) with
    /// the configured format. Anything else is returned unchanged.
    pub fn format_date(&self, date: &str) -> String {
        format_date(date, &self.date_format)
    }

    fn page(&self, title: &str, description: Option<&str>, body: &str, theme: Theme) -> Result<String> {
        render(
            &self.layout,
            object(vec![
                ("title", text(title)),
                ("site_title", text(&self.site_title)),
                ("description", text(description.unwrap_or_default())),
                ("theme", Value::String(theme.as_str().to_owned())),
                ("body", Value::String(body.to_owned())),
            ]),
        )
    }

    fn post_item(&self, post: &PostRecord) -> Value {
        object(vec![
            ("title", text(&post.title)),
            ("summary", text(post.summary())),
            ("date", text(&self.format_date(&post.date))),
            ("category", text(post.category.as_deref().unwrap_or_default())),
            ("href", text(&post_href(&post.file))),
            ("tags", Value::Array(post.tags.iter().map(|t| text(t)).collect())),
        ])
    }
}

/// Formats `date` with the `chrono` format string `format`, falling back to
/// `date` itself when it isn't an ISO date or the format is invalid.
pub fn format_date(date: &str, format: &str) -> String {
    let day = date.split(|c| c == 'T' || c == ' ').next().unwrap_or(date);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(parsed) => {
            let mut out = String::new();
            match write!(out, "{}", parsed.format(format)) {
                Ok(()) => out,
                Err(_) => date.to_owned(),
            }
        }
        Err(_) => date.to_owned(),
    }
}

/// An inline message shown in place of content which failed to load.
pub fn error_message(message: &str) -> String {
    format!(r#"<p class="error">{}</p>"#, escape(message))
}

/// The `<script>` element which embeds the comment widget.
pub fn comment_widget(comments: &Comments) -> String {
    let attributes = [
        ("data-repo", &comments.repo),
        ("data-repo-id", &comments.repo_id),
        ("data-category", &comments.category),
        ("data-category-id", &comments.category_id),
        ("data-mapping", &comments.mapping),
        ("data-theme", &comments.theme),
        ("data-lang", &comments.lang),
    ];
    let mut out = format!(r#"<script src="{}""#, escape(&comments.script));
    for (name, value) in attributes.iter() {
        out.push_str(&format!(r#" {}="{}""#, name, escape(value)));
    }
    out.push_str(
        r#" data-strict="0" data-reactions-enabled="1" data-emit-metadata="1" data-input-position="top" data-loading="lazy" crossorigin="anonymous" async></script>"#,
    );
    out
}

/// Escapes `s` for use in HTML text and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing into a `String` can't fail
    escape_html(&mut out, s).ok();
    out
}

fn text(s: &str) -> Value {
    Value::String(escape(s))
}

fn object(fields: Vec<(&str, Value)>) -> Value {
    let m: HashMap<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    Value::Object(m)
}

fn render(template: &Template, value: Value) -> Result<String> {
    Ok(template.render(&gtmpl::Context::from(value)?)?)
}

fn load_template(dir: Option<&Path>, name: &str, default: &str) -> Result<Template> {
    let contents = match dir.map(|dir| dir.join(name)).filter(|path| path.is_file()) {
        Some(path) => std::fs::read_to_string(&path).map_err(|err| Error::OpenTemplateFile {
            path: path.clone(),
            err,
        })?,
        None => default.to_owned(),
    };
    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|err| Error::ParseTemplate {
            name: name.to_owned(),
            err,
        })?;
    Ok(template)
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or applying a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, err: String },

    /// An error during templating.
    Template(String),
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template `{}`: {}", name, err)
            }
            Error::Template(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
            Error::Template(_) => None,
        }
    }
}
