//! The library code for `blogfront`, the front-end of a static Markdown blog.
//! The site is a directory of Markdown posts with YAML front matter plus a
//! JSON index of post metadata; everything here is about reading those two
//! things and turning them into pages. The architecture can be broken down
//! into three layers:
//!
//! 1. Parsing: the post index ([`crate::post`]) and a post's front matter
//!    ([`crate::parser`]), loaded through a [`crate::fetch::Fetcher`].
//! 2. State: the [`crate::blog::Blog`] controller, which owns the loaded
//!    posts, the active tag and search query ([`crate::filter`]), the
//!    debounced search box ([`crate::search`]) and an event bus
//!    ([`crate::event`]). Every filter change publishes the filtered posts;
//!    renderers subscribe rather than being called directly.
//! 3. Rendering: templates ([`crate::view`]), Markdown ([`crate::markdown`])
//!    with intra-site links rewritten ([`crate::link`]), and the Atom feed
//!    ([`crate::feed`]).
//!
//! The theme ([`crate::theme`]) sits off to the side: it resolves light or
//! dark from a persisted preference and the OS color scheme. [`crate::site`]
//! ties the layers together for one site directory, and [`crate::index`]
//! regenerates the JSON index from the posts themselves.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod blog;
pub mod config;
pub mod event;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod index;
pub mod link;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod search;
pub mod site;
pub mod tag;
pub mod theme;
pub mod view;
