//! Tag and text filtering over the post list. The functions here are pure; the
//! [`crate::blog::Blog`] controller owns the [`FilterState`] and publishes the
//! results.

use crate::post::PostRecord;

/// The user's current filter selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    active_tag: Option<String>,
    search_query: String,
}

impl FilterState {
    /// Creates an empty filter state which lets every post through.
    pub fn new() -> FilterState {
        FilterState::default()
    }

    /// The selected tag, if any.
    pub fn active_tag(&self) -> Option<&str> {
        self.active_tag.as_deref()
    }

    /// The committed search query, lowercased and trimmed.
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Selects a tag. `None` and the empty string both clear the selection.
    pub fn set_active_tag(&mut self, tag: Option<&str>) {
        self.active_tag = tag.filter(|t| !t.is_empty()).map(str::to_owned);
    }

    /// Commits a search query. The query is stored lowercased and trimmed.
    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = normalize_query(query);
    }

    /// Filters `posts` by this state.
    pub fn apply<'a>(&self, posts: &'a [PostRecord]) -> Vec<&'a PostRecord> {
        filter(posts, self.active_tag(), &self.search_query)
    }
}

/// Lowercases and trims a raw search query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Returns the posts carrying `active_tag` (when given and non-empty) whose
/// title, excerpt, description or tags contain `search_query`
/// case-insensitively (when non-empty). Relative order is preserved.
pub fn filter<'a>(
    posts: &'a [PostRecord],
    active_tag: Option<&str>,
    search_query: &str,
) -> Vec<&'a PostRecord> {
    let tag = active_tag.filter(|t| !t.is_empty());
    let query = normalize_query(search_query);
    posts
        .iter()
        .filter(|post| match tag {
            Some(tag) => post.has_tag(tag),
            None => true,
        })
        .filter(|post| query.is_empty() || matches_query(post, &query))
        .collect()
}

/// `query` must already be normalized.
fn matches_query(post: &PostRecord, query: &str) -> bool {
    post.title.to_lowercase().contains(query)
        || post.excerpt.to_lowercase().contains(query)
        || post.description.to_lowercase().contains(query)
        || post.tags.iter().any(|t| t.to_lowercase().contains(query))
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(title: &str, excerpt: &str, description: &str, tags: &[&str]) -> PostRecord {
        PostRecord {
            title: title.to_owned(),
            excerpt: excerpt.to_owned(),
            description: description.to_owned(),
            date: String::from("2024-01-01"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
            file: format!("{}.md", title.to_lowercase().replace(' ', "-")),
        }
    }

    fn fixture() -> Vec<PostRecord> {
        vec![
            post("Rust Ownership", "borrowing explained", "", &["rust", "Memory"]),
            post("Async in Practice", "", "Futures and executors", &["rust", "async"]),
            post("Baking Bread", "sourdough notes", "weekend project", &["cooking"]),
            post("Memory Palaces", "", "", &[]),
            post("Untagged Musings", "about Rust, loosely", "", &[]),
        ]
    }

    fn titles(posts: &[&PostRecord]) -> Vec<String> {
        posts.iter().map(|p| p.title.clone()).collect()
    }

    #[test]
    fn test_empty_list() {
        assert!(filter(&[], Some("rust"), "anything").is_empty());
        assert!(filter(&[], None, "").is_empty());
    }

    #[test]
    fn test_no_filters_pass_through() {
        let posts = fixture();
        assert_eq!(posts.len(), filter(&posts, None, "").len());
        assert_eq!(posts.len(), filter(&posts, Some(""), "   ").len());
    }

    #[test]
    fn test_tag_only() {
        let posts = fixture();
        assert_eq!(
            vec!["Rust Ownership", "Async in Practice"],
            titles(&filter(&posts, Some("rust"), "")),
        );
    }

    #[test]
    fn test_tag_is_case_sensitive() {
        let posts = fixture();
        assert!(filter(&posts, Some("memory"), "").is_empty());
        assert_eq!(
            vec!["Rust Ownership"],
            titles(&filter(&posts, Some("Memory"), "")),
        );
    }

    #[test]
    fn test_query_matches_every_field_case_insensitively() {
        let posts = fixture();
        // title
        assert_eq!(vec!["Baking Bread"], titles(&filter(&posts, None, "BREAD")));
        // excerpt
        assert_eq!(vec!["Baking Bread"], titles(&filter(&posts, None, "sourdough")));
        // description
        assert_eq!(
            vec!["Async in Practice"],
            titles(&filter(&posts, None, "executors")),
        );
        // tag
        assert_eq!(vec!["Baking Bread"], titles(&filter(&posts, None, "cook")));
        // title, tag and excerpt, in order
        assert_eq!(
            vec!["Rust Ownership", "Async in Practice", "Untagged Musings"],
            titles(&filter(&posts, None, "  Rust ")),
        );
    }

    #[test]
    fn test_query_without_matches() {
        let posts = fixture();
        assert!(filter(&posts, None, "haskell").is_empty());
    }

    #[test]
    fn test_combined_is_intersection() {
        let posts = fixture();
        for tag in [None, Some("rust"), Some("cooking"), Some("Memory")] {
            for query in ["", "memory", "rust", "e", "nothing"] {
                let by_tag = filter(&posts, tag, "");
                let by_query = filter(&posts, None, query);
                let wanted: Vec<&PostRecord> = by_tag
                    .iter()
                    .copied()
                    .filter(|p| by_query.iter().any(|q| std::ptr::eq(*p, *q)))
                    .collect();
                assert_eq!(wanted, filter(&posts, tag, query), "{:?} {:?}", tag, query);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let posts = fixture();
        let once: Vec<PostRecord> = filter(&posts, Some("rust"), "async")
            .into_iter()
            .cloned()
            .collect();
        let twice = filter(&once, Some("rust"), "async");
        assert_eq!(titles(&twice), vec!["Async in Practice"]);
        assert_eq!(once.iter().collect::<Vec<_>>(), twice);
    }

    #[test]
    fn test_state_normalizes_inputs() {
        let posts = fixture();
        let mut state = FilterState::new();
        state.set_search_query("  ASYNC  ");
        state.set_active_tag(Some(""));
        assert_eq!("async", state.search_query());
        assert_eq!(None, state.active_tag());
        assert_eq!(vec!["Async in Practice"], titles(&state.apply(&posts)));

        state.set_active_tag(Some("cooking"));
        assert!(state.apply(&posts).is_empty());
    }
}
