//! Defines the [`TagCount`] type and [`aggregate_tags`], which counts how many
//! posts carry each tag for the tag bar.

use crate::post::PostRecord;
use std::collections::HashMap;

/// A tag and the number of posts which carry it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagCount {
    /// The tag's name, exactly as it appears on the posts.
    pub tag: String,

    /// The number of posts carrying the tag. A tag listed twice on the same
    /// post counts once.
    pub count: usize,
}

/// Counts the posts per tag and orders the result by descending count. Tags
/// with equal counts keep the order in which they were first seen, scanning
/// `posts` in order and each post's tags in order.
pub fn aggregate_tags(posts: &[PostRecord]) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        for (i, tag) in post.tags.iter().enumerate() {
            // only the first occurrence within a post counts
            if post.tags[..i].contains(tag) {
                continue;
            }
            match positions.get(tag.as_str()) {
                Some(&position) => counts[position].count += 1,
                None => {
                    positions.insert(tag.as_str(), counts.len());
                    counts.push(TagCount {
                        tag: tag.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    // `sort_by` is stable, so ties stay in first-seen order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(tags: &[&str]) -> PostRecord {
        PostRecord {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..PostRecord::default()
        }
    }

    fn counts(tags: &[TagCount]) -> Vec<(&str, usize)> {
        tags.iter().map(|t| (t.tag.as_str(), t.count)).collect()
    }

    #[test]
    fn test_empty() {
        assert!(aggregate_tags(&[]).is_empty());
        assert!(aggregate_tags(&[post(&[]), post(&[])]).is_empty());
    }

    #[test]
    fn test_descending_count_with_first_seen_ties() {
        let posts = vec![
            post(&["web", "rust"]),
            post(&["cli", "rust"]),
            post(&["rust", "cli"]),
            post(&["web", "async"]),
        ];
        assert_eq!(
            vec![("rust", 3), ("web", 2), ("cli", 2), ("async", 1)],
            counts(&aggregate_tags(&posts)),
        );
    }

    #[test]
    fn test_duplicates_within_a_post_count_once() {
        let posts = vec![post(&["rust", "rust", "Rust"]), post(&["rust"])];
        assert_eq!(
            vec![("rust", 2), ("Rust", 1)],
            counts(&aggregate_tags(&posts)),
        );
    }
}
