//! Title search over resolved posts.
//!
//! Matching is a case-insensitive substring test against the title and the
//! publication label; bodies are not searched.

use crate::post::Post;

/// Indices of the posts matching `query`, in their original order.
///
/// A blank query matches every post.
pub fn filter(posts: &[Post], query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    posts
        .iter()
        .enumerate()
        .filter(|(_, post)| {
            needle.is_empty()
                || post.title.to_lowercase().contains(&needle)
                || post.published_label.to_lowercase().contains(&needle)
        })
        .map(|(index, _)| index)
        .collect()
}
