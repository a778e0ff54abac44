//! Defines [`AppState`], the single source of truth consumed by the views:
//! the loaded posts, the active [`TagFilter`] and the search query.

use std::fmt;

use crate::post::{sort_newest_first, Post};

/// The name of the sentinel filter which matches every post.
pub const ALL_TAGS: &str = "All";

/// The active tag constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TagFilter {
    /// No constraint.
    #[default]
    All,

    /// Only posts carrying exactly this tag (case-sensitive).
    Tag(String),
}

impl TagFilter {
    /// Reports whether `post` passes the filter.
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            TagFilter::All => true,
            TagFilter::Tag(tag) => post.tags.iter().any(|t| t == tag),
        }
    }
}

impl From<&str> for TagFilter {
    /// `"All"` maps onto [`TagFilter::All`]; anything else is a tag.
    fn from(s: &str) -> TagFilter {
        match s {
            ALL_TAGS => TagFilter::All,
            tag => TagFilter::Tag(tag.to_owned()),
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TagFilter::All => f.write_str(ALL_TAGS),
            TagFilter::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Mutable application state for one session. The only mutation entry points
/// are [`AppState::load`], [`AppState::set_filter`] and
/// [`AppState::set_search`].
#[derive(Clone, Debug, Default)]
pub struct AppState {
    posts: Vec<Post>,
    filter: TagFilter,
    search: String,
}

impl AppState {
    pub fn new() -> AppState {
        AppState::default()
    }

    /// Replaces the post collection wholesale, sorting it newest first.
    pub fn load(&mut self, mut posts: Vec<Post>) {
        sort_newest_first(&mut posts);
        self.posts = posts;
    }

    pub fn set_filter(&mut self, filter: TagFilter) {
        self.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn filter(&self) -> &TagFilter {
        &self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// The posts passing both the tag filter and the search query, in loaded
    /// order. The query is trimmed and matched case-insensitively as a plain
    /// substring of the post's title, subtitle and body.
    pub fn visible(&self) -> Vec<&Post> {
        let query = self.search.trim().to_lowercase();
        self.posts
            .iter()
            .filter(|post| self.filter.matches(post))
            .filter(|post| query.is_empty() || post.search_text().contains(&query))
            .collect()
    }

    /// Finds a post by slug. When slugs collide the first loaded match wins.
    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.slug == slug)
    }

    /// Every distinct tag across the loaded posts, sorted.
    pub fn known_tags(&self) -> Vec<&str> {
        use std::collections::BTreeSet;
        self.posts
            .iter()
            .flat_map(|post| post.tags.iter().map(String::as_str))
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture;
    use proptest::prelude::*;

    fn loaded() -> AppState {
        let mut state = AppState::new();
        let mut dolphins = fixture("dolphins-win", "2024-01-03", &["Dolphins"]);
        dolphins.body = "Tua threw for **300** yards.".to_owned();
        let mut wizards = fixture("wizards-lose", "2024-01-02", &["Wizards"]);
        wizards.subtitle = Some("Another rough night".to_owned());
        let both = fixture("weekend", "2024-01-04", &["Dolphins", "Wizards"]);
        state.load(vec![dolphins, wizards, both]);
        state
    }

    fn slugs(posts: &[&Post]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn test_load_sorts_newest_first() {
        let state = loaded();
        let slugs: Vec<&str> = state.posts().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["weekend", "dolphins-win", "wizards-lose"], slugs);
    }

    #[test]
    fn test_defaults() {
        let state = AppState::new();
        assert_eq!(&TagFilter::All, state.filter());
        assert_eq!("", state.search());
        assert!(state.visible().is_empty());
    }

    #[test]
    fn test_tag_filter() {
        let mut state = loaded();
        state.set_filter(TagFilter::from("Wizards"));
        assert_eq!(vec!["weekend", "wizards-lose"], slugs(&state.visible()));

        // exact, case-sensitive membership
        state.set_filter(TagFilter::from("wizards"));
        assert!(state.visible().is_empty());

        state.set_filter(TagFilter::from(ALL_TAGS));
        assert_eq!(3, state.visible().len());
    }

    #[test]
    fn test_search_matches_subtitle_and_body() {
        let mut state = loaded();
        state.set_search("  ROUGH ");
        assert_eq!(vec!["wizards-lose"], slugs(&state.visible()));

        state.set_search("**300**");
        assert_eq!(vec!["dolphins-win"], slugs(&state.visible()));

        state.set_search("no such words");
        assert!(state.visible().is_empty());
    }

    #[test]
    fn test_filter_and_search_combine() {
        let mut state = loaded();
        state.set_filter(TagFilter::from("Dolphins"));
        state.set_search("title");
        assert_eq!(vec!["weekend", "dolphins-win"], slugs(&state.visible()));
    }

    #[test]
    fn test_find_first_match_wins() {
        let mut state = AppState::new();
        let mut first = fixture("dup", "2024-02-01", &[]);
        first.title = "First".to_owned();
        let mut second = fixture("dup", "2024-01-01", &[]);
        second.title = "Second".to_owned();
        state.load(vec![second, first]);
        assert_eq!(Some("First"), state.find("dup").map(|p| p.title.as_str()));
        assert_eq!(None, state.find("missing"));
    }

    #[test]
    fn test_known_tags() {
        assert_eq!(vec!["Dolphins", "Wizards"], loaded().known_tags());
    }

    fn arb_posts() -> impl Strategy<Value = Vec<Post>> {
        prop::collection::vec(
            (
                "[a-z]{1,6}",
                0u32..28,
                prop::sample::subsequence(vec!["Dolphins", "Wizards", "NFL"], 0..=3),
                "[a-zA-Z ]{0,20}",
            ),
            0..12,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(slug, day, tags, body)| {
                    let mut post = fixture(&slug, &format!("2024-02-{:02}", day + 1), &tags);
                    post.body = body;
                    post
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn visible_is_ordered_subsequence(
            posts in arb_posts(),
            tag in prop::sample::select(vec!["All", "Dolphins", "Wizards", "NFL"]),
            query in "[a-zA-Z ]{0,3}",
        ) {
            let mut state = AppState::new();
            state.load(posts);
            state.set_filter(TagFilter::from(tag));
            state.set_search(query.clone());

            let visible = state.visible();
            let mut remaining = state.posts().iter();
            for post in &visible {
                prop_assert!(remaining.any(|p| std::ptr::eq(p, *post)));
            }

            if tag == ALL_TAGS {
                let needle = query.trim().to_lowercase();
                let text_matched = state
                    .posts()
                    .iter()
                    .filter(|p| needle.is_empty() || p.search_text().contains(&needle))
                    .count();
                prop_assert_eq!(text_matched, visible.len());
            }
        }
    }
}
