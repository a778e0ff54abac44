//! Defines the [`Post`] type as it appears in the posts document, along with
//! the date handling used for ordering and display.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Displayed in place of a date that couldn't be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

/// A single blog post. Posts are read-only once loaded.
///
/// Records aren't validated: a missing or null text field reads as empty and
/// a number reads as its JSON text, so a bad record only affects how that one
/// post renders.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Post {
    /// The post's stable identifier. It doubles as the lookup key and as the
    /// last segment of the post's route (`#/post/{slug}`).
    #[serde(default, deserialize_with = "loose_text")]
    pub slug: String,

    /// The title of the post.
    #[serde(default, deserialize_with = "loose_text")]
    pub title: String,

    /// An optional one-line subtitle. An empty subtitle is treated as absent.
    #[serde(default)]
    pub subtitle: Option<String>,

    /// The post body in the lightweight markup understood by
    /// [`crate::markup::transform`].
    #[serde(default, deserialize_with = "loose_text")]
    pub body: String,

    /// The publication date as written in the source document.
    #[serde(default, deserialize_with = "loose_text")]
    pub date: String,

    /// The post's category labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl Post {
    /// Parses [`Post::date`]. Accepts RFC 3339 timestamps (seconds optional,
    /// `Z` or a numeric offset), naive date-times (taken as UTC) and dates
    /// reduced to `YYYY-MM-DD`, `YYYY-MM` or `YYYY` (midnight UTC on the first
    /// day they name).
    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(&self.date)
    }

    /// The subtitle, if present and non-empty.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref().filter(|s| !s.is_empty())
    }

    /// The date in medium form, e.g. `Jan 5, 2024`.
    pub fn medium_date(&self) -> String {
        self.format_date("%b %-d, %Y")
    }

    /// The date in long form, e.g. `January 5, 2024`.
    pub fn long_date(&self) -> String {
        self.format_date("%B %-d, %Y")
    }

    /// The tags joined for display.
    pub fn tag_line(&self) -> String {
        self.tags.join(" • ")
    }

    /// The text searched by the list view's free-text filter, lowercased.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.subtitle.as_deref().unwrap_or_default(),
            self.body
        )
        .to_lowercase()
    }

    fn format_date(&self, format: &str) -> String {
        match self.published() {
            Some(date) => date.format(format).to_string(),
            None => INVALID_DATE.to_owned(),
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    // Padding that completes a reduced date to a full `YYYY-MM-DD`.
    const DATE_PADDING: [&str; 3] = ["", "-01", "-01-01"];

    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }

    let zoned = match s.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{}+00:00", local),
        None => s.to_owned(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(&zoned, format) {
            return Some(date);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    DATE_PADDING
        .iter()
        .find_map(|padding| {
            NaiveDate::parse_from_str(&format!("{}{}", s, padding), "%Y-%m-%d").ok()
        })
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Sorts posts newest first. The sort is stable; posts with unparseable dates
/// go after every dated post.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| std::cmp::Reverse(post.published()));
}

/// Parses the posts document: a JSON array of [`Post`] records.
pub fn parse_posts(input: &str) -> serde_json::Result<Vec<Post>> {
    serde_json::from_str(input)
}

#[cfg(test)]
pub(crate) fn fixture(slug: &str, date: &str, tags: &[&str]) -> Post {
    Post {
        slug: slug.to_owned(),
        title: format!("Title {}", slug),
        subtitle: None,
        body: format!("Body of {}.", slug),
        date: date.to_owned(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
    }
}
