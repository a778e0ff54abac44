//! The post-body transformer. This is deliberately *not* markdown: it is a
//! fixed, ordered list of pattern substitutions and only promises to apply
//! those substitutions in that order. Nested or overlapping markers do
//! whatever the patterns happen to do.
//!
//! Fenced code blocks are cut out before any other stage runs and spliced
//! back in at the end, so their contents are inert: no stage (including the
//! newline stages) ever sees them.
//!
//! Line-scoped stages run in CRLF mode, so a `\r` before a newline ends the
//! line instead of landing inside a heading or list item.

use std::sync::LazyLock;

use pulldown_cmark::escape::escape_html;
use regex::{Captures, Regex};

/// Brackets the index of a protected span while the stages run. None of the
/// stages match it. Occurrences already in the input are protected too, so
/// every placeholder left in the text is one of ours.
const PLACEHOLDER: char = '\u{FFFC}';

/// One pattern→replacement stage. Replacements use `regex` capture syntax.
struct Stage {
    pattern: Regex,
    replacement: &'static str,
}

impl Stage {
    fn new(pattern: &str, replacement: &'static str) -> Stage {
        Stage {
            pattern: Regex::new(pattern).expect("stage patterns are valid"),
            replacement,
        }
    }

    fn apply(&self, text: String) -> String {
        self.pattern.replace_all(&text, self.replacement).into_owned()
    }
}

/// A fenced code block, or a stray placeholder character.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?s)```(.*?)```|{}", PLACEHOLDER)).expect("fence pattern is valid")
});

static PROTECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("{0}([0-9]+){0}", PLACEHOLDER)).expect("placeholder pattern is valid")
});

// Order matters: bold must run before italic, list items before the list
// wrapper, and paragraph breaks before single line breaks.
static STAGES: LazyLock<Vec<Stage>> = LazyLock::new(|| {
    vec![
        Stage::new(r"(?mR)^### (.*)$", "<h3>${1}</h3>"),
        Stage::new(r"(?mR)^## (.*)$", "<h2>${1}</h2>"),
        Stage::new(r"(?mR)^# (.*)$", "<h1>${1}</h1>"),
        Stage::new(r"(?R)\*\*(.+?)\*\*", "<strong>${1}</strong>"),
        Stage::new(r"(?R)\*(.+?)\*", "<em>${1}</em>"),
        Stage::new(r"(?mR)^- (.*)$", "<li>${1}</li>"),
        Stage::new(r"(?s)(<li>.*</li>)", "<ul>${1}</ul>"),
        Stage::new(r"\n{2,}", "</p><p>"),
        Stage::new(r"\n", "<br/>"),
    ]
});

/// Transforms a post body into HTML wrapped in a single
/// `<div class="prose"><p>…</p></div>` container.
pub fn transform(input: &str) -> String {
    let (text, blocks) = protect_code(input);
    let html = STAGES.iter().fold(text, |text, stage| stage.apply(text));
    format!(r#"<div class="prose"><p>{}</p></div>"#, restore_code(&html, &blocks))
}

/// Replaces every fenced block and every literal placeholder character with a
/// placeholder, returning the rewritten text and what each placeholder stands
/// for, in order.
fn protect_code(input: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();
    let text = FENCE.replace_all(input, |caps: &Captures| {
        blocks.push(match caps.get(1) {
            Some(code) => format!("<pre><code>{}</code></pre>", escape(code.as_str())),
            None => PLACEHOLDER.to_string(),
        });
        format!("{0}{1}{0}", PLACEHOLDER, blocks.len() - 1)
    });
    (text.into_owned(), blocks)
}

fn restore_code(html: &str, blocks: &[String]) -> String {
    PROTECTED
        .replace_all(html, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| blocks.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

/// Escapes `&`, `<`, `>` and `"`.
fn escape(code: &str) -> String {
    let mut escaped = String::with_capacity(code.len());
    // Writing into a String can't fail.
    let _ = escape_html(&mut escaped, code);
    escaped
}
