//! The views. [`render`] is the router's dispatch: it maps a [`Route`] onto
//! the list, post or about view and returns the full contents of the main
//! region. Views read from a [`ViewContext`] and never mutate anything.

use crate::markup;
use crate::post::Post;
use crate::route::{Linker, Route};
use crate::state::AppState;

/// Shown when the list view has nothing to show, either because nothing
/// matched or because no posts were loaded.
pub const EMPTY_MESSAGE: &str = "No posts yet.";

/// Shown when a post route names an unknown slug.
pub const NOT_FOUND_MESSAGE: &str = "Post not found.";

/// Used for the about page when the project doesn't supply one.
pub const DEFAULT_ABOUT: &str = "<p>Short, sharp rants and analysis. \
    Posts live in the posts document and the scoreboard widgets in the stats \
    directory.</p>";

/// Everything a view needs to render.
pub struct ViewContext<'a> {
    pub state: &'a AppState,
    pub linker: &'a Linker,

    /// The about page body, already rendered to HTML.
    pub about: &'a str,
}

/// Renders `route`, replacing whatever the main region held before.
pub fn render(route: &Route, ctx: &ViewContext) -> String {
    match route {
        Route::List => list(ctx),
        Route::Post(slug) => post(ctx, slug),
        Route::About => about(ctx),
    }
}

/// The filtered list of post summary cards.
pub fn list(ctx: &ViewContext) -> String {
    let visible = ctx.state.visible();
    let cards = if visible.is_empty() {
        format!(r#"<p class="empty">{}</p>"#, EMPTY_MESSAGE)
    } else {
        visible.iter().map(|post| card(ctx.linker, post)).collect()
    };
    format!(r#"<div class="post-list">{}</div>"#, cards)
}

fn card(linker: &Linker, post: &Post) -> String {
    format!(
        concat!(
            r#"<article class="post-card"><a href="{href}">"#,
            r#"<h2>{title}</h2><p class="meta">{date} • {tags}</p>{subtitle}"#,
            "</a></article>",
        ),
        href = linker.href(&Route::Post(post.slug.clone())),
        title = post.title,
        date = post.medium_date(),
        tags = post.tag_line(),
        subtitle = post
            .subtitle()
            .map(|s| format!(r#"<p class="subtitle">{}</p>"#, s))
            .unwrap_or_default(),
    )
}

/// A single post, or the not-found message.
pub fn post(ctx: &ViewContext, slug: &str) -> String {
    let post = match ctx.state.find(slug) {
        Some(post) => post,
        None => return format!(r#"<p class="empty">{}</p>"#, NOT_FOUND_MESSAGE),
    };

    format!(
        concat!(
            r#"<article class="post"><a class="back" href="{back}">← Back</a>"#,
            r#"<h1>{title}</h1><p class="meta">{date} • {tags}</p>{subtitle}"#,
            r#"<div class="post-body">{body}</div></article>"#,
        ),
        back = ctx.linker.href(&Route::List),
        title = post.title,
        date = post.long_date(),
        tags = post.tag_line(),
        subtitle = post
            .subtitle()
            .map(|s| format!(r#"<p class="subtitle">{}</p>"#, s))
            .unwrap_or_default(),
        body = markup::transform(&post.body),
    )
}

pub fn about(ctx: &ViewContext) -> String {
    format!(r#"<section class="about"><h1>About</h1>{}</section>"#, ctx.about)
}

/// Renders the about page's markdown source.
pub fn about_from_markdown(source: &str) -> String {
    use pulldown_cmark::{html, Parser};
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(source));
    out
}
