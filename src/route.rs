//! Parses URL fragments into [`Route`]s and turns routes back into hrefs via
//! a [`Linker`].

use url::Url;

/// One of the three views the site can show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// The (filtered) list of post summaries.
    List,

    /// A single post, addressed by slug.
    Post(String),

    /// The static about page.
    About,
}

impl Route {
    /// Parses a fragment such as `#/post/some-slug`. This is total: anything
    /// that isn't a recognized route is the list view.
    ///
    /// The fragment is split on `/` and the segment after the first slash is
    /// the route name, the one after that its parameter. Extra segments are
    /// ignored.
    pub fn parse(fragment: &str) -> Route {
        let path = fragment.strip_prefix('#').unwrap_or(fragment);
        let path = if path.is_empty() { "/" } else { path };

        let mut segments = path.split('/').skip(1);
        match (segments.next(), segments.next()) {
            (Some("post"), Some(slug)) if !slug.is_empty() => {
                Route::Post(slug.to_owned())
            }
            (Some("about"), _) => Route::About,
            _ => Route::List,
        }
    }

    /// The canonical fragment for this route.
    pub fn fragment(&self) -> String {
        match self {
            Route::List => "#/".to_owned(),
            Route::Post(slug) => format!("#/post/{}", slug),
            Route::About => "#/about".to_owned(),
        }
    }
}

/// Decides what hrefs look like in rendered output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Linker {
    /// Links are fragments handled by the client-side router.
    Fragment,

    /// Links point at pre-rendered pages under `root`, which must end in a
    /// trailing slash: `{root}index.html`, `{root}posts/{slug}.html`,
    /// `{root}about.html` and `{root}tags/{tag}.html`. Slugs and tags are
    /// percent-encoded as path segments.
    Static(Url),
}

impl Linker {
    /// The href for `route`.
    pub fn href(&self, route: &Route) -> String {
        match self {
            Linker::Fragment => route.fragment(),
            Linker::Static(root) => match route {
                Route::List => page(root, None, "index"),
                Route::Post(slug) => page(root, Some("posts"), slug),
                Route::About => page(root, None, "about"),
            },
        }
    }

    /// The href for a tag's index page. Fragment links have no per-tag
    /// address since tag selection doesn't touch the fragment.
    pub fn tag_href(&self, tag: &str) -> Option<String> {
        match self {
            Linker::Fragment => None,
            Linker::Static(root) => Some(page(root, Some("tags"), tag)),
        }
    }
}

/// `{root}{dir}/{name}.html`, with `name` encoded as a single path segment.
fn page(root: &Url, dir: Option<&str>, name: &str) -> String {
    let mut url = root.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(dir);
        segments.push(&format!("{}.html", name));
    }
    url.to_string()
}
