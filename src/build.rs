//! Exports [`render_page`] and [`build_site`], the two operations behind the
//! command line: rendering a single route to a string, and pre-rendering every
//! route into a static snapshot of the site.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::route::{Linker, Route};
use crate::session::Session;
use crate::source::FileSource;
use crate::state::TagFilter;
use crate::view::{about_from_markdown, DEFAULT_ABOUT};
use crate::write::{Error as WriteError, Shell};

/// What the user has asked to see: a route plus the list filters.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub fragment: String,
    pub tag: Option<String>,
    pub search: Option<String>,
}

/// Renders the full page for `request`. All loads are allowed to settle
/// before the tag filter and search are applied, in that order.
pub fn render_page(config: &Config, request: &Request) -> Result<String> {
    let shell = load_shell(config)?;
    let mut session = Session::start(
        Arc::new(FileSource),
        &config.endpoints,
        Linker::Fragment,
        load_about(config)?,
        &request.fragment,
    );
    session.settle();
    if let Some(tag) = &request.tag {
        session.select_tag(TagFilter::from(tag.as_str()));
    }
    if let Some(search) = &request.search {
        session.set_search(search);
    }
    Ok(shell.render(&session)?)
}

/// Writes the static snapshot into [`Config::output_directory`]:
///
/// * `index.html`, the unfiltered list
/// * `about.html`
/// * `posts/{slug}.html` for every post
/// * `tags/{tag}.html`, the list filtered to each tag
///
/// The `posts` and `tags` directories are deleted first so stale pages don't
/// linger.
pub fn build_site(config: &Config) -> Result<()> {
    let out = &config.output_directory;
    let root = Url::from_directory_path(out).map_err(|()| Error::OutputPath(out.clone()))?;
    let shell = load_shell(config)?;

    let mut session = Session::start(
        Arc::new(FileSource),
        &config.endpoints,
        Linker::Static(root),
        load_about(config)?,
        &Route::List.fragment(),
    );
    session.settle();

    rmdir(&out.join("posts"))?;
    rmdir(&out.join("tags"))?;

    shell.write(&session, &out.join("index.html"))?;

    session.navigate(&Route::About.fragment());
    shell.write(&session, &out.join("about.html"))?;

    let slugs: Vec<String> = session.state().posts().iter().map(|p| p.slug.clone()).collect();
    for slug in &slugs {
        let route = Route::Post(slug.clone());
        if Route::parse(&route.fragment()) != route {
            warn!(slug = %slug, "skipping post whose slug can't be routed");
            continue;
        }
        session.navigate(&route.fragment());
        shell.write(&session, &out.join("posts").join(format!("{}.html", slug)))?;
    }

    let tags: Vec<String> = match &config.tags {
        Some(tags) => tags.clone(),
        None => session.state().known_tags().into_iter().map(str::to_owned).collect(),
    };
    session.navigate(&Route::List.fragment());
    for tag in &tags {
        if tag.contains('/') || tag == ".." {
            warn!(tag = %tag, "skipping tag that can't be a file name");
            continue;
        }
        session.select_tag(TagFilter::Tag(tag.clone()));
        shell.write(&session, &out.join("tags").join(format!("{}.html", tag)))?;
    }

    info!(
        posts = slugs.len(),
        tags = tags.len(),
        output = %out.display(),
        "site built"
    );
    Ok(())
}

fn load_shell(config: &Config) -> Result<Shell> {
    Ok(Shell::from_files(
        config.template.iter(),
        &config.title,
        config.tags.clone(),
    )?)
}

/// Renders the project's about page, or the built-in one if there is none.
fn load_about(config: &Config) -> Result<String> {
    match &config.about {
        None => Ok(DEFAULT_ABOUT.to_owned()),
        Some(path) => std::fs::read_to_string(path)
            .map(|source| about_from_markdown(&source))
            .map_err(|err| Error::About {
                path: path.clone(),
                err,
            }),
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for rendering and building. Loading the posts and stats
/// never fails here: those failures degrade the rendered output instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors templating or writing pages.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned when the about page source can't be read.
    #[error("reading about page `{}`: {err}", path.display())]
    About {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the output directory can't be expressed as a URL.
    #[error("output directory `{}` must be an absolute path", .0.display())]
    OutputPath(PathBuf),
}
