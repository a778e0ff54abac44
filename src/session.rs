//! Defines the [`Session`]: one page session's worth of state, the current
//! route and the rendered [`Document`].
//!
//! Starting a session kicks off one background load for the posts document
//! and one per stats widget. Each load reports exactly one [`Event`] over a
//! channel; events are applied on the caller's thread by [`Session::poll`] or
//! [`Session::settle`]. The loads don't wait on each other or on the initial
//! render, so the first render always happens before any data arrives.
//!
//! Every change that affects the main region (data arriving, navigation, tag
//! or search changes) goes through the same re-render path. Stats widgets are
//! updated in place and never trigger a re-render.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::post::{parse_posts, Post};
use crate::route::{Linker, Route};
use crate::source::{cache_busted, FetchError, Source};
use crate::state::{AppState, TagFilter};
use crate::stats::{region_id, Stats};
use crate::view::{self, ViewContext};

/// Where a session loads its documents from.
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// The posts document.
    pub posts: Url,

    /// One stats document per team identifier, in display order.
    pub stats: Vec<(String, Url)>,
}

/// The rendered regions of the page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// The main region, fully replaced on every render.
    pub content: String,

    /// Stats regions keyed by region id (see [`region_id`]). `None` means the
    /// region still holds its default contents.
    pub widgets: BTreeMap<String, Option<String>>,

    /// How many times the main region has been rendered.
    pub renders: usize,
}

/// The outcome of one background load.
#[derive(Debug)]
pub enum Event {
    Posts(Result<Vec<Post>, LoadError>),
    Stats {
        team: String,
        stats: Result<Stats, LoadError>,
    },
}

/// Represents a failure to load a document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("fetching `{url}`: {err}")]
    Fetch {
        url: Url,
        #[source]
        err: FetchError,
    },

    #[error("parsing `{url}`: {err}")]
    Parse {
        url: Url,
        #[source]
        err: serde_json::Error,
    },
}

pub struct Session {
    state: AppState,
    route: Route,
    linker: Linker,
    about: String,
    document: Document,
    events: Receiver<Event>,
    pending: usize,
}

impl Session {
    /// Starts the background loads and renders the route named by
    /// `fragment` against the (still empty) state.
    pub fn start(
        source: Arc<dyn Source>,
        endpoints: &Endpoints,
        linker: Linker,
        about: String,
        fragment: &str,
    ) -> Session {
        let (tx, rx) = unbounded();

        spawn_load(&source, &tx, endpoints.posts.clone(), |url, text| {
            Event::Posts(text.and_then(|text| {
                parse_posts(&text).map_err(|err| LoadError::Parse { url, err })
            }))
        });
        for (team, url) in &endpoints.stats {
            let team = team.clone();
            spawn_load(&source, &tx, url.clone(), move |url, text| Event::Stats {
                team,
                stats: text.and_then(|text| {
                    Stats::parse(&text).map_err(|err| LoadError::Parse { url, err })
                }),
            });
        }

        let mut session = Session {
            state: AppState::new(),
            route: Route::parse(fragment),
            linker,
            about,
            document: Document {
                widgets: endpoints
                    .stats
                    .iter()
                    .map(|(team, _)| (region_id(team), None))
                    .collect(),
                ..Document::default()
            },
            events: rx,
            pending: 1 + endpoints.stats.len(),
        };
        session.render();
        session
    }

    /// Applies every event that has already arrived without blocking. Returns
    /// `true` once every load has reported.
    pub fn poll(&mut self) -> bool {
        while self.pending > 0 {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => self.pending = 0,
            }
        }
        true
    }

    /// Blocks until every load has reported, applying events as they arrive.
    pub fn settle(&mut self) {
        while self.pending > 0 {
            match self.events.recv() {
                Ok(event) => self.apply(event),
                // A loader died without reporting.
                Err(_) => self.pending = 0,
            }
        }
    }

    /// Handles a navigation: parses `fragment` and re-renders.
    pub fn navigate(&mut self, fragment: &str) {
        self.route = Route::parse(fragment);
        self.render();
    }

    /// Handles a tag selection. The route is unchanged but re-rendered.
    pub fn select_tag(&mut self, filter: TagFilter) {
        self.state.set_filter(filter);
        self.render();
    }

    /// Handles a change to the search text. The route is unchanged but
    /// re-rendered.
    pub fn set_search(&mut self, search: &str) {
        self.state.set_search(search);
        self.render();
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn apply(&mut self, event: Event) {
        self.pending = self.pending.saturating_sub(1);
        match event {
            Event::Posts(Ok(posts)) => {
                debug!(count = posts.len(), "posts loaded");
                self.state.load(posts);
                self.render();
            }
            Event::Posts(Err(err)) => {
                error!(error = %err, "loading posts");
            }
            Event::Stats {
                team,
                stats: Ok(stats),
            } => {
                self.document
                    .widgets
                    .insert(region_id(&team), Some(stats.render()));
            }
            // Widgets keep their default contents.
            Event::Stats { stats: Err(_), .. } => {}
        }
    }

    fn render(&mut self) {
        let ctx = ViewContext {
            state: &self.state,
            linker: &self.linker,
            about: &self.about,
        };
        self.document.content = view::render(&self.route, &ctx);
        self.document.renders += 1;
        debug!(route = ?self.route, renders = self.document.renders, "rendered");
    }
}

/// Fetches `url` (cache-busted) on a new thread and sends the event built by
/// `to_event` from the outcome.
fn spawn_load<F>(source: &Arc<dyn Source>, tx: &Sender<Event>, url: Url, to_event: F)
where
    F: FnOnce(Url, Result<String, LoadError>) -> Event + Send + 'static,
{
    let source = Arc::clone(source);
    let tx = tx.clone();
    thread::spawn(move || {
        let text = source.fetch(&cache_busted(&url)).map_err(|err| LoadError::Fetch {
            url: url.clone(),
            err,
        });
        // The session may already be gone; nobody is left to tell.
        let _ = tx.send(to_event(url, text));
    });
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::FileSource;
    use crate::view::{EMPTY_MESSAGE, NOT_FOUND_MESSAGE};
    use std::path::Path;
    use std::sync::Mutex;

    const POSTS: &str = r#"[
        {"slug": "older", "title": "Older", "body": "old", "date": "2024-01-01", "tags": ["Wizards"]},
        {"slug": "newer", "title": "Newer", "body": "new **news**", "date": "2024-03-01", "tags": ["Dolphins"]}
    ]"#;

    const STATS: &str = r#"{"opponent": "Jets", "team_score": 30, "opp_score": 3,
        "key_stat": "5 TDs", "notes": "Rout."}"#;

    fn endpoints(root: &Path) -> Result<Endpoints, Box<dyn std::error::Error>> {
        let url = |rel: &str| Url::from_file_path(root.join(rel)).map_err(|()| "bad path");
        Ok(Endpoints {
            posts: url("data/posts.json")?,
            stats: vec![
                ("dolphins".to_owned(), url("stats/dolphins.json")?),
                ("wizards".to_owned(), url("stats/wizards.json")?),
            ],
        })
    }

    fn site(posts: Option<&str>, dolphins: Option<&str>) -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("data"))?;
        std::fs::create_dir_all(dir.path().join("stats"))?;
        if let Some(posts) = posts {
            std::fs::write(dir.path().join("data/posts.json"), posts)?;
        }
        if let Some(dolphins) = dolphins {
            std::fs::write(dir.path().join("stats/dolphins.json"), dolphins)?;
        }
        Ok(dir)
    }

    fn start(root: &Path, fragment: &str) -> Result<Session, Box<dyn std::error::Error>> {
        Ok(Session::start(
            Arc::new(FileSource),
            &endpoints(root)?,
            Linker::Fragment,
            String::new(),
            fragment,
        ))
    }

    #[test]
    fn test_initial_render_precedes_data() -> Result<(), Box<dyn std::error::Error>> {
        let dir = site(Some(POSTS), Some(STATS))?;
        let session = start(dir.path(), "#/")?;
        assert_eq!(1, session.document().renders);
        assert!(session.document().content.contains(EMPTY_MESSAGE));
        Ok(())
    }

    #[test]
    fn test_settle_renders_once_after_posts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = site(Some(POSTS), Some(STATS))?;
        let mut session = start(dir.path(), "#/")?;
        session.settle();
        let doc = session.document();
        assert_eq!(2, doc.renders);
        assert!(doc.content.find("Newer") < doc.content.find("Older"));
        assert!(doc.widgets["dolphins-stats"]
            .as_deref()
            .is_some_and(|html| html.contains("30–3")));
        assert_eq!(None, doc.widgets["wizards-stats"]);
        assert!(session.poll());
        Ok(())
    }

    #[test]
    fn test_failed_posts_load_looks_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = site(None, Some("{ not json"))?;
        let mut session = start(dir.path(), "#/bogus")?;
        session.settle();
        let doc = session.document();
        assert_eq!(1, doc.renders);
        assert!(doc.content.contains(EMPTY_MESSAGE));
        assert_eq!(None, doc.widgets["dolphins-stats"]);
        Ok(())
    }

    #[test]
    fn test_malformed_posts_document() -> Result<(), Box<dyn std::error::Error>> {
        let dir = site(Some(r#"{"posts": []}"#), None)?;
        let mut session = start(dir.path(), "#/")?;
        session.settle();
        assert!(session.state().posts().is_empty());
        assert!(session.document().content.contains(EMPTY_MESSAGE));
        Ok(())
    }

    #[test]
    fn test_bad_record_keeps_the_rest() -> Result<(), Box<dyn std::error::Error>> {
        let dir = site(
            Some(
                r#"[
                    {"slug": "good", "title": "Good One", "body": "ok", "date": "2024-01-02"},
                    {"slug": "untitled", "body": "no title", "date": "2024-01-01"}
                ]"#,
            ),
            None,
        )?;
        let mut session = start(dir.path(), "#/")?;
        session.settle();
        assert_eq!(2, session.state().posts().len());
        assert_eq!(2, session.document().renders);
        assert!(session.document().content.contains("Good One"));
        assert!(!session.document().content.contains(EMPTY_MESSAGE));
        Ok(())
    }

    #[test]
    fn test_interactions_rerender()-> Result<(), Box<dyn std::error::Error>> {
        let dir = site(Some(POSTS), None)?;
        let mut session = start(dir.path(), "#/")?;
        session.settle();

        session.select_tag(TagFilter::from("Wizards"));
        assert!(session.document().content.contains("Older"));
        assert!(!session.document().content.contains("Newer"));

        session.set_search("zzz");
        assert!(session.document().content.contains(EMPTY_MESSAGE));

        session.navigate("#/post/newer");
        assert_eq!(&Route::Post("newer".to_owned()), session.route());
        assert!(session.document().content.contains("<strong>news</strong>"));

        session.navigate("#/post/does-not-exist");
        assert!(session.document().content.contains(NOT_FOUND_MESSAGE));
        assert_eq!(6, session.document().renders);
        Ok(())
    }

    /// Records every URL it's asked for and fails every request.
    struct Recording(Mutex<Vec<Url>>);

    impl Source for Recording {
        fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(url.clone());
            }
            Err(FetchError::UnsupportedScheme(url.scheme().to_owned()))
        }
    }

    #[test]
    fn test_requests_are_cache_busted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = Arc::new(Recording(Mutex::new(Vec::new())));
        let mut session = Session::start(
            source.clone(),
            &endpoints(dir.path())?,
            Linker::Fragment,
            String::new(),
            "#/",
        );
        session.settle();
        let seen = source.0.lock().map_err(|_| "poisoned")?;
        assert_eq!(3, seen.len());
        assert!(seen
            .iter()
            .all(|url| url.query_pairs().any(|(k, _)| k == crate::source::CACHE_BUST_PARAM)));
        Ok(())
    }
}
