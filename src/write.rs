//! Fills the page template (the "shell") with a session's rendered regions and
//! writes the result out.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template, Value};
use thiserror::Error;

use crate::session::Session;
use crate::state::TagFilter;
use crate::stats::REGION_SUFFIX;

/// The parsed page template.
pub struct Shell {
    template: Template,

    /// The site title.
    title: String,

    /// The tags offered for filtering; `None` means "whatever tags the loaded
    /// posts use".
    tags: Option<Vec<String>>,
}

impl Shell {
    /// Parses template source text.
    pub fn parse(source: &str, title: &str, tags: Option<Vec<String>>) -> Result<Shell> {
        let mut template = Template::default();
        template
            .parse(source)
            .map_err(|err| Error::ParseTemplate(err.to_string()))?;
        Ok(Shell {
            template,
            title: title.to_owned(),
            tags,
        })
    }

    /// Loads the template files, concatenates them in order, and parses the
    /// result.
    pub fn from_files<P: AsRef<Path>>(
        files: impl Iterator<Item = P>,
        title: &str,
        tags: Option<Vec<String>>,
    ) -> Result<Shell> {
        let mut contents = String::new();
        for file in files {
            let file = file.as_ref();
            File::open(file)
                .map_err(|err| Error::OpenTemplateFile {
                    path: file.to_owned(),
                    err,
                })?
                .read_to_string(&mut contents)?;
            contents.push(' ');
        }
        Shell::parse(&contents, title, tags)
    }

    /// Renders the whole page for the session's current document. The
    /// template sees:
    ///
    /// * `title`: the site title
    /// * `content`: the main region
    /// * `stats`: team → widget HTML, or nil while a widget is unpopulated
    /// * `tags`: a list of `{name, url, active}`; `url` is empty for fragment
    ///   links
    pub fn render(&self, session: &Session) -> Result<String> {
        let document = session.document();

        let stats: HashMap<String, Value> = document
            .widgets
            .iter()
            .map(|(region, html)| {
                let team = region.strip_suffix(REGION_SUFFIX).unwrap_or(region).to_owned();
                let value = match html {
                    Some(html) => Value::String(html.clone()),
                    None => Value::Nil,
                };
                (team, value)
            })
            .collect();

        let known: Vec<String> = match &self.tags {
            Some(tags) => tags.clone(),
            None => session
                .state()
                .known_tags()
                .into_iter()
                .map(str::to_owned)
                .collect(),
        };
        let active = session.state().filter();
        let tags: Vec<Value> = known
            .into_iter()
            .map(|name| {
                let mut m: HashMap<String, Value> = HashMap::new();
                m.insert(
                    "url".to_owned(),
                    Value::String(session.linker().tag_href(&name).unwrap_or_default()),
                );
                m.insert(
                    "active".to_owned(),
                    Value::Bool(*active == TagFilter::Tag(name.clone())),
                );
                m.insert("name".to_owned(), Value::String(name));
                Value::Object(m)
            })
            .collect();

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("content".to_owned(), Value::String(document.content.clone()));
        m.insert("stats".to_owned(), Value::Object(stats));
        m.insert("tags".to_owned(), Value::Array(tags));

        let context =
            Context::from(Value::Object(m)).map_err(|err| Error::Template(err.to_string()))?;
        self.template
            .render(&context)
            .map_err(|err| Error::Template(err.to_string()))
    }

    /// Renders the page and writes it to `path`, creating parent directories
    /// as needed.
    pub fn write(&self, session: &Session, path: &Path) -> Result<()> {
        let html = self.render(session)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, html)?;
        Ok(())
    }
}

/// The result of a fallible templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error templating or writing a page.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned for errors parsing template files.
    #[error("parsing template: {0}")]
    ParseTemplate(String),

    /// Returned for errors executing the template.
    #[error("rendering template: {0}")]
    Template(String),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}
