//! Loads the project configuration from `rants.yaml` and the theme
//! description from `theme/theme.yaml`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::session::Endpoints;
use crate::stats::DEFAULT_TEAMS;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "rants.yaml";

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default = "default_posts")]
    posts: PathBuf,

    #[serde(default = "default_stats_directory")]
    stats_directory: PathBuf,

    #[serde(default = "default_teams")]
    teams: Vec<String>,

    #[serde(default)]
    tags: Option<Vec<String>>,

    #[serde(default)]
    about: Option<PathBuf>,
}

fn default_posts() -> PathBuf {
    PathBuf::from("data/posts.json")
}

fn default_stats_directory() -> PathBuf {
    PathBuf::from("stats")
}

fn default_teams() -> Vec<String> {
    DEFAULT_TEAMS.iter().map(|t| (*t).to_owned()).collect()
}

#[derive(Deserialize)]
struct Theme {
    template: Vec<PathBuf>,
}

/// The resolved configuration for a project.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site title, made available to the page template.
    pub title: String,

    /// The directory containing the project file.
    pub project_root: PathBuf,

    /// Where the session loads its documents from.
    pub endpoints: Endpoints,

    /// The tags offered for filtering. `None` means "whatever tags the posts
    /// use".
    pub tags: Option<Vec<String>>,

    /// The markdown source for the about page, if the project has one.
    pub about: Option<PathBuf>,

    /// The page template files, concatenated in order.
    pub template: Vec<PathBuf>,

    /// Where `build` writes the static snapshot.
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for [`PROJECT_FILE`] and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
                .with_context(|| format!("loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| anyhow!("can't get parent directory of `{}`", path.display()))?;
        let project_root = project_root
            .canonicalize()
            .with_context(|| format!("resolving `{}`", project_root.display()))?;

        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;

        let stats_directory = project_root.join(&project.stats_directory);
        let stats = project
            .teams
            .iter()
            .map(|team| Ok((team.clone(), file_url(&stats_directory.join(format!("{}.json", team)))?)))
            .collect::<Result<Vec<(String, Url)>>>()?;

        Ok(Config {
            title: project.title,
            endpoints: Endpoints {
                posts: file_url(&project_root.join(&project.posts))?,
                stats,
            },
            tags: project.tags,
            about: project.about.map(|about| project_root.join(about)),
            template: theme
                .template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            output_directory: project_root.join(output_directory),
            project_root,
        })
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).with_context(|| format!("opening {} file `{}`", kind, path.display()))
}

fn file_url(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|()| anyhow!("`{}` is not an absolute path", path.display()))
}
