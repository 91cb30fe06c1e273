//! Loads a [`Config`] from a `quire.yaml` project file and the theme
//! description next to it.
//!
//! A project is laid out like this:
//!
//! ```text
//! quire.yaml
//! posts/          markdown sources
//! public/         static assets, copied to the output root
//! theme/
//!   theme.yaml    lists the template files for each page kind
//!   *.html
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

pub const PROJECT_FILE: &str = "quire.yaml";

const DEFAULT_SHARE_INTENT: &str = "https://twitter.com/intent/tweet";

/// What to do when two post titles derive the same slug.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateSlugs {
    /// Fail the build, naming the colliding titles.
    #[default]
    Reject,

    /// Keep the first post in repository order and warn about the rest.
    First,
}

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    site_root: Url,

    asset_host: Url,

    #[serde(default)]
    preview_image: String,

    #[serde(default)]
    author: String,

    share_intent: Option<Url>,

    likes_endpoint: Option<Url>,

    comments_endpoint: Option<Url>,

    #[serde(default)]
    duplicate_slugs: DuplicateSlugs,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    post_template: Vec<PathBuf>,
    not_found_template: Vec<PathBuf>,
}

/// Presentation settings shared by every page.
#[derive(Clone, Debug)]
pub struct Site {
    pub title: String,
    pub description: String,

    /// The public root of the site; post pages live under `{site_root}blogs/`.
    pub site_root: Url,

    /// The URL that public asset paths (header images, the preview image) are
    /// appended to.
    pub asset_host: Url,

    /// Asset path of the home page's social-preview image.
    pub preview_image: String,

    /// The handle credited in share text and the footer.
    pub author: String,

    pub share_intent: Url,
    pub likes_endpoint: Option<Url>,
    pub comments_endpoint: Option<Url>,
}

pub struct Config {
    pub site: Site,
    pub posts_source_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub index_template: Vec<PathBuf>,
    pub post_template: Vec<PathBuf>,
    pub not_found_template: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub duplicate_slugs: DuplicateSlugs,
}

impl Config {
    /// Searches `dir` and its ancestors for [`PROJECT_FILE`] and loads the
    /// first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path)?).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParent(path.to_owned()))?;

        let theme_dir = project_root.join("theme");
        let theme_path = theme_dir.join("theme.yaml");
        let theme: Theme = serde_yaml::from_reader(open(&theme_path)?).map_err(|err| Error::Yaml {
            path: theme_path.clone(),
            err,
        })?;
        let in_theme = |files: Vec<PathBuf>| -> Vec<PathBuf> {
            files.iter().map(|relpath| theme_dir.join(relpath)).collect()
        };

        Ok(Config {
            site: Site {
                title: project.title,
                description: project.description,
                site_root: project.site_root,
                asset_host: project.asset_host,
                preview_image: project.preview_image,
                author: project.author,
                share_intent: match project.share_intent {
                    Some(url) => url,
                    None => Url::parse(DEFAULT_SHARE_INTENT)?,
                },
                likes_endpoint: project.likes_endpoint,
                comments_endpoint: project.comments_endpoint,
            },
            posts_source_directory: project_root.join("posts"),
            static_source_directory: project_root.join("public"),
            index_template: in_theme(theme.index_template),
            post_template: in_theme(theme.post_template),
            not_found_template: in_theme(theme.not_found_template),
            output_directory: output_directory.to_owned(),
            duplicate_slugs: project.duplicate_slugs,
        })
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no project file exists in the directory or its
    /// ancestors.
    #[error("could not find `quire.yaml` in `{}` or any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("opening `{}`: {err}", .path.display())]
    Open { path: PathBuf, err: std::io::Error },

    #[error("loading `{}`: {err}", .path.display())]
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    #[error("can't get parent directory for project file `{}`", .0.display())]
    NoParent(PathBuf),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}
