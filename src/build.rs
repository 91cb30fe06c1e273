//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: capturing a [`Snapshot`] of the
//! posts ([`crate::repository`]), enumerating the routes
//! ([`crate::routes`]), composing and rendering every page
//! ([`crate::page`], [`crate::write`]), and copying the static source directory
//! into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, DuplicateSlugs};
use crate::page::{Chrome, HomePage, NotFoundPage, PostPage, TopicPage, TOPICS_PREFIX};
use crate::props::{self, PostProps};
use crate::repository::{self, FsRepository, Snapshot};
use crate::routes::{Duplicate, RouteParam, RouteTable, POSTS_PREFIX};
use crate::write::{self, parse_template, Writer};

/// Counts of what a successful build wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub posts: usize,
    pub topics: usize,
    pub assets: usize,
}

/// Captures the posts under the configured source directory and enumerates
/// their routes. Duplicate slugs are left in the table.
pub fn load(config: &Config) -> Result<(Snapshot, RouteTable)> {
    let snapshot = Snapshot::capture(&FsRepository::new(&config.posts_source_directory))?;
    let table = RouteTable::enumerate(&snapshot);
    Ok((snapshot, table))
}

/// Builds the site from a [`Config`] object. A failure to load the posts or
/// the templates stops the build immediately. A post or topic page that fails
/// to render is logged and skipped; the remaining pages are still written and
/// the build then returns [`Error::Routes`].
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    let (snapshot, table) = load(config)?;

    let duplicates = table.duplicates(&snapshot);
    if !duplicates.is_empty() {
        match config.duplicate_slugs {
            DuplicateSlugs::Reject => return Err(Error::DuplicateSlugs(duplicates)),
            DuplicateSlugs::First => {
                for duplicate in &duplicates {
                    warn!(%duplicate, "keeping the first post for a shared slug");
                }
            }
        }
    }

    let index_template = parse_template(config.index_template.iter())?;
    let post_template = parse_template(config.post_template.iter())?;
    let not_found_template = parse_template(config.not_found_template.iter())?;

    // Only the directories we generate are cleaned. The output root may hold
    // files we didn't write.
    rmdir(&config.output_directory.join(POSTS_PREFIX))?;
    rmdir(&config.output_directory.join(TOPICS_PREFIX))?;
    fs::create_dir_all(&config.output_directory)?;

    let writer = Writer {
        post_template: &post_template,
        index_template: &index_template,
        not_found_template: &not_found_template,
        output_directory: &config.output_directory,
    };
    let site = &config.site;
    let year = chrono::Local::now().year();
    let chrome = Chrome::new(site, snapshot.topics(), year);

    writer.write_home(&HomePage::compose(chrome, snapshot.posts()))?;

    let mut summary = BuildSummary::default();
    let mut failures = Vec::new();
    let mut record = |page: String, result: PageResult| match result {
        Ok(path) => {
            debug!(%page, path = %path.display(), "wrote page");
            true
        }
        Err(err) => {
            error!(%page, %err, "failed to render page");
            failures.push(RouteFailure { page, err });
            false
        }
    };

    for topic in snapshot.topics() {
        let page = format!("{}/{}", TOPICS_PREFIX, topic.path_segment());
        let result = writer
            .write_topic(&TopicPage::compose(chrome, topic, snapshot.posts()))
            .map_err(RouteError::from);
        if record(page, result) {
            summary.topics += 1;
        }
    }
    for route in table.unique() {
        if record(route.path(), write_route(&writer, &snapshot, route, site, year)) {
            summary.posts += 1;
        }
    }

    summary.assets = copy_dir(&config.static_source_directory, &config.output_directory)?;
    writer.write_not_found(&NotFoundPage { chrome })?;

    if !failures.is_empty() {
        return Err(Error::Routes {
            total: snapshot.topics().len() + table.unique().count(),
            failed: failures,
        });
    }

    info!(
        posts = summary.posts,
        topics = summary.topics,
        assets = summary.assets,
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(summary)
}

fn write_route(
    writer: &Writer,
    snapshot: &Snapshot,
    route: &RouteParam,
    site: &crate::config::Site,
    year: i32,
) -> PageResult {
    let props = PostProps::load(snapshot, route)?;
    Ok(writer.write_post(&PostPage::compose(site, year, props))?)
}

/// Copies the contents of `src` into `dst`, returning the number of files
/// copied. A missing `src` copies nothing.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        debug!(path = %src.display(), "no static directory");
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                path: entry.path().to_owned(),
                err,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn rmdir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// Why a single post or topic page was not written.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Props(#[from] props::Error),

    #[error(transparent)]
    Write(#[from] write::Error),
}

type PageResult = std::result::Result<PathBuf, RouteError>;

/// A page that failed to render.
#[derive(Debug)]
pub struct RouteFailure {
    /// The site-relative path of the page, e.g. `blogs/hello-world`.
    pub page: String,
    pub err: RouteError,
}

fn describe_duplicates(duplicates: &[Duplicate]) -> String {
    duplicates
        .iter()
        .map(Duplicate::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_failures(failures: &[RouteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.page, f.err))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the posts can't be loaded. No pages are written.
    #[error("loading posts: {0}")]
    Repository(#[from] repository::Error),

    /// Returned when titles collide and the project rejects duplicates.
    #[error("duplicate slugs: {}", describe_duplicates(.0))]
    DuplicateSlugs(Vec<Duplicate>),

    /// Returned for template and page-writing problems outside a single post
    /// route.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned when some post or topic pages failed; the rest of the site
    /// was written.
    #[error("{} of {} pages failed: {}", .failed.len(), .total, describe_failures(.failed))]
    Routes {
        total: usize,
        failed: Vec<RouteFailure>,
    },

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning directory `{}`: {err}", .path.display())]
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while copying static files.
    #[error("copying `{}`: {err}", .path.display())]
    Copy { path: PathBuf, err: std::io::Error },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
