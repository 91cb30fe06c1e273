//! Post storage. [`PostRepository`] is the seam between the generator and
//! wherever posts live; [`FsRepository`] reads them from a directory of
//! markdown files. A build reads the repository exactly once into a
//! [`Snapshot`] and every later stage borrows from that snapshot.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::post::{Error as ParseError, Post, Topic};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

/// A source of posts and topics.
pub trait PostRepository {
    /// Returns every post, published or not, in repository order.
    fn all_posts(&self) -> Result<Vec<Post>>;

    /// Returns the distinct topics used for navigation.
    fn all_topics(&self) -> Result<Vec<Topic>> {
        Ok(topics_of(&self.all_posts()?))
    }
}

/// Reads posts from markdown files under a directory.
pub struct FsRepository {
    root: PathBuf,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> FsRepository {
        FsRepository { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parse_file(&self, path: &Path) -> Result<Post> {
        let contents = fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        Post::parse(relative, &contents).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })
    }

    fn is_post_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
    }
}

impl PostRepository for FsRepository {
    /// Walks the root directory and parses every `.md`/`.mdx` file. Posts are
    /// ordered by `Id` (highest first); posts sharing an `Id` are ordered by
    /// source path so the order never depends on directory iteration.
    fn all_posts(&self) -> Result<Vec<Post>> {
        if !self.root.is_dir() {
            return Err(Error::MissingRoot(self.root.clone()));
        }

        let mut posts = Vec::new();
        for result in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = result?;
            if entry.file_type().is_file() && Self::is_post_file(entry.path()) {
                debug!(path = %entry.path().display(), "parsing post");
                posts.push(self.parse_file(entry.path())?);
            }
        }

        posts.sort_by(|a, b| (Reverse(a.id), &a.source).cmp(&(Reverse(b.id), &b.source)));
        Ok(posts)
    }
}

/// Collects the distinct tags of `posts` into [`Topic`]s ordered by page path.
/// Tags that share a page path (`Rust` and `rust`) become one topic, named
/// after the first of them in sort order.
pub fn topics_of(posts: &[Post]) -> Vec<Topic> {
    let mut topics: BTreeMap<String, Topic> = BTreeMap::new();
    for tag in posts.iter().flat_map(|p| p.tags.iter()).collect::<BTreeSet<_>>() {
        let topic = Topic::new(tag.as_str());
        topics.entry(topic.path_segment()).or_insert(topic);
    }
    topics.into_values().collect()
}

/// An immutable view of a repository taken once per build.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    posts: Vec<Post>,
    topics: Vec<Topic>,
}

impl Snapshot {
    /// Reads the posts from `repository` once and derives the topics from
    /// them. Any failure here is fatal for the whole build.
    pub fn capture<R: PostRepository + ?Sized>(repository: &R) -> Result<Snapshot> {
        let posts = repository.all_posts()?;
        let topics = topics_of(&posts);
        info!(posts = posts.len(), topics = topics.len(), "captured snapshot");
        Ok(Snapshot { posts, topics })
    }

    pub fn from_parts(posts: Vec<Post>, topics: Vec<Topic>) -> Snapshot {
        Snapshot { posts, topics }
    }

    /// Builds a snapshot whose topics are derived from the posts' tags.
    pub fn from_posts(posts: Vec<Post>) -> Snapshot {
        let topics = topics_of(&posts);
        Snapshot { posts, topics }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl PostRepository for Snapshot {
    fn all_posts(&self) -> Result<Vec<Post>> {
        Ok(self.posts.clone())
    }

    fn all_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.topics.clone())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to read posts from a repository.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the posts directory doesn't exist.
    #[error("posts directory `{}` does not exist", .0.display())]
    MissingRoot(PathBuf),

    /// Returned when a post file can't be read.
    #[error("reading post `{}`: {err}", .path.display())]
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a post file can't be parsed.
    #[error("parsing post `{}`: {err}", .path.display())]
    Parse { path: PathBuf, err: ParseError },

    /// Returned for directory traversal errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}
