//! Defines the [`Post`], [`Topic`], and [`ReadTime`] types along with the
//! logic for parsing a post from its source text. See
//! [`crate::repository`] for how post files are discovered on disk.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::slug::{derive_slug, Slug};

/// Reading speed used for [`ReadTime`] estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// A blog post. Posts are parsed from markdown source files with a YAML
/// frontmatter header (see [`Post::parse`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The numeric identifier from the `Id` frontmatter field.
    pub id: u64,

    /// The title of the post. The post's route is derived from it.
    pub title: String,

    /// The short description shown in listings and page metadata. This is
    /// the `Abstract` frontmatter field.
    pub summary: String,

    /// The post's tags, split from the space-separated `Tags` field.
    pub tags: Vec<String>,

    /// The path of the header image relative to the public asset root, e.g.
    /// `/images/header.png`.
    pub header_image: String,

    /// Whether the post is listed on the home and topic pages.
    pub published: bool,

    /// The raw markdown body (everything after the closing frontmatter fence).
    pub body: String,

    /// Estimated reading time of [`Post::body`].
    pub read_time: ReadTime,

    /// The source file the post was parsed from.
    pub source: PathBuf,

    /// Frontmatter keys that aren't part of the fixed schema. Scalar values
    /// are available to `{Key}` expressions in the body.
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Post {
    /// Parses a post from `input`. The input must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with `Title` and optionally `Abstract`, `Tags`,
    ///    `HeaderImage`, `isPublished`, and `Id`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Abstract: A greeting.
    /// Tags: greet intro
    /// isPublished: true
    /// Id: 1
    /// ---
    /// ## Hello
    ///
    /// World
    /// ```
    pub fn parse(source: &Path, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find("\n---") {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                            // yaml_start
                    FENCE.len() + offset + 1,               // yaml_stop
                    FENCE.len() + offset + 1 + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
        let body = input[body_start..]
            .trim_start_matches(|c: char| c != '\n' && c.is_whitespace())
            .trim_start_matches(['\r', '\n'])
            .to_owned();

        Ok(Post {
            id: frontmatter.id,
            title: frontmatter.title,
            summary: frontmatter.summary,
            tags: frontmatter.tags,
            header_image: frontmatter.header_image,
            published: frontmatter.published,
            read_time: ReadTime::estimate(&body),
            body,
            source: source.to_owned(),
            extra: frontmatter.extra,
        })
    }

    /// The route identifier for this post.
    pub fn slug(&self) -> Slug {
        derive_slug(&self.title)
    }

    /// The tags joined back into the space-separated form used in
    /// frontmatter.
    pub fn tags_text(&self) -> String {
        self.tags.join(" ")
    }

    /// Whether any of the post's tags lands on `topic`'s page. Tags are
    /// compared by page path, so `Rust` matches the `rust` topic.
    pub fn has_tag(&self, topic: &Topic) -> bool {
        let segment = topic.path_segment();
        self.tags.iter().any(|t| slug::slugify(t) == segment)
    }
}

/// A named tag used to filter posts in the navigation chrome.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    pub name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Topic {
        Topic { name: name.into() }
    }

    /// The URL-safe form of the topic name, used as the topic page's
    /// directory. Unlike post slugs this normalizes punctuation, so
    /// `C++` becomes `c`.
    pub fn path_segment(&self) -> String {
        slug::slugify(&self.name)
    }
}

/// An estimate of how long a post takes to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadTime {
    pub words: usize,
    pub minutes: usize,
}

impl ReadTime {
    pub fn estimate(text: &str) -> ReadTime {
        let words = text.split_whitespace().count();
        ReadTime {
            words,
            minutes: (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for ReadTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} min read", self.minutes)
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(rename = "Title")]
    title: String,

    #[serde(default, rename = "Abstract")]
    summary: String,

    #[serde(default, rename = "Tags", deserialize_with = "deserialize_tags")]
    tags: Vec<String>,

    #[serde(default, rename = "HeaderImage")]
    header_image: String,

    #[serde(default, rename = "isPublished")]
    published: bool,

    #[serde(default, rename = "Id")]
    id: u64,

    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

/// Accepts `Tags` either as a space-separated string (`tech go`) or as a
/// YAML sequence (`[tech, go]`).
fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Tags::Joined(s)) => s.split_whitespace().map(str::to_owned).collect(),
        Some(Tags::List(v)) => v
            .iter()
            .flat_map(|t| t.split_whitespace())
            .map(str::to_owned)
            .collect(),
    })
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    #[error("post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when the starting fence was found but the closing one was
    /// missing.
    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIMPLE: &str = "---
Title: Getting Started With Rust
Abstract: A first look.
Tags: rust beginners
HeaderImage: /images/rust.png
isPublished: true
Id: 7
Series: Basics
---
## Install

Use rustup.
";

    #[test]
    fn test_parse_post() -> Result<()> {
        let post = Post::parse(Path::new("posts/rust.md"), SIMPLE)?;
        assert_eq!(post.id, 7);
        assert_eq!(post.title, "Getting Started With Rust");
        assert_eq!(post.summary, "A first look.");
        assert_eq!(post.tags, vec!["rust".to_owned(), "beginners".to_owned()]);
        assert_eq!(post.header_image, "/images/rust.png");
        assert!(post.published);
        assert_eq!(post.body, "## Install\n\nUse rustup.\n");
        assert_eq!(post.source, PathBuf::from("posts/rust.md"));
        assert_eq!(
            post.extra.get("Series"),
            Some(&serde_yaml::Value::String("Basics".to_owned()))
        );
        assert_eq!(post.slug(), "getting-started-with-rust");
        Ok(())
    }

    #[test]
    fn test_parse_defaults() -> Result<()> {
        let post = Post::parse(Path::new("a.md"), "---\nTitle: Draft\n---\nbody")?;
        assert!(!post.published);
        assert_eq!(post.id, 0);
        assert!(post.tags.is_empty());
        assert_eq!(post.summary, "");
        assert_eq!(post.body, "body");
        Ok(())
    }

    #[test]
    fn test_parse_tag_list() -> Result<()> {
        let post = Post::parse(Path::new("a.md"), "---\nTitle: T\nTags: [tech, go]\n---\n")?;
        assert_eq!(post.tags_text(), "tech go");
        Ok(())
    }

    #[test]
    fn test_parse_body_may_contain_rules() -> Result<()> {
        let post = Post::parse(Path::new("a.md"), "---\nTitle: T\n---\nabove\n\n---\n\nbelow")?;
        assert_eq!(post.body, "above\n\n---\n\nbelow");
        Ok(())
    }

    #[test]
    fn test_missing_start_fence() {
        let err = Post::parse(Path::new("a.md"), "Title: T\n---\n").unwrap_err();
        assert!(matches!(err, Error::FrontmatterMissingStartFence));
    }

    #[test]
    fn test_missing_end_fence() {
        let err = Post::parse(Path::new("a.md"), "---\nTitle: T\n").unwrap_err();
        assert!(matches!(err, Error::FrontmatterMissingEndFence));
    }

    #[test]
    fn test_missing_title() {
        let err = Post::parse(Path::new("a.md"), "---\nId: 1\n---\n").unwrap_err();
        assert!(matches!(err, Error::DeserializeYaml(_)));
    }

    #[test]
    fn test_read_time() {
        assert_eq!(ReadTime::estimate("").to_string(), "0 min read");
        assert_eq!(ReadTime::estimate("one two three").to_string(), "1 min read");
        let long = "word ".repeat(401);
        assert_eq!(ReadTime::estimate(&long).minutes, 3);
    }

    #[test]
    fn test_topic_path_segment() {
        assert_eq!(Topic::new("Web Dev").path_segment(), "web-dev");
    }
}
