//! Builds the render payload of a single post route: the post behind the
//! slug, its rendered body, its table of contents, and the navigation topics.

use tracing::debug;

use crate::heading::Heading;
use crate::markdown::{self, serialize, RenderedDocument};
use crate::post::{Post, Topic};
use crate::repository::Snapshot;
use crate::resolve::resolve;
use crate::routes::RouteParam;
use crate::slug::Slug;

/// Everything a post page needs, borrowed from the build's [`Snapshot`].
#[derive(Debug)]
pub struct PostProps<'a> {
    pub post: &'a Post,
    pub document: RenderedDocument,
    pub id: &'a Slug,
    pub headings: Vec<Heading>,
    pub topics: &'a [Topic],
}

impl<'a> PostProps<'a> {
    /// Resolves `route` against `snapshot` and renders the post. A route
    /// that resolves to nothing is an error rather than an empty page.
    pub fn load(snapshot: &'a Snapshot, route: &'a RouteParam) -> Result<PostProps<'a>> {
        let post = resolve(snapshot.posts(), route.id.as_str()).ok_or_else(|| Error::Unresolved {
            slug: route.id.clone(),
        })?;
        debug!(slug = %route.id, source = %post.source.display(), "resolved route");

        let document = serialize(&post.body, post).map_err(|err| Error::Serialize {
            slug: route.id.clone(),
            err,
        })?;

        Ok(PostProps {
            post,
            headings: document.headings().to_vec(),
            document,
            id: &route.id,
            topics: snapshot.topics(),
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failure to prepare a single route.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when an enumerated slug matches no post.
    #[error("route `{slug}` does not resolve to any post")]
    Unresolved { slug: Slug },

    /// Returned when the post body is malformed.
    #[error("rendering `{slug}`: {err}")]
    Serialize { slug: Slug, err: markdown::Error },
}

impl Error {
    pub fn slug(&self) -> &Slug {
        match self {
            Error::Unresolved { slug } | Error::Serialize { slug, .. } => slug,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::routes::test::post;
    use crate::routes::RouteTable;
    use crate::slug::derive_slug;

    #[test]
    fn test_load() -> Result<()> {
        let mut p = post("Hello World", true);
        p.tags = vec!["intro".to_owned()];
        p.body = "## Getting Started\n\nWelcome to {Title}.".to_owned();
        let snapshot = Snapshot::from_posts(vec![p]);
        let table = RouteTable::enumerate(&snapshot);

        let props = PostProps::load(&snapshot, &table.routes()[0])?;
        assert_eq!(props.post.title, "Hello World");
        assert_eq!(props.id, &derive_slug("Hello World"));
        assert_eq!(props.headings, props.document.headings());
        assert_eq!(props.headings[0].anchor, "getting-started");
        assert!(props.document.html().contains("Welcome to Hello World."));
        assert_eq!(props.topics.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_unresolved() {
        let snapshot = Snapshot::from_posts(vec![post("Hello World", true)]);
        let route = RouteParam {
            id: derive_slug("Something Else"),
        };
        let err = PostProps::load(&snapshot, &route).unwrap_err();
        assert!(matches!(err, Error::Unresolved { .. }));
        assert_eq!(err.slug(), "something-else");
        assert_eq!(err.to_string(), "route `something-else` does not resolve to any post");
    }

    #[test]
    fn test_load_malformed() {
        let mut p = post("Broken", true);
        p.body = "{Missing}".to_owned();
        let snapshot = Snapshot::from_posts(vec![p]);
        let table = RouteTable::enumerate(&snapshot);
        let err = PostProps::load(&snapshot, &table.routes()[0]).unwrap_err();
        assert!(matches!(err, Error::Serialize { .. }));
        assert_eq!(err.slug(), "broken");
    }
}
