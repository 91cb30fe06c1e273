//! The static route table: one `/blogs/{slug}` route per post, computed once
//! per build from a [`Snapshot`]. Any slug outside the table is a 404; there
//! is no dynamic fallback.

use std::collections::BTreeMap;
use std::fmt;

use crate::repository::Snapshot;
use crate::slug::{derive_slug, Slug};

/// The URL path prefix under which post pages live.
pub const POSTS_PREFIX: &str = "blogs";

/// The parameters of a single post route.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteParam {
    pub id: Slug,
}

impl RouteParam {
    /// The site-relative path of the route, e.g. `blogs/hello-world`.
    pub fn path(&self) -> String {
        format!("{}/{}", POSTS_PREFIX, self.id)
    }
}

/// Two or more posts whose titles derive the same slug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Duplicate {
    pub slug: Slug,

    /// The colliding titles in repository order. The first one wins
    /// resolution.
    pub titles: Vec<String>,
}

impl fmt::Display for Duplicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}` is derived from ", self.slug)?;
        for (i, title) in self.titles.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", title)?;
        }
        Ok(())
    }
}

/// Every post route of a build, in repository order.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteParam>,
}

impl RouteTable {
    /// Maps every post in `snapshot` to its route. Unpublished posts are
    /// included, so the table always has one entry per post.
    pub fn enumerate(snapshot: &Snapshot) -> RouteTable {
        RouteTable {
            routes: snapshot
                .posts()
                .iter()
                .map(|post| RouteParam {
                    id: derive_slug(&post.title),
                })
                .collect(),
        }
    }

    pub fn routes(&self) -> &[RouteParam] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.routes.iter().any(|r| r.id == slug)
    }

    /// Finds slugs shared by more than one post. `snapshot` must be the one
    /// the table was enumerated from.
    pub fn duplicates(&self, snapshot: &Snapshot) -> Vec<Duplicate> {
        let mut groups: BTreeMap<&Slug, Vec<String>> = BTreeMap::new();
        for (route, post) in self.routes.iter().zip(snapshot.posts()) {
            groups.entry(&route.id).or_default().push(post.title.clone());
        }
        groups
            .into_iter()
            .filter(|(_, titles)| titles.len() > 1)
            .map(|(slug, titles)| Duplicate {
                slug: slug.clone(),
                titles,
            })
            .collect()
    }

    /// The routes with repeated slugs removed, keeping the first occurrence.
    pub fn unique(&self) -> impl Iterator<Item = &RouteParam> {
        let mut seen = std::collections::HashSet::new();
        self.routes.iter().filter(move |r| seen.insert(&r.id))
    }
}
